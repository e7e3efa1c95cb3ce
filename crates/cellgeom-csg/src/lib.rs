#![warn(missing_docs)]

//! Constructive solid geometry cells for the cellgeom engine.
//!
//! A cell ([`CsgObject`]) is a boolean rule over signed surface half-spaces,
//! written in the MCNP-style expression language:
//!
//! - `-3`: the negative side of surface 3
//! - `1 -2`: intersection (juxtaposition)
//! - `1 : 2`: union
//! - `#(1 -2)`: complement of a sub-expression
//! - `#7`: complement of cell 7, inlined by [`ObjectTable::resolve_complements`]
//!
//! Once populated from a [`cellgeom_surface::SurfaceTable`] a cell answers
//! point-membership, boundary, ray-intercept, bounding-box and solid-angle
//! queries. All queries take `&self` and are safe to run from many threads.
//!
//! # Example
//!
//! ```
//! use cellgeom_csg::CsgObject;
//! use cellgeom_math::{GeometryConfig, Point3, Vec3};
//! use cellgeom_surface::{Plane, Surface, SurfaceTable};
//! use cellgeom_track::Track;
//!
//! let mut surfaces = SurfaceTable::new();
//! surfaces.insert(Surface::new(1, Plane::px(0.0))).unwrap();
//! surfaces.insert(Surface::new(2, Plane::px(1.0))).unwrap();
//!
//! let mut slab = CsgObject::new(1, "1 -2", GeometryConfig::default()).unwrap();
//! slab.populate(&surfaces).unwrap();
//! assert!(slab.is_valid(&Point3::new(0.5, 3.0, -2.0)));
//!
//! let mut track = Track::new(Point3::new(-1.0, 0.0, 0.0), Vec3::x());
//! assert_eq!(slab.intercept_surface(&mut track), 1);
//! assert!((track.front().unwrap().distance_inside - 1.0).abs() < 1e-9);
//! ```

mod error;
mod mesh;
mod object;
mod parse;
mod rule;
pub mod solid_angle;
mod table;

pub use error::{CsgError, Result};
pub use mesh::{MeshSource, TriangleMesh};
pub use object::{BoundingBox, CsgObject};
pub use parse::{parse, tokenize, SpannedToken, Token};
pub use rule::{NodeId, RuleNode, RuleTree};
pub use table::ObjectTable;
