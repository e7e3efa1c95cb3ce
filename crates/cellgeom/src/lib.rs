#![warn(missing_docs)]

//! cellgeom: constructive solid geometry for neutron-scattering instruments.
//!
//! Components are cells: boolean combinations of implicit surfaces
//! (planes, spheres, cylinders, cones, general quadrics). The engine
//! answers three questions about a cell: does it contain a point, where
//! does a ray enter and leave it, and what solid angle does it subtend.
//!
//! This crate ties the member crates together and loads whole geometries
//! from TOML or JSON:
//!
//! - [`cellgeom_math`]: vectors, transforms, tolerances, boxes, configuration
//! - [`cellgeom_surface`]: surface primitives and the shared surface table
//! - [`cellgeom_track`]: rays with their ordered entry/exit links
//! - [`cellgeom_csg`]: rule trees, the expression parser, cells
//!
//! # Example
//!
//! ```
//! use cellgeom::{Geometry, Point3, Track, Vec3};
//!
//! let geometry = Geometry::from_toml_str(r#"
//!     [[surfaces]]
//!     key = 1
//!     type = "sphere"
//!     centre = [0.0, 0.0, 0.0]
//!     radius = 1.0
//!
//!     [[cells]]
//!     id = 1
//!     expression = "-1"
//! "#).unwrap();
//!
//! assert_eq!(geometry.find_cell(&Point3::origin()), Some(1));
//!
//! let mut track = Track::new(Point3::new(-5.0, 0.0, 0.0), Vec3::x());
//! assert_eq!(geometry.trace(&mut track), 1);
//! assert!((track.total_distance_inside() - 2.0).abs() < 1e-9);
//! ```

mod description;
mod geometry;

pub use description::{CellDef, GeometryDescription};
pub use geometry::Geometry;

pub use cellgeom_csg::{
    self, BoundingBox, CsgError, CsgObject, MeshSource, ObjectTable, RuleTree, TriangleMesh,
};
pub use cellgeom_math::{
    self, Aabb3, ConfigError, GeometryConfig, Point3, SolidAngleConfig, Tolerance, Transform, Vec3,
};
pub use cellgeom_surface::{
    self, Cone, Cylinder, Plane, Quadric, Sphere, Surface, SurfaceDef, SurfaceError,
    SurfaceHandle, SurfaceKind, SurfaceShape, SurfaceTable,
};
pub use cellgeom_track::{self, IntersectionPoint, Link, ObjectId, Track, TrackDirection};

use thiserror::Error;

/// Errors raised while loading or querying a geometry.
#[derive(Debug, Error)]
pub enum GeometryError {
    /// The description file could not be read.
    #[error("failed to read geometry: {0}")]
    Io(std::io::Error),

    /// The TOML description is malformed.
    #[error("failed to parse TOML geometry: {0}")]
    Toml(#[from] toml::de::Error),

    /// The JSON description is malformed.
    #[error("failed to parse JSON geometry: {0}")]
    Json(#[from] serde_json::Error),

    /// The configuration section is out of range.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A surface is invalid or clashes with another.
    #[error(transparent)]
    Surface(#[from] SurfaceError),

    /// A cell expression or reference is invalid.
    #[error("cell {id}: {source}")]
    Cell {
        /// Id of the offending cell.
        id: ObjectId,
        /// Underlying error.
        source: CsgError,
    },

    /// Complement resolution failed.
    #[error(transparent)]
    Csg(#[from] CsgError),

    /// Two cells share an id.
    #[error("duplicate cell id {0}")]
    DuplicateCell(ObjectId),

    /// No cell with this id exists.
    #[error("cell {0} not found")]
    CellNotFound(ObjectId),
}

/// Result type for geometry operations.
pub type Result<T> = std::result::Result<T, GeometryError>;
