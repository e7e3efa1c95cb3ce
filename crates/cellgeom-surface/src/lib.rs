#![warn(missing_docs)]

//! Implicit surface primitives for the cellgeom engine.
//!
//! Every surface splits space into a positive and a negative side. The
//! CSG layer combines those half-spaces into cells, so a surface only has
//! to answer four questions:
//!
//! - [`Surface::side_of`]: which side of the surface is a point on
//! - [`Surface::distance_along`]: where does a line cross the surface
//! - [`Surface::normal_at`]: outward normal (toward the positive side)
//! - [`Surface::bound`]: how far does one side of the surface extend
//!
//! Surfaces are shared between cells through a [`SurfaceTable`].
//!
//! # Example
//!
//! ```
//! use cellgeom_math::{Point3, Tolerance, Vec3};
//! use cellgeom_surface::{Sphere, Surface};
//!
//! let sphere = Surface::new(1, Sphere::new(Point3::origin(), 2.0).unwrap());
//! let tol = Tolerance::DEFAULT;
//! assert_eq!(sphere.side_of(&Point3::origin(), &tol), -1);
//!
//! let roots = sphere.distance_along(&Point3::new(-5.0, 0.0, 0.0), &Vec3::x());
//! assert_eq!(roots.len(), 2);
//! ```

mod cone;
mod cylinder;
mod def;
mod plane;
mod quadric;
mod roots;
mod sphere;
mod table;

pub use cone::Cone;
pub use cylinder::Cylinder;
pub use def::{SurfaceDef, SurfaceShape};
pub use plane::Plane;
pub use quadric::Quadric;
pub use sphere::Sphere;
pub use table::{SurfaceHandle, SurfaceTable};

use cellgeom_math::{Aabb3, Point3, Tolerance, Transform, Vec3};
use thiserror::Error;

/// Errors from surface construction and lookup.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SurfaceError {
    /// A surface with this key is already in the table.
    #[error("duplicate surface key {0}")]
    DuplicateKey(i32),

    /// No surface with this key exists.
    #[error("surface {0} not found")]
    NotFound(i32),

    /// Surface keys must be positive; the sign of a reference selects the side.
    #[error("surface key must be positive, got {0}")]
    InvalidKey(i32),

    /// The primitive's defining values do not describe a surface.
    #[error("degenerate surface: {0}")]
    Degenerate(String),
}

/// Result type for surface operations.
pub type Result<T> = std::result::Result<T, SurfaceError>;

/// The kind of a surface, with its defining values.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceKind {
    /// Infinite plane.
    Plane(Plane),
    /// Sphere.
    Sphere(Sphere),
    /// Infinite circular cylinder.
    Cylinder(Cylinder),
    /// Double-nappe circular cone.
    Cone(Cone),
    /// General quadric.
    Quadric(Quadric),
}

impl From<Plane> for SurfaceKind {
    fn from(p: Plane) -> Self {
        SurfaceKind::Plane(p)
    }
}

impl From<Sphere> for SurfaceKind {
    fn from(s: Sphere) -> Self {
        SurfaceKind::Sphere(s)
    }
}

impl From<Cylinder> for SurfaceKind {
    fn from(c: Cylinder) -> Self {
        SurfaceKind::Cylinder(c)
    }
}

impl From<Cone> for SurfaceKind {
    fn from(c: Cone) -> Self {
        SurfaceKind::Cone(c)
    }
}

impl From<Quadric> for SurfaceKind {
    fn from(q: Quadric) -> Self {
        SurfaceKind::Quadric(q)
    }
}

/// A keyed surface.
///
/// The sign convention of each kind is fixed when the surface is built
/// and never changes afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    key: i32,
    kind: SurfaceKind,
}

impl Surface {
    /// Create a surface with the given key.
    pub fn new(key: i32, kind: impl Into<SurfaceKind>) -> Self {
        Self {
            key,
            kind: kind.into(),
        }
    }

    /// Numeric identity used by cell expressions.
    pub fn key(&self) -> i32 {
        self.key
    }

    /// The primitive and its defining values.
    pub fn kind(&self) -> &SurfaceKind {
        &self.kind
    }

    /// Same primitive under a different key.
    pub fn with_key(&self, key: i32) -> Self {
        Self {
            key,
            kind: self.kind.clone(),
        }
    }

    /// `+1` on the positive side, `-1` on the negative side, `0` within
    /// tolerance of the surface.
    pub fn side_of(&self, p: &Point3, tol: &Tolerance) -> i32 {
        match &self.kind {
            SurfaceKind::Plane(s) => s.side_of(p, tol),
            SurfaceKind::Sphere(s) => s.side_of(p, tol),
            SurfaceKind::Cylinder(s) => s.side_of(p, tol),
            SurfaceKind::Cone(s) => s.side_of(p, tol),
            SurfaceKind::Quadric(s) => s.side_of(p, tol),
        }
    }

    /// True if the point lies on the surface within tolerance.
    pub fn on_surface(&self, p: &Point3, tol: &Tolerance) -> bool {
        self.side_of(p, tol) == 0
    }

    /// Parameters `t` at which `origin + t * direction` crosses the surface,
    /// sorted ascending. Roots behind the origin are included.
    ///
    /// Degenerate configurations (parallel lines, grazing misses, a zero
    /// direction) give an empty list.
    pub fn distance_along(&self, origin: &Point3, direction: &Vec3) -> Vec<f64> {
        match &self.kind {
            SurfaceKind::Plane(s) => s.distance_along(origin, direction),
            SurfaceKind::Sphere(s) => s.distance_along(origin, direction),
            SurfaceKind::Cylinder(s) => s.distance_along(origin, direction),
            SurfaceKind::Cone(s) => s.distance_along(origin, direction),
            SurfaceKind::Quadric(s) => s.distance_along(origin, direction),
        }
    }

    /// Unit normal pointing toward the positive side.
    pub fn normal_at(&self, p: &Point3) -> Vec3 {
        match &self.kind {
            SurfaceKind::Plane(s) => s.normal_at(p),
            SurfaceKind::Sphere(s) => s.normal_at(p),
            SurfaceKind::Cylinder(s) => s.normal_at(p),
            SurfaceKind::Cone(s) => s.normal_at(p),
            SurfaceKind::Quadric(s) => s.normal_at(p),
        }
    }

    /// Tighten `aabb` to the half-space on side `sign` (`±1`).
    ///
    /// Kinds that cannot bound the requested side leave the box unchanged.
    pub fn bound(&self, sign: i32, aabb: &mut Aabb3, tol: &Tolerance) {
        match &self.kind {
            SurfaceKind::Plane(s) => s.bound(sign, aabb, tol),
            SurfaceKind::Sphere(s) => s.bound(sign, aabb),
            SurfaceKind::Cylinder(s) => s.bound(sign, aabb),
            SurfaceKind::Cone(_) | SurfaceKind::Quadric(_) => {}
        }
    }

    /// Equivalent general quadric, with the same sign convention.
    pub fn to_quadric(&self) -> Quadric {
        match &self.kind {
            SurfaceKind::Plane(s) => s.to_quadric(),
            SurfaceKind::Sphere(s) => s.to_quadric(),
            SurfaceKind::Cylinder(s) => s.to_quadric(),
            SurfaceKind::Cone(s) => s.to_quadric(),
            SurfaceKind::Quadric(s) => s.clone(),
        }
    }

    /// The surface moved by a rigid transform, keeping its key.
    pub fn transformed(&self, t: &Transform) -> Result<Self> {
        let kind = match &self.kind {
            SurfaceKind::Plane(s) => SurfaceKind::Plane(s.transformed(t)?),
            SurfaceKind::Sphere(s) => SurfaceKind::Sphere(s.transformed(t)),
            SurfaceKind::Cylinder(s) => SurfaceKind::Cylinder(s.transformed(t)?),
            SurfaceKind::Cone(s) => SurfaceKind::Cone(s.transformed(t)?),
            SurfaceKind::Quadric(s) => SurfaceKind::Quadric(s.transformed(t)),
        };
        Ok(Self {
            key: self.key,
            kind,
        })
    }
}
