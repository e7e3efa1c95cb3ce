#![warn(missing_docs)]

//! Math types for the cellgeom engine.
//!
//! Thin wrappers around nalgebra providing the types shared by every
//! cellgeom crate: points, vectors, directions, rigid transforms, the
//! geometric tolerance, axis-aligned boxes and the engine configuration.

mod bbox;
mod config;

pub use bbox::Aabb3;
pub use config::{ConfigError, GeometryConfig, SolidAngleConfig};

use nalgebra::{Isometry3, Matrix4, Translation3, Unit, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A unit (normalized) direction vector in 3D space.
pub type Dir3 = Unit<Vector3<f64>>;

/// A rigid motion: rotation followed by translation.
///
/// Surfaces are only ever moved rigidly, so the inverse always exists and
/// normals turn with the rotation alone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    iso: Isometry3<f64>,
}

impl Transform {
    /// No motion.
    pub fn identity() -> Self {
        Self {
            iso: Isometry3::identity(),
        }
    }

    /// Shift by `(dx, dy, dz)`.
    pub fn translation(dx: f64, dy: f64, dz: f64) -> Self {
        Self {
            iso: Isometry3::from_parts(Translation3::new(dx, dy, dz), UnitQuaternion::identity()),
        }
    }

    /// Turn by `angle` radians about `axis` through the origin.
    pub fn rotation(axis: &Dir3, angle: f64) -> Self {
        Self {
            iso: Isometry3::from_parts(
                Translation3::identity(),
                UnitQuaternion::from_axis_angle(axis, angle),
            ),
        }
    }

    /// Turn by `angle` radians about the z axis.
    pub fn rotation_z(angle: f64) -> Self {
        Self::rotation(&Vec3::z_axis(), angle)
    }

    /// `self` after `other`: `other` is applied first.
    pub fn then(&self, other: &Transform) -> Self {
        Self {
            iso: self.iso * other.iso,
        }
    }

    /// Move a point.
    pub fn apply_point(&self, p: &Point3) -> Point3 {
        self.iso * p
    }

    /// Turn a direction; translation does not apply.
    pub fn apply_vec(&self, v: &Vec3) -> Vec3 {
        self.iso.rotation * v
    }

    /// Turn a surface normal.
    pub fn apply_normal(&self, n: &Vec3) -> Vec3 {
        self.apply_vec(n)
    }

    /// The reverse motion.
    pub fn inverse(&self) -> Self {
        Self {
            iso: self.iso.inverse(),
        }
    }

    /// Homogeneous 4x4 matrix of the motion.
    pub fn to_homogeneous(&self) -> Matrix4<f64> {
        self.iso.to_homogeneous()
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Tolerance used for every on-surface and coincidence test.
///
/// The engine never reads a global: this value travels with the
/// [`GeometryConfig`] of each object and is handed to every surface call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tolerance {
    /// Linear distance tolerance, in geometry units.
    pub linear: f64,
    /// Angular tolerance in radians.
    pub angular: f64,
}

impl Tolerance {
    /// Default tolerances (1e-6 linear, 1e-9 rad angular).
    pub const DEFAULT: Self = Self {
        linear: 1e-6,
        angular: 1e-9,
    };

    /// Tolerance with the given linear value and the default angular one.
    pub const fn linear(linear: f64) -> Self {
        Self {
            linear,
            angular: Self::DEFAULT.angular,
        }
    }

    /// Check if two points are coincident within tolerance.
    pub fn points_equal(&self, a: &Point3, b: &Point3) -> bool {
        (a - b).norm() < self.linear
    }

    /// Check if a scalar distance is effectively zero.
    pub fn is_zero(&self, d: f64) -> bool {
        d.abs() < self.linear
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}
