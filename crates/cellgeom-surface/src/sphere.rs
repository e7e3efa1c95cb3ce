//! Spheres (quadratic equation).

use cellgeom_math::{Aabb3, Point3, Tolerance, Transform, Vec3};

use crate::quadric::Quadric;
use crate::roots::solve_quadratic;
use crate::{Result, SurfaceError};

/// A sphere; the inside is the negative side.
#[derive(Debug, Clone, PartialEq)]
pub struct Sphere {
    /// Centre of the sphere.
    pub centre: Point3,
    /// Radius of the sphere.
    pub radius: f64,
}

impl Sphere {
    /// Create a sphere with the given centre and radius.
    pub fn new(centre: Point3, radius: f64) -> Result<Self> {
        if !(radius > 0.0) || !radius.is_finite() {
            return Err(SurfaceError::Degenerate(format!(
                "sphere radius must be positive, got {radius}"
            )));
        }
        Ok(Self { centre, radius })
    }

    pub(crate) fn side_of(&self, p: &Point3, tol: &Tolerance) -> i32 {
        let d = (p - self.centre).norm() - self.radius;
        if tol.is_zero(d) {
            0
        } else if d > 0.0 {
            1
        } else {
            -1
        }
    }

    /// Quadratic: `|oc + t d|² = r²`.
    pub(crate) fn distance_along(&self, origin: &Point3, direction: &Vec3) -> Vec<f64> {
        let oc = origin - self.centre;
        let a = direction.dot(direction);
        let b = 2.0 * oc.dot(direction);
        let c = oc.dot(&oc) - self.radius * self.radius;
        solve_quadratic(a, b, c)
    }

    pub(crate) fn normal_at(&self, p: &Point3) -> Vec3 {
        let radial = p - self.centre;
        let norm = radial.norm();
        if norm > 0.0 {
            radial / norm
        } else {
            Vec3::z()
        }
    }

    /// The inside is contained in the sphere's cube; the outside is unbounded.
    pub(crate) fn bound(&self, sign: i32, aabb: &mut Aabb3) {
        if sign < 0 {
            let r = Vec3::repeat(self.radius);
            *aabb = aabb.intersection(&Aabb3::new(self.centre - r, self.centre + r));
        }
    }

    pub(crate) fn to_quadric(&self) -> Quadric {
        let c = self.centre;
        Quadric::new([
            1.0,
            1.0,
            1.0,
            0.0,
            0.0,
            0.0,
            -2.0 * c.x,
            -2.0 * c.y,
            -2.0 * c.z,
            c.coords.norm_squared() - self.radius * self.radius,
        ])
    }

    pub(crate) fn transformed(&self, t: &Transform) -> Self {
        Self {
            centre: t.apply_point(&self.centre),
            radius: self.radius,
        }
    }
}
