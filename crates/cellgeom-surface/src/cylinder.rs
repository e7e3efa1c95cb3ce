//! Infinite circular cylinders (quadratic equation).

use cellgeom_math::{Aabb3, Point3, Tolerance, Transform, Vec3};
use nalgebra::Matrix3;

use crate::quadric::Quadric;
use crate::roots::{solve_quadratic, DEGENERATE_EPS};
use crate::{Result, SurfaceError};

/// An infinite cylinder around the line `centre + s * axis`.
///
/// The inside is the negative side.
#[derive(Debug, Clone, PartialEq)]
pub struct Cylinder {
    /// A point on the axis.
    pub centre: Point3,
    /// Unit direction along the axis.
    pub axis: Vec3,
    /// Radius of the cylinder.
    pub radius: f64,
}

impl Cylinder {
    /// Create a cylinder from a point on its axis, an axis direction and a radius.
    pub fn new(centre: Point3, axis: Vec3, radius: f64) -> Result<Self> {
        let norm = axis.norm();
        if !(norm > 0.0) || !norm.is_finite() {
            return Err(SurfaceError::Degenerate(format!(
                "cylinder axis {axis:?} has no direction"
            )));
        }
        if !(radius > 0.0) || !radius.is_finite() {
            return Err(SurfaceError::Degenerate(format!(
                "cylinder radius must be positive, got {radius}"
            )));
        }
        Ok(Self {
            centre,
            axis: axis / norm,
            radius,
        })
    }

    /// Component of `v` perpendicular to the axis.
    fn perpendicular(&self, v: &Vec3) -> Vec3 {
        v - v.dot(&self.axis) * self.axis
    }

    pub(crate) fn side_of(&self, p: &Point3, tol: &Tolerance) -> i32 {
        let d = self.perpendicular(&(p - self.centre)).norm() - self.radius;
        if tol.is_zero(d) {
            0
        } else if d > 0.0 {
            1
        } else {
            -1
        }
    }

    /// Quadratic: `|oc⊥ + t d⊥|² = r²`. A ray parallel to the axis has
    /// no root.
    pub(crate) fn distance_along(&self, origin: &Point3, direction: &Vec3) -> Vec<f64> {
        let d_perp = self.perpendicular(direction);
        let oc_perp = self.perpendicular(&(origin - self.centre));

        let a = d_perp.dot(&d_perp);
        if a < DEGENERATE_EPS {
            return Vec::new();
        }
        let b = 2.0 * oc_perp.dot(&d_perp);
        let c = oc_perp.dot(&oc_perp) - self.radius * self.radius;
        solve_quadratic(a, b, c)
    }

    pub(crate) fn normal_at(&self, p: &Point3) -> Vec3 {
        let radial = self.perpendicular(&(p - self.centre));
        let norm = radial.norm();
        if norm > 0.0 {
            radial / norm
        } else {
            // On the axis: any perpendicular direction.
            let seed = if self.axis.x.abs() < 0.9 {
                Vec3::x()
            } else {
                Vec3::y()
            };
            self.perpendicular(&seed).normalize()
        }
    }

    /// The inside is bounded along every coordinate axis the cylinder axis
    /// is perpendicular to.
    pub(crate) fn bound(&self, sign: i32, aabb: &mut Aabb3) {
        if sign >= 0 {
            return;
        }
        let mut limits = *aabb;
        for i in 0..3 {
            if self.axis[i].abs() < DEGENERATE_EPS {
                limits.min[i] = self.centre[i] - self.radius;
                limits.max[i] = self.centre[i] + self.radius;
            }
        }
        *aabb = aabb.intersection(&limits);
    }

    /// `(p - c)ᵀ (I - a aᵀ) (p - c) - r²`.
    pub(crate) fn to_quadric(&self) -> Quadric {
        let m = Matrix3::identity() - self.axis * self.axis.transpose();
        Quadric::from_centred_matrix(&m, &self.centre, -self.radius * self.radius)
    }

    pub(crate) fn transformed(&self, t: &Transform) -> Result<Self> {
        Self::new(
            t.apply_point(&self.centre),
            t.apply_vec(&self.axis),
            self.radius,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn z_cylinder() -> Cylinder {
        Cylinder::new(Point3::origin(), Vec3::z(), 2.0).unwrap()
    }

    #[test]
    fn test_perpendicular_ray() {
        let roots = z_cylinder().distance_along(&Point3::new(-10.0, 0.0, 3.0), &Vec3::x());
        assert_eq!(roots.len(), 2);
        assert!((roots[0] - 8.0).abs() < 1e-10);
        assert!((roots[1] - 12.0).abs() < 1e-10);
    }

    #[test]
    fn test_parallel_ray_has_no_root() {
        assert!(z_cylinder()
            .distance_along(&Point3::new(1.0, 0.0, -10.0), &Vec3::z())
            .is_empty());
    }

    #[test]
    fn test_side_and_normal() {
        let tol = Tolerance::DEFAULT;
        let c = z_cylinder();
        assert_eq!(c.side_of(&Point3::new(0.0, 0.0, 100.0), &tol), -1);
        assert_eq!(c.side_of(&Point3::new(3.0, 0.0, 0.0), &tol), 1);
        assert_eq!(c.side_of(&Point3::new(0.0, 2.0, -7.0), &tol), 0);
        let n = c.normal_at(&Point3::new(0.0, 2.0, -7.0));
        assert!((n - Vec3::y()).norm() < 1e-12);
    }

    #[test]
    fn test_bound_axis_aligned() {
        let mut aabb = Aabb3::infinite(1e10);
        z_cylinder().bound(-1, &mut aabb);
        assert_eq!(aabb.min.x, -2.0);
        assert_eq!(aabb.max.y, 2.0);
        assert_eq!(aabb.max.z, 1e10);
    }

    #[test]
    fn test_bound_tilted_is_unbounded() {
        let tilted = Cylinder::new(Point3::origin(), Vec3::new(1.0, 1.0, 0.0), 1.0).unwrap();
        let mut aabb = Aabb3::infinite(1e10);
        tilted.bound(-1, &mut aabb);
        assert_eq!(aabb.min.z, -1.0);
        assert_eq!(aabb.max.x, 1e10);
    }

    #[test]
    fn test_transformed_axis() {
        let c = z_cylinder()
            .transformed(&Transform::rotation(
                &cellgeom_math::Dir3::new_normalize(Vec3::x()),
                std::f64::consts::FRAC_PI_2,
            ))
            .unwrap();
        assert!((c.axis.abs() - Vec3::y()).norm() < 1e-12);
    }
}
