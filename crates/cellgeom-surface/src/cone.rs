//! Double-nappe circular cones (quadratic equation).

use std::f64::consts::FRAC_PI_2;

use cellgeom_math::{Point3, Tolerance, Transform, Vec3};
use nalgebra::Matrix3;

use crate::quadric::Quadric;
use crate::roots::solve_quadratic;
use crate::{Result, SurfaceError};

/// A double cone with apex `apex`, unit axis `axis` and half-angle
/// `half_angle` (radians).
///
/// Points closer to the axis than the half-angle (on either nappe) are on
/// the negative side.
#[derive(Debug, Clone, PartialEq)]
pub struct Cone {
    /// Apex (tip) of the cone.
    pub apex: Point3,
    /// Unit direction of the axis.
    pub axis: Vec3,
    /// Half-angle in radians, in `(0, π/2)`.
    pub half_angle: f64,
}

impl Cone {
    /// Create a cone from apex, axis direction and half-angle.
    pub fn new(apex: Point3, axis: Vec3, half_angle: f64) -> Result<Self> {
        let norm = axis.norm();
        if !(norm > 0.0) || !norm.is_finite() {
            return Err(SurfaceError::Degenerate(format!(
                "cone axis {axis:?} has no direction"
            )));
        }
        if !(half_angle > 0.0 && half_angle < FRAC_PI_2) {
            return Err(SurfaceError::Degenerate(format!(
                "cone half-angle must be in (0, π/2), got {half_angle}"
            )));
        }
        Ok(Self {
            apex,
            axis: axis / norm,
            half_angle,
        })
    }

    /// Distance-like measure: `|r| sin(φ - θ)` where φ is the angle
    /// between `r = p - apex` and the axis line.
    fn signed_offset(&self, p: &Point3) -> f64 {
        let r = p - self.apex;
        let len = r.norm();
        if len == 0.0 {
            return 0.0;
        }
        let cos_phi = (r.dot(&self.axis).abs() / len).min(1.0);
        len * (cos_phi.acos() - self.half_angle).sin()
    }

    pub(crate) fn side_of(&self, p: &Point3, tol: &Tolerance) -> i32 {
        let d = self.signed_offset(p);
        if tol.is_zero(d) {
            0
        } else if d > 0.0 {
            1
        } else {
            -1
        }
    }

    /// Substitute the line into `((p - apex)·a)² = cos²θ |p - apex|²`.
    /// Both nappes are reported.
    pub(crate) fn distance_along(&self, origin: &Point3, direction: &Vec3) -> Vec<f64> {
        let co = origin - self.apex;
        let cos2 = self.half_angle.cos().powi(2);
        let d_dot_a = direction.dot(&self.axis);
        let co_dot_a = co.dot(&self.axis);

        let a = d_dot_a * d_dot_a - cos2 * direction.dot(direction);
        let b = 2.0 * (d_dot_a * co_dot_a - cos2 * direction.dot(&co));
        let c = co_dot_a * co_dot_a - cos2 * co.dot(&co);
        solve_quadratic(a, b, c)
    }

    /// Gradient of `cos²θ |r|² - (r·a)²`; at the apex the axis is returned.
    pub(crate) fn normal_at(&self, p: &Point3) -> Vec3 {
        let r = p - self.apex;
        let cos2 = self.half_angle.cos().powi(2);
        let grad = cos2 * r - r.dot(&self.axis) * self.axis;
        let norm = grad.norm();
        if norm > 0.0 {
            grad / norm
        } else {
            self.axis
        }
    }

    pub(crate) fn to_quadric(&self) -> Quadric {
        let cos2 = self.half_angle.cos().powi(2);
        let m = Matrix3::identity() * cos2 - self.axis * self.axis.transpose();
        Quadric::from_centred_matrix(&m, &self.apex, 0.0)
    }

    pub(crate) fn transformed(&self, t: &Transform) -> Result<Self> {
        Self::new(
            t.apply_point(&self.apex),
            t.apply_vec(&self.axis),
            self.half_angle,
        )
    }
}
