//! General quadric surfaces.
//!
//! `A x² + B y² + C z² + D xy + E xz + F yz + G x + H y + J z + K = 0`,
//! with the positive side where the left-hand side is positive.

use cellgeom_math::{Point3, Tolerance, Transform, Vec3};
use nalgebra::{Matrix3, Matrix4};

use crate::roots::solve_quadratic;

/// A general second-order surface.
#[derive(Debug, Clone, PartialEq)]
pub struct Quadric {
    /// `[A, B, C, D, E, F, G, H, J, K]` in the order of the module equation.
    pub coefficients: [f64; 10],
}

impl Quadric {
    /// Create a quadric from its ten coefficients.
    pub fn new(coefficients: [f64; 10]) -> Self {
        Self { coefficients }
    }

    /// Quadric `(p - c)ᵀ M (p - c) + constant` for a symmetric `M`.
    pub fn from_centred_matrix(m: &Matrix3<f64>, centre: &Point3, constant: f64) -> Self {
        let c = centre.coords;
        let linear = -2.0 * (m * c);
        Self::new([
            m[(0, 0)],
            m[(1, 1)],
            m[(2, 2)],
            2.0 * m[(0, 1)],
            2.0 * m[(0, 2)],
            2.0 * m[(1, 2)],
            linear.x,
            linear.y,
            linear.z,
            c.dot(&(m * c)) + constant,
        ])
    }

    /// Symmetric matrix of the second-order terms.
    pub fn matrix(&self) -> Matrix3<f64> {
        let [a, b, c, d, e, f, ..] = self.coefficients;
        Matrix3::new(
            a,
            0.5 * d,
            0.5 * e,
            0.5 * d,
            b,
            0.5 * f,
            0.5 * e,
            0.5 * f,
            c,
        )
    }

    /// Vector of the first-order terms `(G, H, J)`.
    pub fn linear(&self) -> Vec3 {
        Vec3::new(
            self.coefficients[6],
            self.coefficients[7],
            self.coefficients[8],
        )
    }

    /// Value of the left-hand side at `p`.
    pub fn value(&self, p: &Point3) -> f64 {
        let v = p.coords;
        v.dot(&(self.matrix() * v)) + self.linear().dot(&v) + self.coefficients[9]
    }

    /// Gradient of the left-hand side at `p`.
    pub fn gradient(&self, p: &Point3) -> Vec3 {
        2.0 * (self.matrix() * p.coords) + self.linear()
    }

    /// First-order distance estimate `value / |gradient|`.
    fn signed_offset(&self, p: &Point3) -> f64 {
        let value = self.value(p);
        let grad = self.gradient(p).norm();
        if grad > 0.0 {
            value / grad
        } else {
            value
        }
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

    pub(crate) fn distance_along(&self, origin: &Point3, direction: &Vec3) -> Vec<f64> {
        let m = self.matrix();
        let md = m * direction;
        let a = direction.dot(&md);
        let b = 2.0 * origin.coords.dot(&md) + self.linear().dot(direction);
        let c = self.value(origin);
        solve_quadratic(a, b, c)
    }

    pub(crate) fn normal_at(&self, p: &Point3) -> Vec3 {
        let grad = self.gradient(p);
        let norm = grad.norm();
        if norm > 0.0 {
            grad / norm
        } else {
            Vec3::z()
        }
    }

    /// Homogeneous form `[x y z 1] S [x y z 1]ᵀ`.
    fn homogeneous(&self) -> Matrix4<f64> {
        let m = self.matrix();
        let l = 0.5 * self.linear();
        let mut s = Matrix4::zeros();
        s.fixed_view_mut::<3, 3>(0, 0).copy_from(&m);
        s.fixed_view_mut::<3, 1>(0, 3).copy_from(&l);
        s.fixed_view_mut::<1, 3>(3, 0).copy_from(&l.transpose());
        s[(3, 3)] = self.coefficients[9];
        s
    }

    /// `S' = T⁻ᵀ S T⁻¹`, so that `q'(T p) = q(p)`.
    pub(crate) fn transformed(&self, t: &Transform) -> Self {
        let inv = t.inverse().to_homogeneous();
        let s = inv.transpose() * self.homogeneous() * inv;
        Self::new([
            s[(0, 0)],
            s[(1, 1)],
            s[(2, 2)],
            2.0 * s[(0, 1)],
            2.0 * s[(0, 2)],
            2.0 * s[(1, 2)],
            2.0 * s[(0, 3)],
            2.0 * s[(1, 3)],
            2.0 * s[(2, 3)],
            s[(3, 3)],
        ])
    }
}
