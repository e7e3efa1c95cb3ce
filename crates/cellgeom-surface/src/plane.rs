//! Infinite planes `n · p = d`.

use cellgeom_math::{Aabb3, Point3, Tolerance, Transform, Vec3};

use crate::quadric::Quadric;
use crate::roots::solve_linear;
use crate::{Result, SurfaceError};

/// An infinite plane with unit normal `normal` at signed distance
/// `distance` from the origin.
///
/// The positive side is the one the normal points into.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    /// Unit normal.
    pub normal: Vec3,
    /// Signed distance from the origin along `normal`.
    pub distance: f64,
}

/// The twelve edges of a box as pairs of indices into [`Aabb3::corners`].
const BOX_EDGES: [(usize, usize); 12] = [
    (0, 1),
    (2, 3),
    (4, 5),
    (6, 7),
    (0, 2),
    (1, 3),
    (4, 6),
    (5, 7),
    (0, 4),
    (1, 5),
    (2, 6),
    (3, 7),
];

impl Plane {
    /// Create a plane from a (not necessarily unit) normal and the distance
    /// along the normalized normal.
    pub fn new(normal: Vec3, distance: f64) -> Result<Self> {
        let norm = normal.norm();
        if !(norm > 0.0) || !norm.is_finite() {
            return Err(SurfaceError::Degenerate(format!(
                "plane normal {normal:?} has no direction"
            )));
        }
        Ok(Self {
            normal: normal / norm,
            distance,
        })
    }

    /// Plane through `point` with the given normal.
    pub fn through(point: &Point3, normal: Vec3) -> Result<Self> {
        let plane = Self::new(normal, 0.0)?;
        let distance = plane.normal.dot(&point.coords);
        Ok(Self { distance, ..plane })
    }

    /// Plane `x = value` with normal +x.
    pub fn px(value: f64) -> Self {
        Self {
            normal: Vec3::x(),
            distance: value,
        }
    }

    /// Plane `y = value` with normal +y.
    pub fn py(value: f64) -> Self {
        Self {
            normal: Vec3::y(),
            distance: value,
        }
    }

    /// Plane `z = value` with normal +z.
    pub fn pz(value: f64) -> Self {
        Self {
            normal: Vec3::z(),
            distance: value,
        }
    }

    /// Signed distance from a point to this plane.
    pub fn signed_distance(&self, p: &Point3) -> f64 {
        self.normal.dot(&p.coords) - self.distance
    }

    pub(crate) fn side_of(&self, p: &Point3, tol: &Tolerance) -> i32 {
        let d = self.signed_distance(p);
        if tol.is_zero(d) {
            0
        } else if d > 0.0 {
            1
        } else {
            -1
        }
    }

    pub(crate) fn distance_along(&self, origin: &Point3, direction: &Vec3) -> Vec<f64> {
        solve_linear(self.normal.dot(direction), self.signed_distance(origin))
            .into_iter()
            .collect()
    }

    pub(crate) fn normal_at(&self, _p: &Point3) -> Vec3 {
        self.normal
    }

    /// Clip `aabb` to the half-space on side `sign` of the plane.
    ///
    /// The kept region is bounded by the box corners on that side and the
    /// points where box edges cross the plane.
    pub(crate) fn bound(&self, sign: i32, aabb: &mut Aabb3, tol: &Tolerance) {
        if aabb.is_empty() {
            return;
        }
        let sign = f64::from(sign.signum());
        let corners = aabb.corners();
        let values: Vec<f64> = corners
            .iter()
            .map(|c| sign * self.signed_distance(c))
            .collect();

        let mut kept = Aabb3::empty();
        for (corner, &value) in corners.iter().zip(&values) {
            if value >= -tol.linear {
                kept.include_point(corner);
            }
        }
        for &(i, j) in &BOX_EDGES {
            let (vi, vj) = (values[i], values[j]);
            if (vi < 0.0) != (vj < 0.0) {
                let s = vi / (vi - vj);
                let p = corners[i] + s * (corners[j] - corners[i]);
                // Snap back onto the plane: the edge may be ~1e10 long.
                let p = p - self.normal * self.signed_distance(&p);
                kept.include_point(&p);
            }
        }

        *aabb = if kept.is_empty() {
            Aabb3::empty()
        } else {
            aabb.intersection(&kept)
        };
    }

    pub(crate) fn to_quadric(&self) -> Quadric {
        let n = self.normal;
        Quadric::new([
            0.0,
            0.0,
            0.0,
            0.0,
            0.0,
            0.0,
            n.x,
            n.y,
            n.z,
            -self.distance,
        ])
    }

    pub(crate) fn transformed(&self, t: &Transform) -> Result<Self> {
        let on_plane = Point3::from(self.normal * self.distance);
        Self::through(&t.apply_point(&on_plane), t.apply_normal(&self.normal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_of() {
        let tol = Tolerance::DEFAULT;
        let plane = Plane::px(1.0);
        assert_eq!(plane.side_of(&Point3::new(2.0, 0.0, 0.0), &tol), 1);
        assert_eq!(plane.side_of(&Point3::new(0.0, 5.0, 0.0), &tol), -1);
        assert_eq!(plane.side_of(&Point3::new(1.0 + 1e-8, 3.0, 0.0), &tol), 0);
    }

    #[test]
    fn test_distance_along() {
        let plane = Plane::pz(0.0);
        let roots = plane.distance_along(&Point3::new(0.0, 0.0, 5.0), &Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(roots, vec![5.0]);

        // Roots behind the origin are still reported.
        let roots = plane.distance_along(&Point3::new(0.0, 0.0, 5.0), &Vec3::z());
        assert_eq!(roots, vec![-5.0]);
    }

    #[test]
    fn test_parallel_ray_has_no_root() {
        let plane = Plane::pz(0.0);
        assert!(plane
            .distance_along(&Point3::new(0.0, 0.0, 5.0), &Vec3::x())
            .is_empty());
    }

    #[test]
    fn test_angled_ray() {
        let plane = Plane::pz(0.0);
        let dir = Vec3::new(1.0, 0.0, -1.0).normalize();
        let roots = plane.distance_along(&Point3::new(0.0, 0.0, 10.0), &dir);
        assert!((roots[0] - 10.0 * 2.0_f64.sqrt()).abs() < 1e-10);
    }

    #[test]
    fn test_degenerate_normal_rejected() {
        assert!(Plane::new(Vec3::zeros(), 1.0).is_err());
    }

    #[test]
    fn test_bound_axis_aligned() {
        let tol = Tolerance::DEFAULT;
        let mut aabb = Aabb3::infinite(1e10);
        Plane::px(2.0).bound(-1, &mut aabb, &tol);
        assert_eq!(aabb.max.x, 2.0);
        assert_eq!(aabb.min.x, -1e10);

        Plane::px(-3.0).bound(1, &mut aabb, &tol);
        assert_eq!(aabb.min.x, -3.0);
        assert_eq!(aabb.max.y, 1e10);
    }

    #[test]
    fn test_bound_oblique_plane() {
        let tol = Tolerance::DEFAULT;
        let mut aabb = Aabb3::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
        // x + y <= 0.5 keeps the corner near the origin.
        let plane = Plane::new(Vec3::new(1.0, 1.0, 0.0), 0.5 / 2.0_f64.sqrt()).unwrap();
        plane.bound(-1, &mut aabb, &tol);
        assert!((aabb.max.x - 0.5).abs() < 1e-12);
        assert!((aabb.max.y - 0.5).abs() < 1e-12);
        assert_eq!(aabb.max.z, 1.0);
    }

    #[test]
    fn test_bound_empty_side() {
        let tol = Tolerance::DEFAULT;
        let mut aabb = Aabb3::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
        Plane::px(5.0).bound(1, &mut aabb, &tol);
        assert!(aabb.is_empty());
    }

    #[test]
    fn test_transform_moves_plane() {
        let plane = Plane::px(1.0);
        let moved = plane
            .transformed(&Transform::translation(2.0, 0.0, 0.0))
            .unwrap();
        assert!((moved.distance - 3.0).abs() < 1e-12);

        let rotated = plane
            .transformed(&Transform::rotation_z(std::f64::consts::FRAC_PI_2))
            .unwrap();
        assert!((rotated.normal - Vec3::y()).norm() < 1e-12);
        assert!((rotated.distance - 1.0).abs() < 1e-12);
    }
}
