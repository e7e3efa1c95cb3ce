//! Axis-aligned bounding boxes.
//!
//! Rule trees tighten an [`Aabb3`] that starts out as a very large cube;
//! the ray-tracing solid-angle estimator uses the result to restrict its
//! integration domain.

use crate::{Point3, Vec3};

/// Axis-aligned bounding box in 3D.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb3 {
    /// Minimum corner.
    pub min: Point3,
    /// Maximum corner.
    pub max: Point3,
}

impl Aabb3 {
    /// Create an AABB from min and max corners.
    pub fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// Create an empty (inverted) AABB suitable for expansion.
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// A cube of half-width `limit` centred on the origin.
    ///
    /// This is the starting box handed to a rule tree; any face that is
    /// still at `±limit` afterwards was never tightened.
    pub fn infinite(limit: f64) -> Self {
        Self {
            min: Point3::new(-limit, -limit, -limit),
            max: Point3::new(limit, limit, limit),
        }
    }

    /// True if the box contains no point (min > max on some axis).
    pub fn is_empty(&self) -> bool {
        (0..3).any(|i| self.min[i] > self.max[i])
    }

    /// Expand this AABB to include a point.
    pub fn include_point(&mut self, p: &Point3) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    /// Expand the AABB by a tolerance in all directions.
    pub fn expand(&mut self, tol: f64) {
        self.min.x -= tol;
        self.min.y -= tol;
        self.min.z -= tol;
        self.max.x += tol;
        self.max.y += tol;
        self.max.z += tol;
    }

    /// Overlap of two boxes (may be empty).
    pub fn intersection(&self, other: &Aabb3) -> Aabb3 {
        Aabb3 {
            min: Point3::new(
                self.min.x.max(other.min.x),
                self.min.y.max(other.min.y),
                self.min.z.max(other.min.z),
            ),
            max: Point3::new(
                self.max.x.min(other.max.x),
                self.max.y.min(other.max.y),
                self.max.z.min(other.max.z),
            ),
        }
    }

    /// Smallest box containing both boxes. Empty boxes are ignored.
    pub fn hull(&self, other: &Aabb3) -> Aabb3 {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Aabb3 {
            min: Point3::new(
                self.min.x.min(other.min.x),
                self.min.y.min(other.min.y),
                self.min.z.min(other.min.z),
            ),
            max: Point3::new(
                self.max.x.max(other.max.x),
                self.max.y.max(other.max.y),
                self.max.z.max(other.max.z),
            ),
        }
    }

    /// Test if a point lies inside the box (boundary included).
    pub fn contains(&self, p: &Point3) -> bool {
        (0..3).all(|i| p[i] >= self.min[i] && p[i] <= self.max[i])
    }

    /// Centre of the box.
    pub fn centre(&self) -> Point3 {
        nalgebra::center(&self.min, &self.max)
    }

    /// The eight corners of the box.
    pub fn corners(&self) -> [Point3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Point3::new(a.x, a.y, a.z),
            Point3::new(b.x, a.y, a.z),
            Point3::new(a.x, b.y, a.z),
            Point3::new(b.x, b.y, a.z),
            Point3::new(a.x, a.y, b.z),
            Point3::new(b.x, a.y, b.z),
            Point3::new(a.x, b.y, b.z),
            Point3::new(b.x, b.y, b.z),
        ]
    }

    /// True if any face of the box lies at or beyond `±limit`.
    pub fn touches_limit(&self, limit: f64) -> bool {
        (0..3).any(|i| self.min[i] <= -limit || self.max[i] >= limit)
    }

    /// Slab test of the half line `origin + t * direction`, `t >= 0`.
    ///
    /// Returns `Some((t_min, t_max))` with `t_min` clamped to zero, or
    /// `None` when the line misses the box. Components of `direction`
    /// that are zero produce infinite reciprocals, which the min/max
    /// reduction handles.
    pub fn ray_intersect(&self, origin: &Point3, direction: &Vec3) -> Option<(f64, f64)> {
        let mut t_min = f64::NEG_INFINITY;
        let mut t_max = f64::INFINITY;
        for i in 0..3 {
            let inv = 1.0 / direction[i];
            let mut t1 = (self.min[i] - origin[i]) * inv;
            let mut t2 = (self.max[i] - origin[i]) * inv;
            if inv < 0.0 {
                std::mem::swap(&mut t1, &mut t2);
            }
            t_min = t_min.max(t1);
            t_max = t_max.min(t2);
        }

        if t_max >= t_min && t_max >= 0.0 {
            Some((t_min.max(0.0), t_max))
        } else {
            None
        }
    }

    /// Largest angle, seen from `observer`, between the direction to the
    /// box centre and the direction to any corner.
    ///
    /// Returns π when the observer sits on the centre.
    pub fn angular_width(&self, observer: &Point3) -> f64 {
        let centre = self.centre() - observer;
        let centre_norm = centre.norm();
        if centre_norm == 0.0 {
            return std::f64::consts::PI;
        }
        self.corners()
            .iter()
            .map(|corner| {
                let to_corner = corner - observer;
                let norm = to_corner.norm();
                if norm == 0.0 {
                    return std::f64::consts::FRAC_PI_2;
                }
                (to_corner.dot(&centre) / (norm * centre_norm))
                    .clamp(-1.0, 1.0)
                    .acos()
            })
            .fold(0.0, f64::max)
    }
}
