//! Solid-angle estimators.
//!
//! Three methods, from most to least exact:
//!
//! - a single sphere seen from outside has a closed form
//! - a triangulated surface is summed with the Van Oosterom–Strackee
//!   formula per triangle
//! - anything else is integrated over a θ/φ grid of rays, each ray that
//!   meets the object contributing its patch `sinθ dθ dφ`

use std::f64::consts::PI;

use cellgeom_math::{Point3, Vec3};
use cellgeom_surface::SurfaceKind;
use cellgeom_track::Track;
use nalgebra::UnitQuaternion;
use rayon::prelude::*;
use tracing::{debug, trace};

use crate::mesh::TriangleMesh;
use crate::object::CsgObject;
use crate::rule::RuleNode;

/// Signed solid angle of triangle `(a, b, c)` seen from `observer`.
///
/// Positive when the observer is behind the triangle, taking its normal
/// from the right-handed winding `a -> b -> c`. Zero for a degenerate
/// configuration.
pub fn triangle_solid_angle(a: &Point3, b: &Point3, c: &Point3, observer: &Point3) -> f64 {
    let ao = a - observer;
    let bo = b - observer;
    let co = c - observer;
    let (la, lb, lc) = (ao.norm(), bo.norm(), co.norm());
    let numerator = ao.dot(&bo.cross(&co));
    let denominator = la * lb * lc + ao.dot(&bo) * lc + ao.dot(&co) * lb + bo.dot(&co) * la;
    if denominator == 0.0 {
        return 0.0;
    }
    2.0 * numerator.atan2(denominator)
}

/// Solid angle of a closed mesh seen from outside.
///
/// Front and back faces cancel in the signed sum, so the two halves are
/// accumulated apart and averaged.
pub fn mesh_solid_angle(mesh: &TriangleMesh, observer: &Point3) -> f64 {
    let (positive, negative) = mesh
        .triangles()
        .map(|[a, b, c]| triangle_solid_angle(&a, &b, &c, observer))
        .fold((0.0, 0.0), |(pos, neg), omega| {
            if omega > 0.0 {
                (pos + omega, neg)
            } else {
                (pos, neg + omega)
            }
        });
    0.5 * (positive - negative)
}

/// Solid angle of a sphere of `radius` whose centre is `distance` away.
/// `4π` when the observer is not outside.
pub fn sphere_cap_solid_angle(radius: f64, distance: f64) -> f64 {
    if distance <= radius {
        return 4.0 * PI;
    }
    let ratio = radius / distance;
    2.0 * PI * (1.0 - (1.0 - ratio * ratio).sqrt())
}

/// Closed form for an object that is exactly the inside of one sphere.
pub(crate) fn single_sphere(object: &CsgObject, observer: &Point3) -> Option<f64> {
    let RuleNode::Surface { sign: -1, slot, .. } = object.rule().single_leaf()? else {
        return None;
    };
    let SurfaceKind::Sphere(sphere) = object.surface_list().get(slot)?.kind() else {
        return None;
    };
    debug!(id = object.id(), "analytic sphere solid angle");
    Some(sphere_cap_solid_angle(
        sphere.radius,
        (observer - sphere.centre).norm(),
    ))
}

/// Rotation taking `+z` onto `axis`.
fn orientation(axis: &Vec3) -> UnitQuaternion<f64> {
    if axis.norm() == 0.0 {
        return UnitQuaternion::identity();
    }
    UnitQuaternion::rotation_between(&Vec3::z(), axis)
        .unwrap_or_else(|| UnitQuaternion::from_axis_angle(&Vec3::x_axis(), PI))
}

/// Grid parameters of one integration.
struct Grid {
    resolution: u32,
    theta_max: f64,
    min_phi: u32,
    rotation: UnitQuaternion<f64>,
}

/// Hits and solid angle collected on one θ row.
#[derive(Clone, Copy, Default)]
struct Row {
    hits: u32,
    omega: f64,
}

impl Grid {
    fn row(&self, object: &CsgObject, observer: &Point3, i: u32, use_bbox: bool) -> Row {
        let d_theta = self.theta_max / f64::from(self.resolution);
        let theta = d_theta * (f64::from(i) + 0.5);
        let (sin_theta, cos_theta) = theta.sin_cos();
        // Roughly square patches: the φ step matches dθ along the row.
        let phi_steps = ((2.0 * PI * sin_theta / d_theta) as u32).max(self.min_phi);
        let d_phi = 2.0 * PI / f64::from(phi_steps);
        let bbox = object.bounding_box().aabb;

        let mut row = Row::default();
        for j in 0..phi_steps {
            let phi = d_phi * (f64::from(j) + 0.5);
            let local = Vec3::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta);
            let direction = self.rotation * local;
            if use_bbox && bbox.ray_intersect(observer, &direction).is_none() {
                continue;
            }
            let mut track = Track::new(*observer, direction);
            if object.intercept_surface(&mut track) > 0 {
                row.hits += 1;
                row.omega += sin_theta * d_theta * d_phi;
            }
        }
        row
    }

    fn rows(&self, object: &CsgObject, observer: &Point3, use_bbox: bool) -> Vec<Row> {
        if object.config().solid_angle.parallel {
            (0..self.resolution)
                .into_par_iter()
                .map(|i| self.row(object, observer, i, use_bbox))
                .collect()
        } else {
            (0..self.resolution)
                .map(|i| self.row(object, observer, i, use_bbox))
                .collect()
        }
    }
}

/// Integrate the solid angle by firing rays from `observer`.
///
/// With a bounded box that does not contain the observer the cone of
/// directions is narrowed to the box and rays missing the box are skipped.
/// Otherwise the whole sphere is scanned around the direction of a point
/// inside the object, stopping at the first θ row without hits; too few
/// hits trigger a second pass confined to the populated cone.
pub(crate) fn ray_trace(object: &CsgObject, observer: &Point3) -> f64 {
    let cfg = object.config().solid_angle;
    let bbox = object.bounding_box();

    if bbox.bounded && !bbox.aabb.contains(observer) {
        let grid = Grid {
            resolution: cfg.resolution_bounded,
            theta_max: bbox.aabb.angular_width(observer).min(PI),
            min_phi: cfg.min_phi_steps,
            rotation: orientation(&(bbox.aabb.centre() - observer)),
        };
        let omega: f64 = grid
            .rows(object, observer, true)
            .iter()
            .map(|r| r.omega)
            .sum();
        trace!(id = object.id(), omega, "bounded ray trace");
        return omega;
    }

    let axis = object
        .point_in_object()
        .map_or_else(Vec3::z, |p| p - observer);
    let mut grid = Grid {
        resolution: cfg.resolution_unbounded,
        theta_max: PI,
        min_phi: cfg.min_phi_steps,
        rotation: orientation(&axis),
    };
    let (omega, hits, empty_row) = accumulate(&grid.rows(object, observer, false));
    if hits >= cfg.min_phi_steps + 1 {
        return omega;
    }

    let reached = f64::from(empty_row.unwrap_or(grid.resolution)) + 0.5;
    grid.theta_max = (PI * reached / f64::from(grid.resolution)).min(PI);
    debug!(
        id = object.id(),
        hits,
        theta_max = grid.theta_max,
        "refining ray trace"
    );
    accumulate(&grid.rows(object, observer, false)).0
}

/// Sum rows up to the first one without hits. Returns the solid angle, the
/// hit count and the index of the empty row.
fn accumulate(rows: &[Row]) -> (f64, u32, Option<u32>) {
    let mut omega = 0.0;
    let mut hits = 0;
    for (i, row) in rows.iter().enumerate() {
        if row.hits == 0 {
            return (omega, hits, u32::try_from(i).ok());
        }
        omega += row.omega;
        hits += row.hits;
    }
    (omega, hits, None)
}
