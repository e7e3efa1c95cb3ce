//! Geometric invariants checked over whole cells.

use std::f64::consts::PI;

use cellgeom::{
    CsgObject, Cylinder, GeometryConfig, Plane, Point3, Sphere, Surface, SurfaceTable, Track, Vec3,
};

/// 1, 2: spheres; 3: cylinder along z; 4..=9: planes of the box
/// `[-1, 1] x [-2, 2] x [0, 3]`.
fn surfaces() -> anyhow::Result<SurfaceTable> {
    let mut table = SurfaceTable::new();
    table.insert(Surface::new(1, Sphere::new(Point3::origin(), 1.0)?))?;
    table.insert(Surface::new(2, Sphere::new(Point3::new(1.2, 0.0, 0.0), 0.8)?))?;
    table.insert(Surface::new(
        3,
        Cylinder::new(Point3::origin(), Vec3::z(), 1.0)?,
    ))?;
    table.insert(Surface::new(4, Plane::px(-1.0)))?;
    table.insert(Surface::new(5, Plane::px(1.0)))?;
    table.insert(Surface::new(6, Plane::py(-2.0)))?;
    table.insert(Surface::new(7, Plane::py(2.0)))?;
    table.insert(Surface::new(8, Plane::pz(0.0)))?;
    table.insert(Surface::new(9, Plane::pz(3.0)))?;
    Ok(table)
}

fn cell(id: i32, expression: &str) -> anyhow::Result<CsgObject> {
    let mut cell = CsgObject::new(id, expression, GeometryConfig::default())?;
    cell.populate(&surfaces()?)?;
    Ok(cell)
}

/// Points on a skewed lattice that avoids every surface above.
fn samples() -> Vec<Point3> {
    let mut points = Vec::new();
    for i in 0..13 {
        for j in 0..13 {
            for k in 0..13 {
                points.push(Point3::new(
                    -2.4 + 0.4 * f64::from(i) + 0.0137,
                    -2.4 + 0.4 * f64::from(j) + 0.0291,
                    -1.4 + 0.4 * f64::from(k) + 0.0173,
                ));
            }
        }
    }
    points
}

fn directions() -> Vec<Vec3> {
    vec![
        Vec3::x(),
        -Vec3::y(),
        Vec3::z(),
        Vec3::new(1.0, 1.0, 0.0).normalize(),
        Vec3::new(-0.3, 0.7, 0.2).normalize(),
        Vec3::new(0.5, -0.1, -0.9).normalize(),
    ]
}

#[test]
fn test_boolean_consistency() -> anyhow::Result<()> {
    let a = cell(1, "-1")?;
    let b = cell(2, "-2")?;
    let union = cell(3, "-1 : -2")?;
    let intersection = cell(4, "-1 -2")?;
    let complement = cell(5, "#(-1)")?;

    for p in samples() {
        let (in_a, in_b) = (a.is_valid(&p), b.is_valid(&p));
        assert_eq!(union.is_valid(&p), in_a || in_b, "union at {p:?}");
        assert_eq!(intersection.is_valid(&p), in_a && in_b, "intersection at {p:?}");
        assert_eq!(complement.is_valid(&p), !in_a, "complement at {p:?}");
    }
    Ok(())
}

#[test]
fn test_ray_symmetry_on_convex_cells() -> anyhow::Result<()> {
    let cells = [cell(1, "-1")?, cell(2, "4 -5 6 -7 8 -9")?, cell(3, "-3 8 -9")?];
    let tol = GeometryConfig::default().tolerance;

    for cell in &cells {
        for start in samples().into_iter().step_by(7) {
            for dir in directions() {
                let mut track = Track::new(start, dir);
                let links = cell.intercept_surface(&mut track);
                assert!(links <= 1, "convex cell {} crossed {links} times", cell.id());

                if cell.is_valid(&start) {
                    // Odd: the ray only leaves.
                    assert_eq!(links, 1);
                    assert_eq!(track.front().map(|l| l.entry), Some(start));
                    assert!(!track.non_complete(&tol));
                    continue;
                }
                let Some(link) = track.front().cloned() else {
                    continue;
                };
                // Even: one entry and one exit, both on the boundary.
                assert!(cell.is_on_side(&link.entry));
                assert!(cell.is_on_side(&link.exit));

                // Walking back from just beyond the exit covers the same chord.
                let back_start = link.exit + dir * 0.5;
                let mut back = Track::new(back_start, -dir);
                assert_eq!(cell.intercept_surface(&mut back), 1);
                let chord = back.front().map_or(0.0, |l| l.distance_inside);
                assert!((chord - link.distance_inside).abs() < 1e-6);
            }
        }
    }
    Ok(())
}

#[test]
fn test_exact_solid_angle_inside_and_on_boundary() -> anyhow::Result<()> {
    let cases = [
        (
            cell(1, "-1")?,
            Point3::new(0.1, 0.2, 0.3),
            Point3::new(0.0, 0.0, 1.0),
        ),
        (
            cell(2, "4 -5 6 -7 8 -9")?,
            Point3::new(0.5, -1.0, 2.0),
            Point3::new(0.5, 2.0, 1.0),
        ),
        (
            cell(3, "-3 8 -9")?,
            Point3::new(0.2, 0.2, 1.5),
            Point3::new(1.0, 0.0, 1.5),
        ),
        (
            cell(4, "-3 8 -9")?,
            Point3::new(0.2, 0.2, 1.5),
            Point3::new(0.3, -0.4, 3.0),
        ),
    ];
    for (cell, inside, boundary) in &cases {
        assert!((cell.solid_angle(inside) - 4.0 * PI).abs() < 1e-12);
        assert!((cell.solid_angle(boundary) - 2.0 * PI).abs() < 1e-12);
    }
    Ok(())
}

#[test]
fn test_bounding_box_contains_valid_points() -> anyhow::Result<()> {
    let cells = [
        cell(1, "-1")?,
        cell(2, "-1 : -2")?,
        cell(3, "4 -5 6 -7 8 -9")?,
        cell(4, "-3 8 -9")?,
        cell(5, "-1 -2")?,
    ];
    for cell in &cells {
        let bbox = cell.bounding_box();
        assert!(bbox.bounded, "cell {} should be bounded", cell.id());
        let mut grown = bbox.aabb;
        grown.expand(1e-9);
        for p in samples().iter().filter(|p| cell.is_valid(p)) {
            assert!(grown.contains(p), "cell {} leaks at {p:?}", cell.id());
        }
    }
    Ok(())
}

#[test]
fn test_surface_removal_round_trip() -> anyhow::Result<()> {
    let table = surfaces()?;
    let mut slab = cell(1, "-3 8 -9")?;
    assert_eq!(slab.remove_surface(9), 1);
    assert_eq!(slab.surface_keys(), &[3, 8]);
    assert_eq!(slab.expression(), "-3 8");
    assert!(!slab.bounding_box().bounded);

    // Putting the cap back yields the original cell again.
    let mut restored = CsgObject::new(1, &format!("{} -9", slab.expression()), *slab.config())?;
    restored.populate(&table)?;
    let original = cell(1, "-3 8 -9")?;
    for p in samples() {
        assert_eq!(restored.is_valid(&p), original.is_valid(&p));
    }
    assert_eq!(restored.bounding_box(), original.bounding_box());
    Ok(())
}
