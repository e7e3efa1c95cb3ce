//! The unit cube `[0, 1]³` end to end.

use std::f64::consts::PI;

use approx::assert_relative_eq;
use cellgeom::{Geometry, Point3, Track, Vec3};

const CUBE: &str = r#"
    [[surfaces]]
    key = 1
    type = "plane"
    normal = [1.0, 0.0, 0.0]
    distance = 0.0

    [[surfaces]]
    key = 2
    type = "plane"
    normal = [1.0, 0.0, 0.0]
    distance = 1.0

    [[surfaces]]
    key = 3
    type = "plane"
    normal = [0.0, 1.0, 0.0]
    distance = 0.0

    [[surfaces]]
    key = 4
    type = "plane"
    normal = [0.0, 1.0, 0.0]
    distance = 1.0

    [[surfaces]]
    key = 5
    type = "plane"
    normal = [0.0, 0.0, 1.0]
    distance = 0.0

    [[surfaces]]
    key = 6
    type = "plane"
    normal = [0.0, 0.0, 1.0]
    distance = 1.0

    [[cells]]
    id = 1
    expression = "1 -2 3 -4 5 -6"
"#;

fn cube() -> anyhow::Result<Geometry> {
    Ok(Geometry::from_toml_str(CUBE)?)
}

#[test]
fn test_point_classification() -> anyhow::Result<()> {
    let geometry = cube()?;
    let cell = geometry.cell(1).expect("cell 1");

    let centre = Point3::new(0.5, 0.5, 0.5);
    assert!(cell.is_valid(&centre));
    assert!(!cell.is_on_side(&centre));

    let outside = Point3::new(2.0, 0.5, 0.5);
    assert!(!cell.is_valid(&outside));
    assert!(!cell.is_on_side(&outside));

    let face = Point3::new(1.0, 0.5, 0.5);
    assert!(cell.is_valid(&face));
    assert!(cell.is_on_side(&face));
    Ok(())
}

#[test]
fn test_track_crosses_both_faces() -> anyhow::Result<()> {
    let geometry = cube()?;
    let mut track = Track::new(Point3::new(-1.0, 0.5, 0.5), Vec3::x());
    assert_eq!(geometry.trace(&mut track), 1);

    let link = track.front().expect("one link");
    assert!((link.entry - Point3::new(0.0, 0.5, 0.5)).norm() < 1e-9);
    assert!((link.exit - Point3::new(1.0, 0.5, 0.5)).norm() < 1e-9);
    assert!((link.distance_inside - 1.0).abs() < 1e-9);
    assert!(track.pending_points().is_empty());
    Ok(())
}

#[test]
fn test_solid_angle_from_centre() -> anyhow::Result<()> {
    let geometry = cube()?;
    let omega = geometry.solid_angle(1, &Point3::new(0.5, 0.5, 0.5))?;
    assert!((omega - 4.0 * PI).abs() < 1e-12);
    Ok(())
}

#[test]
fn test_bounding_box() -> anyhow::Result<()> {
    let geometry = cube()?;
    let bbox = geometry.cell(1).expect("cell 1").bounding_box();
    assert!(bbox.bounded);
    assert_relative_eq!(bbox.aabb.min, Point3::origin(), epsilon = 1e-9);
    assert_relative_eq!(bbox.aabb.max, Point3::new(1.0, 1.0, 1.0), epsilon = 1e-9);
    Ok(())
}

#[test]
fn test_ray_traced_solid_angle_from_afar() -> anyhow::Result<()> {
    let geometry = cube()?;
    let observer = Point3::new(0.5, 0.5, 10.0);
    let omega = geometry.solid_angle(1, &observer)?;

    // The near face is a unit square nine units away.
    let exact = 4.0 * (1.0 / (1.0 + 4.0 * 81.0_f64)).asin();
    assert_relative_eq!(omega, exact, max_relative = 0.1);
    Ok(())
}
