//! Serializable surface definitions.
//!
//! ```toml
//! [[surfaces]]
//! key = 1
//! type = "plane"
//! normal = [1.0, 0.0, 0.0]
//! distance = 0.5
//! ```

use cellgeom_math::{Point3, Vec3};
use serde::{Deserialize, Serialize};

use crate::{Cone, Cylinder, Plane, Quadric, Result, Sphere, Surface, SurfaceKind};

/// A surface as written in a geometry file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceDef {
    /// Key used by cell expressions.
    pub key: i32,
    /// Primitive and its parameters.
    #[serde(flatten)]
    pub shape: SurfaceShape,
}

/// Primitive parameters, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SurfaceShape {
    /// `normal · p = distance`; `normal` need not be unit length.
    Plane {
        /// Normal direction.
        normal: [f64; 3],
        /// Offset along the normalized normal.
        distance: f64,
    },
    /// Sphere.
    Sphere {
        /// Centre.
        centre: [f64; 3],
        /// Radius.
        radius: f64,
    },
    /// Infinite cylinder.
    Cylinder {
        /// A point on the axis.
        centre: [f64; 3],
        /// Axis direction.
        axis: [f64; 3],
        /// Radius.
        radius: f64,
    },
    /// Double cone.
    Cone {
        /// Apex.
        apex: [f64; 3],
        /// Axis direction.
        axis: [f64; 3],
        /// Half-angle in radians.
        half_angle: f64,
    },
    /// General quadric `[A, B, C, D, E, F, G, H, J, K]`.
    Quadric {
        /// Ten coefficients.
        coefficients: [f64; 10],
    },
}

fn point(v: [f64; 3]) -> Point3 {
    Point3::from(v)
}

fn vector(v: [f64; 3]) -> Vec3 {
    Vec3::from(v)
}

impl SurfaceDef {
    /// Validate the parameters and build the surface.
    pub fn build(&self) -> Result<Surface> {
        let kind: SurfaceKind = match self.shape {
            SurfaceShape::Plane { normal, distance } => Plane::new(vector(normal), distance)?.into(),
            SurfaceShape::Sphere { centre, radius } => Sphere::new(point(centre), radius)?.into(),
            SurfaceShape::Cylinder {
                centre,
                axis,
                radius,
            } => Cylinder::new(point(centre), vector(axis), radius)?.into(),
            SurfaceShape::Cone {
                apex,
                axis,
                half_angle,
            } => Cone::new(point(apex), vector(axis), half_angle)?.into(),
            SurfaceShape::Quadric { coefficients } => Quadric::new(coefficients).into(),
        };
        Ok(Surface::new(self.key, kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[derive(Deserialize)]
    struct File {
        surfaces: Vec<SurfaceDef>,
    }

    #[test]
    fn test_parse_all_kinds() {
        let text = r#"
            [[surfaces]]
            key = 1
            type = "plane"
            normal = [0.0, 0.0, 2.0]
            distance = 0.5

            [[surfaces]]
            key = 2
            type = "sphere"
            centre = [0.0, 0.0, 0.0]
            radius = 3.0

            [[surfaces]]
            key = 3
            type = "cylinder"
            centre = [1.0, 0.0, 0.0]
            axis = [0.0, 1.0, 0.0]
            radius = 0.5

            [[surfaces]]
            key = 4
            type = "cone"
            apex = [0.0, 0.0, 0.0]
            axis = [0.0, 0.0, 1.0]
            half_angle = 0.5

            [[surfaces]]
            key = 5
            type = "quadric"
            coefficients = [1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, -1.0]
        "#;
        let file: File = toml::from_str(text).unwrap();
        assert_eq!(file.surfaces.len(), 5);

        let surfaces: Vec<Surface> = file.surfaces.iter().map(|d| d.build().unwrap()).collect();
        assert_eq!(
            surfaces.iter().map(Surface::key).collect::<Vec<_>>(),
            vec![1, 2, 3, 4, 5]
        );
        match surfaces[0].kind() {
            SurfaceKind::Plane(p) => {
                assert_relative_eq!(p.normal.z, 1.0);
                assert_relative_eq!(p.distance, 0.5);
            }
            other => panic!("expected plane, got {other:?}"),
        }
        assert!(matches!(surfaces[4].kind(), SurfaceKind::Quadric(_)));
    }

    #[test]
    fn test_invalid_parameters_fail_to_build() {
        let def = SurfaceDef {
            key: 1,
            shape: SurfaceShape::Sphere {
                centre: [0.0; 3],
                radius: -1.0,
            },
        };
        assert!(def.build().is_err());
    }

    #[test]
    fn test_unknown_type_rejected() {
        let text = r#"
            [[surfaces]]
            key = 1
            type = "torus"
        "#;
        assert!(toml::from_str::<File>(text).is_err());
    }
}
