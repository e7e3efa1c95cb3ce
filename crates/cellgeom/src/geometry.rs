//! A complete geometry: shared surfaces plus the cells built on them.

use std::path::Path;

use cellgeom_csg::{CsgObject, ObjectTable};
use cellgeom_math::{GeometryConfig, Point3};
use cellgeom_surface::SurfaceTable;
use cellgeom_track::{ObjectId, Track};
use tracing::debug;

use crate::description::GeometryDescription;
use crate::{GeometryError, Result};

/// Surfaces and populated cells, ready for queries.
#[derive(Debug, Clone)]
pub struct Geometry {
    config: GeometryConfig,
    surfaces: SurfaceTable,
    cells: ObjectTable,
}

impl Geometry {
    /// Build every surface and cell of `description`, inline `#N`
    /// complements and populate the cells.
    pub fn from_description(description: GeometryDescription) -> Result<Self> {
        let config = description.config;
        config.validate()?;

        let mut surfaces = SurfaceTable::new();
        for def in &description.surfaces {
            surfaces.insert(def.build()?)?;
        }

        let mut cells = ObjectTable::new();
        for def in description.cells {
            if cells.contains(def.id) {
                return Err(GeometryError::DuplicateCell(def.id));
            }
            let mut cell = CsgObject::new(def.id, &def.expression, config)
                .map_err(|source| GeometryError::Cell { id: def.id, source })?;
            if let Some(material) = def.material {
                cell = cell.with_material(material);
            }
            if let Some(temperature) = def.temperature {
                cell = cell.with_temperature(temperature);
            }
            if let Some(density) = def.density {
                cell = cell.with_density(density);
            }
            cells.insert(cell);
        }

        cells.resolve_complements()?;
        for id in cells.ids() {
            if let Some(cell) = cells.get_mut(id) {
                cell.populate(&surfaces)
                    .map_err(|source| GeometryError::Cell { id, source })?;
            }
        }
        debug!(
            surfaces = surfaces.len(),
            cells = cells.len(),
            "geometry built"
        );
        Ok(Self {
            config,
            surfaces,
            cells,
        })
    }

    /// Parse and build a TOML description.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Self::from_description(GeometryDescription::from_toml_str(text)?)
    }

    /// Parse and build a JSON description.
    pub fn from_json_str(text: &str) -> Result<Self> {
        Self::from_description(GeometryDescription::from_json_str(text)?)
    }

    /// Read and build a description file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_description(GeometryDescription::load(path)?)
    }

    /// Configuration shared by every cell.
    pub fn config(&self) -> &GeometryConfig {
        &self.config
    }

    /// The surface table.
    pub fn surfaces(&self) -> &SurfaceTable {
        &self.surfaces
    }

    /// The cells.
    pub fn cells(&self) -> &ObjectTable {
        &self.cells
    }

    /// Cell by id.
    pub fn cell(&self, id: ObjectId) -> Option<&CsgObject> {
        self.cells.get(id)
    }

    /// Mutable cell by id.
    pub fn cell_mut(&mut self, id: ObjectId) -> Option<&mut CsgObject> {
        self.cells.get_mut(id)
    }

    /// Lowest-id cell containing `point`, boundary included.
    pub fn find_cell(&self, point: &Point3) -> Option<ObjectId> {
        self.cells
            .iter()
            .find(|cell| cell.is_valid(point))
            .map(CsgObject::id)
    }

    /// Intercept `track` with every cell. Returns the number of links added.
    pub fn trace(&self, track: &mut Track) -> usize {
        self.cells
            .iter()
            .map(|cell| cell.intercept_surface(track))
            .sum()
    }

    /// Solid angle of cell `id` seen from `observer`.
    pub fn solid_angle(&self, id: ObjectId, observer: &Point3) -> Result<f64> {
        self.cell(id)
            .map(|cell| cell.solid_angle(observer))
            .ok_or(GeometryError::CellNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellgeom_csg::CsgError;
    use cellgeom_math::Vec3;
    use cellgeom_surface::SurfaceError;

    const NESTED: &str = r#"
        [[surfaces]]
        key = 1
        type = "sphere"
        centre = [0.0, 0.0, 0.0]
        radius = 1.0

        [[surfaces]]
        key = 2
        type = "sphere"
        centre = [0.0, 0.0, 0.0]
        radius = 2.0

        [[cells]]
        id = 1
        expression = "-1"
        material = "Pb"

        [[cells]]
        id = 2
        expression = "-2 #1"
        material = "Al"
        temperature = 10.0
    "#;

    #[test]
    fn test_find_cell() {
        let geometry = Geometry::from_toml_str(NESTED).unwrap();
        assert_eq!(geometry.find_cell(&Point3::origin()), Some(1));
        assert_eq!(geometry.find_cell(&Point3::new(1.5, 0.0, 0.0)), Some(2));
        assert_eq!(geometry.find_cell(&Point3::new(3.0, 0.0, 0.0)), None);
        assert_eq!(geometry.cell(2).unwrap().temperature(), Some(10.0));
        assert_eq!(geometry.cell(1).unwrap().material(), Some("Pb"));
    }

    #[test]
    fn test_trace_through_nested_cells() {
        let geometry = Geometry::from_toml_str(NESTED).unwrap();
        let mut track = Track::new(Point3::new(-5.0, 0.0, 0.0), Vec3::x());
        assert_eq!(geometry.trace(&mut track), 3);

        let objects: Vec<ObjectId> = track.iter().map(|l| l.object).collect();
        assert_eq!(objects, vec![2, 1, 2]);
        assert!((track.total_distance_inside() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_solid_angle_lookup() {
        let geometry = Geometry::from_toml_str(NESTED).unwrap();
        let omega = geometry.solid_angle(1, &Point3::new(0.0, 0.0, 2.0)).unwrap();
        assert!((omega - 2.0 * std::f64::consts::PI * (1.0 - 0.75_f64.sqrt())).abs() < 1e-12);
        assert!(matches!(
            geometry.solid_angle(9, &Point3::origin()),
            Err(GeometryError::CellNotFound(9))
        ));
    }

    #[test]
    fn test_build_errors() {
        let missing_surface = r#"
            [[cells]]
            id = 4
            expression = "-1"
        "#;
        assert!(matches!(
            Geometry::from_toml_str(missing_surface),
            Err(GeometryError::Cell {
                id: 4,
                source: CsgError::SurfaceNotFound(1)
            })
        ));

        let bad_expression = r#"
            [[cells]]
            id = 4
            expression = "(1"
        "#;
        assert!(matches!(
            Geometry::from_toml_str(bad_expression),
            Err(GeometryError::Cell { id: 4, .. })
        ));

        let duplicate_surface = r#"
            [[surfaces]]
            key = 1
            type = "sphere"
            centre = [0.0, 0.0, 0.0]
            radius = 1.0

            [[surfaces]]
            key = 1
            type = "sphere"
            centre = [0.0, 0.0, 0.0]
            radius = 2.0
        "#;
        assert!(matches!(
            Geometry::from_toml_str(duplicate_surface),
            Err(GeometryError::Surface(SurfaceError::DuplicateKey(1)))
        ));

        let duplicate_cell = r#"
            [[cells]]
            id = 4
            expression = "1"

            [[cells]]
            id = 4
            expression = "2"
        "#;
        assert!(matches!(
            Geometry::from_toml_str(duplicate_cell),
            Err(GeometryError::DuplicateCell(4))
        ));

        let cycle = r##"
            [[cells]]
            id = 1
            expression = "#2"

            [[cells]]
            id = 2
            expression = "#1"
        "##;
        assert!(matches!(
            Geometry::from_toml_str(cycle),
            Err(GeometryError::Csg(CsgError::CyclicComplement(_)))
        ));

        let bad_config = "[config.tolerance]\nlinear = -1.0\n";
        assert!(matches!(
            Geometry::from_toml_str(bad_config),
            Err(GeometryError::Config(_))
        ));
    }
}
