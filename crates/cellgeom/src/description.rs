//! Plain-data geometry descriptions.
//!
//! ```toml
//! [config]
//! bounding_box_limit = 1e6
//!
//! [[surfaces]]
//! key = 1
//! type = "sphere"
//! centre = [0.0, 0.0, 0.0]
//! radius = 2.0
//!
//! [[cells]]
//! id = 10
//! expression = "-1"
//! material = "V"
//! ```

use std::path::Path;

use cellgeom_math::GeometryConfig;
use cellgeom_surface::SurfaceDef;
use serde::{Deserialize, Serialize};

use crate::{GeometryError, Result};

/// One cell as written in a geometry file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellDef {
    /// Cell id; `#id` in other expressions refers to this cell.
    pub id: i32,
    /// Boolean expression over surface keys.
    pub expression: String,
    /// Material tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    /// Temperature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Density.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub density: Option<f64>,
}

/// Surfaces, cells and engine settings of a whole geometry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeometryDescription {
    /// Engine configuration; omitted keys take their defaults.
    #[serde(default)]
    pub config: GeometryConfig,
    /// Surface definitions.
    #[serde(default)]
    pub surfaces: Vec<SurfaceDef>,
    /// Cell definitions.
    #[serde(default)]
    pub cells: Vec<CellDef>,
}

impl GeometryDescription {
    /// Parse a TOML description.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Parse a JSON description.
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read a description file. `.json` files are parsed as JSON, anything
    /// else as TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(GeometryError::Io)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&text),
            _ => Self::from_toml_str(&text),
        }
    }
}
