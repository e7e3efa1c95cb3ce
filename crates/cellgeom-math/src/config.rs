//! Engine configuration.
//!
//! All tuning knobs of the engine live here so that callers (and tests)
//! can vary them per object instead of through process-wide state. The
//! defaults reproduce the magnitudes the engine was tuned with.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Tolerance;

/// Errors raised while loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration text is not valid TOML for [`GeometryConfig`].
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of its admissible range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Resolution knobs of the solid-angle estimators.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolidAngleConfig {
    /// θ steps when a usable bounding box restricts the domain.
    pub resolution_bounded: u32,
    /// θ steps when no usable bounding box exists.
    pub resolution_unbounded: u32,
    /// Minimum number of φ steps per θ row.
    pub min_phi_steps: u32,
    /// Largest mesh for which the triangulated estimator is used.
    pub max_triangles: usize,
    /// Integrate θ rows on the rayon thread pool.
    pub parallel: bool,
}

impl Default for SolidAngleConfig {
    fn default() -> Self {
        Self {
            resolution_bounded: 100,
            resolution_unbounded: 200,
            min_phi_steps: 10,
            max_triangles: 30_000,
            parallel: true,
        }
    }
}

/// Configuration carried by every CSG object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    /// Geometric tolerance.
    pub tolerance: Tolerance,
    /// Probe offset of the on-side test, in multiples of the tolerance.
    pub on_side_probe: f64,
    /// Probe offset of the entry/exit classifier, in multiples of the tolerance.
    pub crossing_probe: f64,
    /// Half-width of the initial bounding box; faces still at this value
    /// after tightening mean the shape has no proper bound.
    pub bounding_box_limit: f64,
    /// Solid-angle estimator settings.
    pub solid_angle: SolidAngleConfig,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            tolerance: Tolerance::DEFAULT,
            on_side_probe: 5.0,
            crossing_probe: 25.0,
            bounding_box_limit: 1e10,
            solid_angle: SolidAngleConfig::default(),
        }
    }
}

impl GeometryConfig {
    /// Default configuration with a different linear tolerance.
    pub fn with_tolerance(linear: f64) -> Self {
        Self {
            tolerance: Tolerance::linear(linear),
            ..Self::default()
        }
    }

    /// Parse a configuration from TOML text. Missing keys take defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: GeometryConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Absolute offset used by the on-side probes.
    pub fn on_side_offset(&self) -> f64 {
        self.on_side_probe * self.tolerance.linear
    }

    /// Absolute offset used by the entry/exit classifier.
    pub fn crossing_offset(&self) -> f64 {
        self.crossing_probe * self.tolerance.linear
    }

    /// Check that every value is in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.tolerance.linear > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "linear tolerance must be positive, got {}",
                self.tolerance.linear
            )));
        }
        if !(self.on_side_probe > 0.0) || !(self.crossing_probe > 0.0) {
            return Err(ConfigError::Invalid(
                "probe multipliers must be positive".into(),
            ));
        }
        if !(self.bounding_box_limit > 0.0) {
            return Err(ConfigError::Invalid(
                "bounding box limit must be positive".into(),
            ));
        }
        let sa = &self.solid_angle;
        if sa.resolution_bounded == 0 || sa.resolution_unbounded == 0 || sa.min_phi_steps == 0 {
            return Err(ConfigError::Invalid(
                "solid angle resolutions must be non-zero".into(),
            ));
        }
        Ok(())
    }
}
