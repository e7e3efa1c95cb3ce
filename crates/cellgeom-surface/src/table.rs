//! Keyed store of shared surfaces.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::{Result, Surface, SurfaceError};

/// Shared, immutable reference to a surface.
///
/// Cells hold handles, never copies: a surface may bound any number of cells.
pub type SurfaceHandle = Arc<Surface>;

/// All surfaces of a geometry, addressed by key.
///
/// Insertion order is preserved for iteration.
#[derive(Debug, Clone, Default)]
pub struct SurfaceTable {
    surfaces: Vec<SurfaceHandle>,
    index: HashMap<i32, usize>,
}

impl SurfaceTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a surface. Keys must be positive and unique.
    pub fn insert(&mut self, surface: Surface) -> Result<SurfaceHandle> {
        let key = surface.key();
        if key <= 0 {
            return Err(SurfaceError::InvalidKey(key));
        }
        if self.index.contains_key(&key) {
            return Err(SurfaceError::DuplicateKey(key));
        }
        let handle = Arc::new(surface);
        self.index.insert(key, self.surfaces.len());
        self.surfaces.push(Arc::clone(&handle));
        debug!(key, total = self.surfaces.len(), "surface registered");
        Ok(handle)
    }

    /// Replace the surface stored under `surface.key()`.
    ///
    /// Cells that already resolved the old handle keep it until they are
    /// populated again.
    pub fn replace(&mut self, surface: Surface) -> Result<SurfaceHandle> {
        let key = surface.key();
        let slot = *self.index.get(&key).ok_or(SurfaceError::NotFound(key))?;
        let handle = Arc::new(surface);
        self.surfaces[slot] = Arc::clone(&handle);
        debug!(key, "surface replaced");
        Ok(handle)
    }

    /// Surface for `key`, if present.
    pub fn get(&self, key: i32) -> Option<&SurfaceHandle> {
        self.index.get(&key).map(|&i| &self.surfaces[i])
    }

    /// Shared handle for `key`.
    pub fn resolve(&self, key: i32) -> Result<SurfaceHandle> {
        self.get(key)
            .cloned()
            .ok_or(SurfaceError::NotFound(key))
    }

    /// True if a surface with `key` exists.
    pub fn contains(&self, key: i32) -> bool {
        self.index.contains_key(&key)
    }

    /// Number of surfaces.
    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    /// True if the table holds no surfaces.
    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    /// Surfaces in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &SurfaceHandle> {
        self.surfaces.iter()
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = i32> + '_ {
        self.surfaces.iter().map(|s| s.key())
    }
}
