//! Objects indexed by id.

use std::collections::HashMap;

use cellgeom_surface::SurfaceTable;
use cellgeom_track::ObjectId;
use tracing::{debug, warn};

use crate::error::{CsgError, Result};
use crate::object::CsgObject;
use crate::rule::RuleTree;

/// All cells of a geometry, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct ObjectTable {
    objects: HashMap<ObjectId, CsgObject>,
}

impl ObjectTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object, replacing and returning any previous one with the same id.
    pub fn insert(&mut self, object: CsgObject) -> Option<CsgObject> {
        self.objects.insert(object.id(), object)
    }

    /// Object by id.
    pub fn get(&self, id: ObjectId) -> Option<&CsgObject> {
        self.objects.get(&id)
    }

    /// Mutable object by id.
    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut CsgObject> {
        self.objects.get_mut(&id)
    }

    /// True if an object with this id exists.
    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    /// Number of objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// True if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Ids in ascending order.
    pub fn ids(&self) -> Vec<ObjectId> {
        let mut ids: Vec<ObjectId> = self.objects.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Objects in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &CsgObject> + '_ {
        self.ids().into_iter().filter_map(|id| self.objects.get(&id))
    }

    /// Inline every `#N` reference of every object.
    ///
    /// All expansions are computed before any object changes, so the
    /// result does not depend on iteration order.
    pub fn resolve_complements(&mut self) -> Result<()> {
        let mut expanded = Vec::new();
        for object in self.iter() {
            if object.rule().object_complements().is_empty() {
                continue;
            }
            let tree = self.expand(object.rule(), &mut vec![object.id()])?;
            expanded.push((object.id(), tree));
        }
        for (id, tree) in expanded {
            if let Some(object) = self.objects.get_mut(&id) {
                object.replace_rule(tree);
                debug!(id, expression = %object.expression(), "complements inlined");
            }
        }
        Ok(())
    }

    /// Populate every object from `surfaces`.
    pub fn populate(&mut self, surfaces: &SurfaceTable) -> Result<()> {
        for id in self.ids() {
            if let Some(object) = self.objects.get_mut(&id) {
                object.populate(surfaces)?;
            }
        }
        Ok(())
    }

    /// Copy of `tree` with every `#N` replaced by the complement of object
    /// `N`'s rule, itself fully expanded. `visiting` holds the ids on the
    /// current expansion path.
    pub(crate) fn expand(&self, tree: &RuleTree, visiting: &mut Vec<ObjectId>) -> Result<RuleTree> {
        let mut out = tree.clone();
        for (at, id) in tree.object_complements() {
            if visiting.contains(&id) {
                warn!(id, path = ?visiting, "cyclic object complement");
                return Err(CsgError::CyclicComplement(id));
            }
            let Some(other) = self.get(id) else {
                warn!(id, "complemented object not found");
                return Err(CsgError::ObjectNotFound(id));
            };
            if other.rule().is_empty() {
                return Err(CsgError::Empty);
            }
            visiting.push(id);
            let inner = self.expand(other.rule(), visiting)?;
            visiting.pop();
            out.inline_complement(at, &inner);
        }
        out.compact();
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellgeom_math::{GeometryConfig, Point3};
    use cellgeom_surface::{Plane, Sphere, Surface};

    fn surfaces() -> SurfaceTable {
        let mut table = SurfaceTable::new();
        table
            .insert(Surface::new(1, Sphere::new(Point3::origin(), 1.0).unwrap()))
            .unwrap();
        table
            .insert(Surface::new(2, Sphere::new(Point3::origin(), 3.0).unwrap()))
            .unwrap();
        table.insert(Surface::new(3, Plane::pz(0.0))).unwrap();
        table
    }

    fn object(id: ObjectId, expr: &str) -> CsgObject {
        CsgObject::new(id, expr, GeometryConfig::default()).unwrap()
    }

    #[test]
    fn test_shell_from_complement() {
        let mut table = ObjectTable::new();
        table.insert(object(1, "-1"));
        table.insert(object(2, "-2 #1"));
        table.resolve_complements().unwrap();
        table.populate(&surfaces()).unwrap();

        let shell = table.get(2).unwrap();
        assert_eq!(shell.expression(), "-2 #(-1)");
        assert_eq!(shell.surface_keys(), &[1, 2]);
        assert!(!shell.is_valid(&Point3::origin()));
        assert!(shell.is_valid(&Point3::new(2.0, 0.0, 0.0)));
        assert!(!shell.is_valid(&Point3::new(4.0, 0.0, 0.0)));
    }

    #[test]
    fn test_nested_complements() {
        let mut table = ObjectTable::new();
        table.insert(object(1, "-1"));
        table.insert(object(2, "-2 #1"));
        table.insert(object(3, "3 #2"));
        table.resolve_complements().unwrap();
        assert_eq!(table.get(3).unwrap().expression(), "3 #(-2 #(-1))");
        assert!(table.get(3).unwrap().rule().object_complements().is_empty());
    }

    #[test]
    fn test_cycle_is_rejected() {
        let mut table = ObjectTable::new();
        table.insert(object(1, "-1 #2"));
        table.insert(object(2, "-2 #1"));
        assert!(matches!(
            table.resolve_complements(),
            Err(CsgError::CyclicComplement(_))
        ));

        let mut table = ObjectTable::new();
        table.insert(object(5, "-1 #5"));
        assert_eq!(table.resolve_complements(), Err(CsgError::CyclicComplement(5)));
    }

    #[test]
    fn test_missing_object() {
        let mut table = ObjectTable::new();
        table.insert(object(1, "-1 #7"));
        assert_eq!(table.resolve_complements(), Err(CsgError::ObjectNotFound(7)));
    }

    #[test]
    fn test_single_object_resolution() {
        let mut table = ObjectTable::new();
        table.insert(object(1, "-1"));
        let mut outer = object(2, "-2 #1");
        outer.populate(&surfaces()).unwrap();
        assert!(!outer.is_valid(&Point3::new(0.0, 2.0, 0.0)));
        outer.resolve_complements(&table).unwrap();
        assert!(!outer.is_populated());
        outer.populate(&surfaces()).unwrap();
        assert!(outer.is_valid(&Point3::new(0.0, 2.0, 0.0)));
    }

    #[test]
    fn test_iteration_order() {
        let mut table = ObjectTable::new();
        for id in [5, 1, 3] {
            table.insert(object(id, "1"));
        }
        assert_eq!(table.ids(), vec![1, 3, 5]);
        assert_eq!(table.len(), 3);
        assert!(table.contains(3));
        assert!(table.insert(object(3, "-1")).is_some());
    }
}
