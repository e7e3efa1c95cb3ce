//! CSG objects: a rule tree bound to shared surfaces.

use std::f64::consts::PI;
use std::sync::{Arc, OnceLock};

use cellgeom_math::{Aabb3, GeometryConfig, Point3, Vec3};
use cellgeom_surface::{SurfaceHandle, SurfaceTable};
use cellgeom_track::{ObjectId, Track, TrackDirection};
use tracing::{debug, trace, warn};

use crate::error::{CsgError, Result};
use crate::mesh::{MeshSource, TriangleMesh};
use crate::parse::parse;
use crate::rule::RuleTree;
use crate::solid_angle;
use crate::table::ObjectTable;

/// Axis-aligned bounds of an object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// The box.
    pub aabb: Aabb3,
    /// False if some face could not be pulled in from the configured
    /// limit, or if the object is empty.
    pub bounded: bool,
}

/// A cell: a boolean rule over signed surfaces plus the surfaces it uses.
///
/// Queries take `&self` and may run concurrently. The bounding box and mesh
/// are computed on first use; every `&mut self` mutator discards them.
#[derive(Debug, Clone)]
pub struct CsgObject {
    id: ObjectId,
    material: Option<String>,
    temperature: Option<f64>,
    density: Option<f64>,
    tree: RuleTree,
    keys: Vec<i32>,
    surfaces: Vec<SurfaceHandle>,
    populated: bool,
    config: GeometryConfig,
    defined_bbox: Option<BoundingBox>,
    bbox: OnceLock<BoundingBox>,
    mesh_source: Option<Arc<dyn MeshSource>>,
    mesh: OnceLock<Option<Arc<TriangleMesh>>>,
}

impl CsgObject {
    /// Parse `expression` into a new, unpopulated object.
    pub fn new(id: ObjectId, expression: &str, config: GeometryConfig) -> Result<Self> {
        Ok(Self::from_rule(id, parse(expression)?, config))
    }

    /// Wrap an existing rule tree.
    pub fn from_rule(id: ObjectId, mut tree: RuleTree, config: GeometryConfig) -> Self {
        let keys = tree.assign_slots();
        Self {
            id,
            material: None,
            temperature: None,
            density: None,
            tree,
            keys,
            surfaces: Vec::new(),
            populated: false,
            config,
            defined_bbox: None,
            bbox: OnceLock::new(),
            mesh_source: None,
            mesh: OnceLock::new(),
        }
    }

    /// Set the material tag.
    pub fn with_material(mut self, material: impl Into<String>) -> Self {
        self.material = Some(material.into());
        self
    }

    /// Set the temperature.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the density.
    pub fn with_density(mut self, density: f64) -> Self {
        self.density = Some(density);
        self
    }

    /// Object identifier.
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Material tag, if any.
    pub fn material(&self) -> Option<&str> {
        self.material.as_deref()
    }

    /// Temperature, if any.
    pub fn temperature(&self) -> Option<f64> {
        self.temperature
    }

    /// Density, if any.
    pub fn density(&self) -> Option<f64> {
        self.density
    }

    /// Configuration the object was built with.
    pub fn config(&self) -> &GeometryConfig {
        &self.config
    }

    /// The rule tree.
    pub fn rule(&self) -> &RuleTree {
        &self.tree
    }

    /// Canonical text of the rule.
    pub fn expression(&self) -> String {
        self.tree.to_string()
    }

    /// Distinct surface keys the rule refers to, ascending.
    pub fn surface_keys(&self) -> &[i32] {
        &self.keys
    }

    /// Resolved surfaces, in the order of [`Self::surface_keys`]. Empty
    /// until populated.
    pub fn surface_list(&self) -> &[SurfaceHandle] {
        &self.surfaces
    }

    /// True if the rule contains a complement.
    pub fn has_complement(&self) -> bool {
        self.tree.has_complement()
    }

    /// True once every surface key has been resolved.
    pub fn is_populated(&self) -> bool {
        self.populated
    }

    /// Resolve every surface key against `table`.
    pub fn populate(&mut self, table: &SurfaceTable) -> Result<()> {
        let surfaces = self
            .keys
            .iter()
            .map(|&key| table.resolve(key).map_err(|_| CsgError::SurfaceNotFound(key)))
            .collect::<Result<Vec<_>>>()?;
        self.surfaces = surfaces;
        self.populated = true;
        self.invalidate();
        debug!(id = self.id, surfaces = self.surfaces.len(), "object populated");
        Ok(())
    }

    /// Inline every `#N` of the rule as the complement of object `N`'s rule.
    ///
    /// References are followed recursively; a chain that leads back to an
    /// object already being expanded is an error. The object must be
    /// populated again afterwards if new surfaces were brought in.
    pub fn resolve_complements(&mut self, objects: &ObjectTable) -> Result<()> {
        if self.tree.object_complements().is_empty() {
            return Ok(());
        }
        let tree = objects.expand(&self.tree, &mut vec![self.id])?;
        self.replace_rule(tree);
        Ok(())
    }

    pub(crate) fn replace_rule(&mut self, tree: RuleTree) {
        self.tree = tree;
        self.keys = self.tree.assign_slots();
        self.rebuild_surfaces(None);
        self.invalidate();
    }

    /// Replace surface `old_key` by `surface` in every leaf. With
    /// `flip_sign` the leaves select the opposite side. Returns the number
    /// of leaves changed.
    pub fn substitute_surface(&mut self, old_key: i32, surface: SurfaceHandle, flip_sign: bool) -> usize {
        let changed = self.tree.substitute_key(old_key, surface.key(), flip_sign);
        if changed > 0 {
            self.keys = self.tree.assign_slots();
            self.rebuild_surfaces(Some(&surface));
            self.invalidate();
            debug!(id = self.id, old_key, new_key = surface.key(), changed, "surface substituted");
        }
        changed
    }

    /// Remove every leaf that refers to `key`; see [`RuleTree::remove_key`].
    pub fn remove_surface(&mut self, key: i32) -> usize {
        let removed = self.tree.remove_key(key);
        if removed > 0 {
            self.keys = self.tree.assign_slots();
            self.rebuild_surfaces(None);
            self.invalidate();
            debug!(id = self.id, key, removed, "surface removed");
        }
        removed
    }

    /// Turn the object into its own complement.
    pub fn make_complement(&mut self) {
        self.tree.make_complement();
        self.invalidate();
    }

    /// Fix the bounding box instead of deriving it from the surfaces. Any
    /// later change to the rule or the surfaces drops it again.
    pub fn define_bounding_box(&mut self, min: Point3, max: Point3) -> Result<()> {
        for (i, axis) in ['x', 'y', 'z'].into_iter().enumerate() {
            if !(max[i] >= min[i]) {
                return Err(CsgError::InvalidBoundingBox {
                    axis,
                    min: min[i],
                    max: max[i],
                });
            }
        }
        self.defined_bbox = Some(BoundingBox {
            aabb: Aabb3::new(min, max),
            bounded: true,
        });
        Ok(())
    }

    /// Use `mesh` for the triangulated solid angle until the geometry changes.
    pub fn set_mesh(&mut self, mesh: TriangleMesh) {
        self.mesh = OnceLock::from(Some(Arc::new(mesh)));
    }

    /// Triangulate on demand with `source`.
    pub fn set_mesh_source(&mut self, source: impl MeshSource + 'static) {
        self.mesh_source = Some(Arc::new(source));
        self.mesh = OnceLock::new();
    }

    /// The mesh, triangulating on first use.
    pub fn mesh(&self) -> Option<Arc<TriangleMesh>> {
        self.mesh
            .get_or_init(|| {
                let mesh = self.mesh_source.as_ref()?.triangulate()?;
                debug!(id = self.id, triangles = mesh.num_triangles(), "object triangulated");
                Some(Arc::new(mesh))
            })
            .clone()
    }

    fn invalidate(&mut self) {
        self.defined_bbox = None;
        self.bbox = OnceLock::new();
        self.mesh = OnceLock::new();
    }

    /// Rebuild the surface list to follow `keys`, reusing the handles
    /// already held and taking `extra` for its own key.
    fn rebuild_surfaces(&mut self, extra: Option<&SurfaceHandle>) {
        let old = std::mem::take(&mut self.surfaces);
        self.surfaces = self
            .keys
            .iter()
            .filter_map(|&key| {
                extra
                    .filter(|s| s.key() == key)
                    .or_else(|| old.iter().find(|s| s.key() == key))
                    .cloned()
            })
            .collect();
        self.populated = self.surfaces.len() == self.keys.len() && (self.populated || extra.is_some());
    }

    /// True if `point` is inside or on the boundary.
    pub fn is_valid(&self, point: &Point3) -> bool {
        self.populated && self.tree.is_valid(point, &self.surfaces, &self.config.tolerance)
    }

    /// True if `point` lies on the object's boundary.
    ///
    /// Each surface through the point contributes its normal, and each pair
    /// of them their bisector. The point is on the boundary if, along some
    /// candidate, exactly one of two short probes lands outside. Points
    /// where three or more surfaces meet may be missed.
    pub fn is_on_side(&self, point: &Point3) -> bool {
        if !self.populated {
            return false;
        }
        let tol = &self.config.tolerance;
        let mut normals: Vec<Vec3> = Vec::new();
        for surface in &self.surfaces {
            if surface.on_surface(point, tol) {
                let normal = surface.normal_at(point);
                if self.straddles(point, &normal) {
                    return true;
                }
                normals.push(normal);
            }
        }
        for (i, a) in normals.iter().enumerate() {
            for b in &normals[i + 1..] {
                if let Some(bisector) = (a + b).try_normalize(f64::EPSILON) {
                    if self.straddles(point, &bisector) {
                        return true;
                    }
                }
            }
        }
        false
    }

    fn straddles(&self, point: &Point3, normal: &Vec3) -> bool {
        let offset = normal * self.config.on_side_offset();
        self.is_valid(&(point + offset)) != self.is_valid(&(point - offset))
    }

    /// Add this object's forward crossings to `track`, pair them into links
    /// and return the number of links added.
    pub fn intercept_surface(&self, track: &mut Track) -> usize {
        if !self.populated {
            return 0;
        }
        let before = track.count();
        let origin = *track.start_point();
        let direction = *track.direction();
        let tol = self.config.tolerance;

        let mut distances: Vec<f64> = self
            .surfaces
            .iter()
            .flat_map(|s| s.distance_along(&origin, &direction))
            .filter(|&t| t > 0.0)
            .collect();
        distances.sort_by(f64::total_cmp);
        distances.dedup_by(|later, earlier| (*later - *earlier).abs() < tol.linear);

        let shift = direction * self.config.crossing_offset();
        let mut last: Option<(TrackDirection, f64)> = None;
        for t in distances {
            let point = origin + t * direction;
            let behind = self.is_valid(&(point - shift));
            let ahead = self.is_valid(&(point + shift));
            let crossing = match (behind, ahead) {
                (false, true) => TrackDirection::Entering,
                (true, false) => TrackDirection::Leaving,
                _ => {
                    trace!(id = self.id, t, "crossing rejected");
                    continue;
                }
            };
            track.add_point(crossing, point, self.id);
            last = Some((crossing, t));
        }

        // A ray still inside after its last crossing leaves at the limit.
        let still_inside = match last {
            Some((crossing, _)) => crossing == TrackDirection::Entering,
            None => self.is_valid(&origin),
        };
        let limit = self.config.bounding_box_limit;
        let reached = last.map_or(0.0, |(_, t)| t);
        if still_inside && direction.norm() > 0.0 && limit > reached {
            let far = origin + limit * direction;
            if self.is_valid(&far) {
                track.add_point(TrackDirection::Leaving, far, self.id);
            }
        }
        track.build_link(&tol);
        track.count().saturating_sub(before)
    }

    /// Bounds of the object, computed once.
    pub fn bounding_box(&self) -> BoundingBox {
        if let Some(defined) = self.defined_bbox {
            return defined;
        }
        *self.bbox.get_or_init(|| self.compute_bounding_box())
    }

    fn compute_bounding_box(&self) -> BoundingBox {
        let limit = self.config.bounding_box_limit;
        let mut aabb = Aabb3::infinite(limit);
        if !self.populated || self.tree.is_empty() {
            return BoundingBox {
                aabb,
                bounded: false,
            };
        }
        self.tree.bound(&mut aabb, &self.surfaces, &self.config.tolerance);
        if aabb.is_empty() {
            warn!(id = self.id, "bounding box is empty");
            return BoundingBox {
                aabb,
                bounded: false,
            };
        }
        let bounded = !aabb.touches_limit(limit);
        if bounded {
            debug!(id = self.id, min = ?aabb.min, max = ?aabb.max, "bounding box computed");
        } else {
            warn!(id = self.id, "bounding box could not be tightened");
        }
        BoundingBox { aabb, bounded }
    }

    /// Some point inside the object.
    ///
    /// The origin and the bounding-box centre are tried as they are. Failing
    /// both, the six axis directions are probed from each seed in turn and
    /// the first entry point is taken.
    pub fn point_in_object(&self) -> Option<Point3> {
        let bbox = self.bounding_box();
        let centre = bbox.bounded.then(|| bbox.aabb.centre());
        let seeds: Vec<Point3> = std::iter::once(Point3::origin()).chain(centre).collect();

        if let Some(seed) = seeds.iter().find(|p| self.is_valid(p)) {
            return Some(*seed);
        }
        let found = seeds.iter().find_map(|seed| self.probe_axes(seed));
        if found.is_none() {
            warn!(id = self.id, "no point found inside object");
        }
        found
    }

    fn probe_axes(&self, seed: &Point3) -> Option<Point3> {
        let directions = [
            Vec3::x(),
            -Vec3::x(),
            Vec3::y(),
            -Vec3::y(),
            Vec3::z(),
            -Vec3::z(),
        ];
        directions.into_iter().find_map(|dir| {
            let mut track = Track::new(*seed, dir);
            if self.intercept_surface(&mut track) == 0 {
                return None;
            }
            track.front().map(|link| link.entry)
        })
    }

    /// Solid angle subtended by the object at `observer`, in steradians.
    ///
    /// `4π` from inside, `2π` from the boundary. Otherwise a single sphere
    /// uses the exact cap formula, a small enough mesh is summed triangle
    /// by triangle, and everything else is integrated by ray tracing.
    pub fn solid_angle(&self, observer: &Point3) -> f64 {
        if !self.populated || self.tree.is_empty() {
            return 0.0;
        }
        if self.is_valid(observer) {
            return if self.is_on_side(observer) { 2.0 * PI } else { 4.0 * PI };
        }
        if let Some(omega) = solid_angle::single_sphere(self, observer) {
            return omega;
        }
        if let Some(mesh) = self.mesh() {
            let triangles = mesh.num_triangles();
            if triangles > 0 && triangles <= self.config.solid_angle.max_triangles {
                debug!(id = self.id, triangles, "triangulated solid angle");
                return solid_angle::mesh_solid_angle(&mesh, observer);
            }
        }
        debug!(id = self.id, "ray-traced solid angle");
        solid_angle::ray_trace(self, observer)
    }
}
