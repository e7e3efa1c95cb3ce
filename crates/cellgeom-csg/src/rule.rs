//! Boolean rule trees over signed surface references.
//!
//! Nodes live in a flat arena and refer to their children by [`NodeId`].
//! A tree is owned by exactly one object; copying a rule (for example to
//! inline an object complement) copies the nodes.

use std::fmt;

use cellgeom_math::{Aabb3, Point3, Tolerance};
use cellgeom_surface::SurfaceHandle;
use cellgeom_track::ObjectId;

/// Index of a node inside its [`RuleTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in the arena.
    pub fn index(self) -> usize {
        self.0
    }
}

/// One node of a rule tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RuleNode {
    /// Half-space of a surface. `key > 0`; `sign` is `+1` or `-1`; `slot`
    /// indexes the owning object's surface list.
    Surface {
        /// Surface key.
        key: i32,
        /// Side selected: `+1` positive, `-1` negative.
        sign: i32,
        /// Position of the surface in the object's surface list.
        slot: usize,
    },
    /// Both children hold.
    Intersection(NodeId, NodeId),
    /// Either child holds.
    Union(NodeId, NodeId),
    /// The child does not hold.
    Complement(NodeId),
    /// Complement of another object's rule, not yet inlined.
    ObjectComplement(ObjectId),
}

/// A boolean combination of half-spaces.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleTree {
    nodes: Vec<RuleNode>,
    root: Option<NodeId>,
}

impl RuleTree {
    /// Create an empty tree. An empty tree contains no point.
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, node: RuleNode) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    /// Add a surface leaf. A negative `signed_key` selects the negative side.
    pub fn leaf(&mut self, signed_key: i32) -> NodeId {
        self.push(RuleNode::Surface {
            key: signed_key.abs(),
            sign: if signed_key < 0 { -1 } else { 1 },
            slot: 0,
        })
    }

    /// Add an intersection node.
    pub fn intersection(&mut self, left: NodeId, right: NodeId) -> NodeId {
        self.push(RuleNode::Intersection(left, right))
    }

    /// Add a union node.
    pub fn union(&mut self, left: NodeId, right: NodeId) -> NodeId {
        self.push(RuleNode::Union(left, right))
    }

    /// Add a complement node.
    pub fn complement(&mut self, child: NodeId) -> NodeId {
        self.push(RuleNode::Complement(child))
    }

    /// Add an unresolved `#N` node.
    pub fn object_complement(&mut self, id: ObjectId) -> NodeId {
        self.push(RuleNode::ObjectComplement(id))
    }

    /// Make `id` the root.
    pub fn set_root(&mut self, id: NodeId) {
        self.root = Some(id);
    }

    /// Root node, if any.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Node by id.
    pub fn node(&self, id: NodeId) -> &RuleNode {
        &self.nodes[id.0]
    }

    /// True if the tree has no root.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Number of nodes in the arena, reachable or not.
    pub fn arena_len(&self) -> usize {
        self.nodes.len()
    }

    /// Ids reachable from the root, parents before children.
    pub fn reachable(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.root.into_iter().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            match self.nodes[id.0] {
                RuleNode::Intersection(l, r) | RuleNode::Union(l, r) => {
                    stack.push(r);
                    stack.push(l);
                }
                RuleNode::Complement(c) => stack.push(c),
                RuleNode::Surface { .. } | RuleNode::ObjectComplement(_) => {}
            }
        }
        out
    }

    /// True if `point` satisfies the rule. Leaves accept points on their
    /// surface; an empty tree or an unresolved `#N` accepts nothing.
    pub fn is_valid(&self, point: &Point3, surfaces: &[SurfaceHandle], tol: &Tolerance) -> bool {
        self.root
            .is_some_and(|root| self.valid_at(root, point, surfaces, tol))
    }

    fn valid_at(
        &self,
        id: NodeId,
        point: &Point3,
        surfaces: &[SurfaceHandle],
        tol: &Tolerance,
    ) -> bool {
        match self.nodes[id.0] {
            RuleNode::Surface { sign, slot, .. } => surfaces
                .get(slot)
                .is_some_and(|s| s.side_of(point, tol) * sign >= 0),
            RuleNode::Intersection(l, r) => {
                self.valid_at(l, point, surfaces, tol) && self.valid_at(r, point, surfaces, tol)
            }
            RuleNode::Union(l, r) => {
                self.valid_at(l, point, surfaces, tol) || self.valid_at(r, point, surfaces, tol)
            }
            RuleNode::Complement(c) => !self.valid_at(c, point, surfaces, tol),
            RuleNode::ObjectComplement(_) => false,
        }
    }

    /// Tighten `aabb` to the region the rule can occupy.
    ///
    /// Intersections narrow sequentially, unions take the hull of both
    /// children and complements leave the box untouched.
    pub fn bound(&self, aabb: &mut Aabb3, surfaces: &[SurfaceHandle], tol: &Tolerance) {
        if let Some(root) = self.root {
            self.bound_at(root, aabb, surfaces, tol);
        }
    }

    fn bound_at(&self, id: NodeId, aabb: &mut Aabb3, surfaces: &[SurfaceHandle], tol: &Tolerance) {
        match self.nodes[id.0] {
            RuleNode::Surface { sign, slot, .. } => {
                if let Some(surface) = surfaces.get(slot) {
                    surface.bound(sign, aabb, tol);
                }
            }
            RuleNode::Intersection(l, r) => {
                self.bound_at(l, aabb, surfaces, tol);
                self.bound_at(r, aabb, surfaces, tol);
            }
            RuleNode::Union(l, r) => {
                let mut left = *aabb;
                let mut right = *aabb;
                self.bound_at(l, &mut left, surfaces, tol);
                self.bound_at(r, &mut right, surfaces, tol);
                *aabb = left.hull(&right);
            }
            RuleNode::Complement(_) | RuleNode::ObjectComplement(_) => {}
        }
    }

    /// Distinct surface keys, ascending.
    pub fn surface_keys(&self) -> Vec<i32> {
        let mut keys: Vec<i32> = self
            .reachable()
            .into_iter()
            .filter_map(|id| match self.nodes[id.0] {
                RuleNode::Surface { key, .. } => Some(key),
                _ => None,
            })
            .collect();
        keys.sort_unstable();
        keys.dedup();
        keys
    }

    /// Point every leaf at its key's position in [`Self::surface_keys`] and
    /// return those keys.
    pub fn assign_slots(&mut self) -> Vec<i32> {
        let keys = self.surface_keys();
        for id in self.reachable() {
            if let RuleNode::Surface { key, slot, .. } = &mut self.nodes[id.0] {
                if let Ok(i) = keys.binary_search(key) {
                    *slot = i;
                }
            }
        }
        keys
    }

    /// True if the rule contains a complement of either kind.
    pub fn has_complement(&self) -> bool {
        self.reachable().into_iter().any(|id| {
            matches!(
                self.nodes[id.0],
                RuleNode::Complement(_) | RuleNode::ObjectComplement(_)
            )
        })
    }

    /// Unresolved `#N` nodes.
    pub fn object_complements(&self) -> Vec<(NodeId, ObjectId)> {
        self.reachable()
            .into_iter()
            .filter_map(|id| match self.nodes[id.0] {
                RuleNode::ObjectComplement(obj) => Some((id, obj)),
                _ => None,
            })
            .collect()
    }

    /// The single leaf of a one-leaf rule.
    pub fn single_leaf(&self) -> Option<RuleNode> {
        let root = self.root?;
        match self.nodes[root.0] {
            leaf @ RuleNode::Surface { .. } => Some(leaf),
            _ => None,
        }
    }

    /// Replace the `#N` node `at` by the complement of a copy of `other`.
    /// Returns false, leaving the tree alone, if `other` is empty or `at`
    /// is not an object complement.
    pub fn inline_complement(&mut self, at: NodeId, other: &RuleTree) -> bool {
        let Some(other_root) = other.root else {
            return false;
        };
        if !matches!(self.nodes.get(at.0), Some(RuleNode::ObjectComplement(_))) {
            return false;
        }
        let copied = other.copy_into(other_root, &mut self.nodes);
        self.nodes[at.0] = RuleNode::Complement(copied);
        true
    }

    /// Rename surface `old` to `new` in every leaf, optionally swapping the
    /// side. Returns the number of leaves changed.
    pub fn substitute_key(&mut self, old: i32, new: i32, flip_sign: bool) -> usize {
        let mut changed = 0;
        for id in self.reachable() {
            if let RuleNode::Surface { key, sign, .. } = &mut self.nodes[id.0] {
                if *key == old {
                    *key = new;
                    if flip_sign {
                        *sign = -*sign;
                    }
                    changed += 1;
                }
            }
        }
        changed
    }

    /// Remove every leaf of surface `key`. The binary node above a removed
    /// leaf collapses onto the other child; a complement whose operand
    /// disappears goes with it. Returns the number of leaves removed.
    pub fn remove_key(&mut self, key: i32) -> usize {
        let Some(root) = self.root else {
            return 0;
        };
        let mut removed = 0;
        self.root = self.prune(root, key, &mut removed);
        if removed > 0 {
            self.compact();
        }
        removed
    }

    fn prune(&mut self, id: NodeId, key: i32, removed: &mut usize) -> Option<NodeId> {
        match self.nodes[id.0] {
            RuleNode::Surface { key: k, .. } if k == key => {
                *removed += 1;
                None
            }
            RuleNode::Surface { .. } | RuleNode::ObjectComplement(_) => Some(id),
            RuleNode::Intersection(l, r) | RuleNode::Union(l, r) => {
                let left = self.prune(l, key, removed);
                let right = self.prune(r, key, removed);
                match (left, right) {
                    (Some(a), Some(b)) => {
                        self.nodes[id.0] = match self.nodes[id.0] {
                            RuleNode::Union(..) => RuleNode::Union(a, b),
                            _ => RuleNode::Intersection(a, b),
                        };
                        Some(id)
                    }
                    (Some(a), None) | (None, Some(a)) => Some(a),
                    (None, None) => None,
                }
            }
            RuleNode::Complement(c) => {
                let child = self.prune(c, key, removed)?;
                self.nodes[id.0] = RuleNode::Complement(child);
                Some(id)
            }
        }
    }

    /// Wrap the whole rule in a complement.
    pub fn make_complement(&mut self) {
        if let Some(root) = self.root {
            let c = self.complement(root);
            self.root = Some(c);
        }
    }

    /// Drop nodes that are no longer reachable from the root.
    pub fn compact(&mut self) {
        let mut nodes = Vec::new();
        self.root = self.root.map(|root| self.copy_into(root, &mut nodes));
        self.nodes = nodes;
    }

    /// Copy the subtree at `id` to the end of `out`, children first.
    fn copy_into(&self, id: NodeId, out: &mut Vec<RuleNode>) -> NodeId {
        let node = match self.nodes[id.0] {
            RuleNode::Intersection(l, r) => {
                let l = self.copy_into(l, out);
                let r = self.copy_into(r, out);
                RuleNode::Intersection(l, r)
            }
            RuleNode::Union(l, r) => {
                let l = self.copy_into(l, out);
                let r = self.copy_into(r, out);
                RuleNode::Union(l, r)
            }
            RuleNode::Complement(c) => RuleNode::Complement(self.copy_into(c, out)),
            leaf => leaf,
        };
        out.push(node);
        NodeId(out.len() - 1)
    }

    fn fmt_node(&self, id: NodeId, f: &mut fmt::Formatter<'_>, in_intersection: bool) -> fmt::Result {
        match self.nodes[id.0] {
            RuleNode::Surface { key, sign, .. } => write!(f, "{}", key * sign),
            RuleNode::ObjectComplement(obj) => write!(f, "#{obj}"),
            RuleNode::Complement(c) => {
                f.write_str("#(")?;
                self.fmt_node(c, f, false)?;
                f.write_str(")")
            }
            RuleNode::Intersection(l, r) => {
                self.fmt_node(l, f, true)?;
                f.write_str(" ")?;
                self.fmt_node(r, f, true)
            }
            RuleNode::Union(l, r) => {
                if in_intersection {
                    f.write_str("(")?;
                }
                self.fmt_node(l, f, false)?;
                f.write_str(" : ")?;
                self.fmt_node(r, f, false)?;
                if in_intersection {
                    f.write_str(")")?;
                }
                Ok(())
            }
        }
    }
}

/// Canonical expression text, e.g. `1 -2 : #(3 4)`.
impl fmt::Display for RuleTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.root {
            Some(root) => self.fmt_node(root, f, false),
            None => Ok(()),
        }
    }
}
