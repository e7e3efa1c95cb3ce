//! Triangle meshes used by the triangulated solid-angle estimator.

use std::fmt;

use cellgeom_math::{Aabb3, Point3};

/// An indexed triangle mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriangleMesh {
    /// Flat array of vertex positions: `[x0, y0, z0, x1, y1, z1, ...]`.
    pub vertices: Vec<f64>,
    /// Flat array of triangle indices: `[i0, i1, i2, ...]`.
    pub indices: Vec<u32>,
}

impl TriangleMesh {
    /// Create an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of triangles.
    pub fn num_triangles(&self) -> usize {
        self.indices.len() / 3
    }

    /// Number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.vertices.len() / 3
    }

    /// True if the mesh has no triangles.
    pub fn is_empty(&self) -> bool {
        self.num_triangles() == 0
    }

    /// Vertex `i`, if it exists.
    pub fn vertex(&self, i: usize) -> Option<Point3> {
        let v = self.vertices.get(3 * i..3 * i + 3)?;
        Some(Point3::new(v[0], v[1], v[2]))
    }

    /// Corners of triangle `i`. `None` if any index is out of range.
    pub fn triangle(&self, i: usize) -> Option<[Point3; 3]> {
        let idx = self.indices.get(3 * i..3 * i + 3)?;
        Some([
            self.vertex(idx[0] as usize)?,
            self.vertex(idx[1] as usize)?,
            self.vertex(idx[2] as usize)?,
        ])
    }

    /// Every well-formed triangle, in order.
    pub fn triangles(&self) -> impl Iterator<Item = [Point3; 3]> + '_ {
        (0..self.num_triangles()).filter_map(|i| self.triangle(i))
    }

    /// Closed, outward-wound surface of a box.
    pub fn from_aabb(aabb: &Aabb3) -> Self {
        let vertices = aabb
            .corners()
            .iter()
            .flat_map(|c| [c.x, c.y, c.z])
            .collect();
        #[rustfmt::skip]
        let indices = vec![
            0, 2, 1, 1, 2, 3, // -z
            4, 5, 6, 5, 7, 6, // +z
            0, 1, 4, 1, 5, 4, // -y
            2, 6, 3, 3, 6, 7, // +y
            0, 4, 2, 2, 4, 6, // -x
            1, 3, 5, 3, 7, 5, // +x
        ];
        Self { vertices, indices }
    }
}

/// A lazily triangulated representation of an object's surface.
///
/// Called at most once per object until its geometry changes.
pub trait MeshSource: Send + Sync + fmt::Debug {
    /// Triangulate, or `None` if no mesh can be produced.
    fn triangulate(&self) -> Option<TriangleMesh>;
}
