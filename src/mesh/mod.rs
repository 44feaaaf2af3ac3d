//! Chunk mesh extraction and post-processing
//!
//! Extraction produces a vertex/triangle list in chunk-local space. The
//! post-processing passes (dedup, smoothing, normals, UVs) each operate on a
//! [`ChunkMesh`] in place.

pub mod tables;
pub mod marching_cubes;
pub mod normals;
pub mod dedup;
pub mod smooth;
pub mod uv;

pub use marching_cubes::extract;
pub use dedup::{DedupStrategy, Remap};
pub use smooth::{taubin_smooth, SmoothingParams};

use glam::{Vec2, Vec3};

/// Triangle mesh for one chunk
///
/// `normals` and `uvs` are either empty or exactly one entry per vertex.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChunkMesh {
    /// Chunk-local vertex positions
    pub vertices: Vec<Vec3>,
    /// Vertex indices, three per triangle
    pub triangles: Vec<u32>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
}

impl ChunkMesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Drop all geometry, keeping allocations
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.triangles.clear();
        self.normals.clear();
        self.uvs.clear();
    }

    /// Check the structural invariants: whole triangles, in-range indices and
    /// attribute arrays that are empty or vertex-aligned
    pub fn is_aligned(&self) -> bool {
        let n = self.vertices.len();
        self.triangles.len() % 3 == 0
            && self.triangles.iter().all(|&i| (i as usize) < n)
            && (self.normals.is_empty() || self.normals.len() == n)
            && (self.uvs.is_empty() || self.uvs.len() == n)
    }

    /// Iterate triangles as index triples
    pub fn triangle_indices(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.triangles.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    /// Raw vertex positions for upload
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Raw normals for upload
    pub fn normal_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.normals)
    }

    /// Raw UVs for upload
    pub fn uv_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.uvs)
    }

    /// Raw index buffer for upload
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.triangles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alignment() {
        let mut mesh = ChunkMesh {
            vertices: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            triangles: vec![0, 1, 2],
            ..Default::default()
        };
        assert!(mesh.is_aligned());

        mesh.normals = vec![Vec3::Z; 2];
        assert!(!mesh.is_aligned());
        mesh.normals.push(Vec3::Z);
        assert!(mesh.is_aligned());

        mesh.triangles.push(3);
        assert!(!mesh.is_aligned());
    }

    #[test]
    fn test_byte_views() {
        let mesh = ChunkMesh {
            vertices: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            triangles: vec![0, 1, 2],
            normals: vec![Vec3::Z; 3],
            uvs: vec![Vec2::ZERO; 3],
        };
        assert_eq!(mesh.vertex_bytes().len(), 36);
        assert_eq!(mesh.normal_bytes().len(), 36);
        assert_eq!(mesh.uv_bytes().len(), 24);
        assert_eq!(mesh.index_bytes().len(), 12);
        assert_eq!(mesh.triangle_count(), 1);
    }

    #[test]
    fn test_clear() {
        let mut mesh = ChunkMesh {
            vertices: vec![Vec3::ZERO],
            ..Default::default()
        };
        mesh.clear();
        assert_eq!(mesh, ChunkMesh::new());
        assert!(mesh.is_empty());
    }
}
