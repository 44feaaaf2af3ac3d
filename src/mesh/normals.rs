//! Vertex normal generation

use glam::Vec3;
use rayon::prelude::*;

use super::ChunkMesh;
use crate::terrain::DensityFn;

/// Fallback for vertices with no usable direction
pub const DEFAULT_NORMAL: Vec3 = Vec3::Y;

/// Unit normal of a triangle, or `None` when it has no area
pub fn face_normal(a: Vec3, b: Vec3, c: Vec3) -> Option<Vec3> {
    (b - a).cross(c - a).try_normalize()
}

/// Per-vertex normals from the density gradient in world space
///
/// Central differences with a step of half a voxel, negated so normals
/// point down the gradient into open space. Vertices are processed in
/// parallel.
pub fn gradient_normals<D: DensityFn + ?Sized>(
    vertices: &[Vec3],
    origin: Vec3,
    voxel_size: f32,
    density: &D,
) -> Vec<Vec3> {
    let eps = voxel_size * 0.5;
    vertices
        .par_iter()
        .map(|&local| {
            let p = origin + local;
            let gradient = Vec3::new(
                density.density(p + Vec3::X * eps) - density.density(p - Vec3::X * eps),
                density.density(p + Vec3::Y * eps) - density.density(p - Vec3::Y * eps),
                density.density(p + Vec3::Z * eps) - density.density(p - Vec3::Z * eps),
            );
            (-gradient).try_normalize().unwrap_or(DEFAULT_NORMAL)
        })
        .collect()
}

/// Per-vertex normals copied from adjacent faces
///
/// Each triangle writes its face normal to its three vertices, later
/// triangles overwriting earlier ones. Used when the density function is not
/// available for resampling.
pub fn face_normals(mesh: &ChunkMesh) -> Vec<Vec3> {
    let mut normals = vec![DEFAULT_NORMAL; mesh.vertices.len()];
    for [a, b, c] in mesh.triangle_indices() {
        let (a, b, c) = (a as usize, b as usize, c as usize);
        if let Some(n) = face_normal(mesh.vertices[a], mesh.vertices[b], mesh.vertices[c]) {
            normals[a] = n;
            normals[b] = n;
            normals[c] = n;
        }
    }
    normals
}
