//! Marching cubes over a chunk density cache
//!
//! Cells whose corners straddle the threshold emit triangles from the
//! standard tables. Crossing vertices are cached per lattice edge, so cells
//! sharing an edge share the vertex and chunk meshes are watertight inside.
//!
//! Corner bit `i` is set when corner `i` is below the threshold (open
//! space). Triangles wind counter-clockwise when seen from open space, so
//! face normals point out of the rock and into the cave.

use std::collections::HashMap;

use glam::Vec3;

use super::tables::{EDGE_LATTICE, EDGE_TABLE, TRI_TABLE, CORNERS};
use super::ChunkMesh;
use crate::voxel::DensityField;

/// Interpolation short-circuit tolerance
pub const INTERP_EPSILON: f32 = 1e-5;

/// Edge identity: flat lattice index of the edge's lower corner and its axis
type EdgeKey = (usize, u8);

const AXIS_STEP: [[usize; 3]; 3] = [[1, 0, 0], [0, 1, 0], [0, 0, 1]];

/// Extract the threshold isosurface of a density field
///
/// Positions are chunk-local: lattice point `(x, y, z)` sits at
/// `(x, y, z) * voxel_size`. Normals and UVs are left empty.
pub fn extract(field: &DensityField, voxel_size: f32, threshold: f32) -> ChunkMesh {
    let n = field.chunk_size() as usize;
    let mut mesh = ChunkMesh::new();
    let mut edge_cache: HashMap<EdgeKey, u32> = HashMap::new();

    for z in 0..n {
        for y in 0..n {
            for x in 0..n {
                let config = cell_configuration(field, x, y, z, threshold);
                let crossed = EDGE_TABLE[config as usize];
                if crossed == 0 {
                    continue;
                }

                let mut edge_vertices = [0u32; 12];
                for (edge, slot) in edge_vertices.iter_mut().enumerate() {
                    if crossed & (1 << edge) == 0 {
                        continue;
                    }
                    let (low, axis) = EDGE_LATTICE[edge];
                    let lo = [x + low[0], y + low[1], z + low[2]];
                    let key = (field.index(lo[0], lo[1], lo[2]), axis);

                    let vertices = &mut mesh.vertices;
                    *slot = *edge_cache.entry(key).or_insert_with(|| {
                        let step = AXIS_STEP[axis as usize];
                        let hi = [lo[0] + step[0], lo[1] + step[1], lo[2] + step[2]];
                        let p1 = lattice_position(lo, voxel_size);
                        let p2 = lattice_position(hi, voxel_size);
                        let v1 = field.get_or_solid(lo[0], lo[1], lo[2]);
                        let v2 = field.get_or_solid(hi[0], hi[1], hi[2]);

                        let index = vertices.len() as u32;
                        vertices.push(interpolate_vertex(threshold, p1, p2, v1, v2));
                        index
                    });
                }

                for tri in TRI_TABLE[config as usize].chunks_exact(3) {
                    if tri[0] < 0 {
                        break;
                    }
                    mesh.triangles.extend_from_slice(&[
                        edge_vertices[tri[0] as usize],
                        edge_vertices[tri[1] as usize],
                        edge_vertices[tri[2] as usize],
                    ]);
                }
            }
        }
    }

    mesh
}

/// 8-bit configuration of the cell whose minimum corner is `(x, y, z)`
pub fn cell_configuration(field: &DensityField, x: usize, y: usize, z: usize, threshold: f32) -> u8 {
    let mut config = 0u8;
    for (i, offset) in CORNERS.iter().enumerate() {
        let value = field.get_or_solid(x + offset[0], y + offset[1], z + offset[2]);
        if value < threshold {
            config |= 1 << i;
        }
    }
    config
}

/// Threshold crossing between two lattice points
///
/// Returns an endpoint directly when it sits on the threshold, and `p1` for
/// flat edges where the interpolation parameter is undefined.
pub fn interpolate_vertex(threshold: f32, p1: Vec3, p2: Vec3, v1: f32, v2: f32) -> Vec3 {
    if (threshold - v1).abs() < INTERP_EPSILON {
        return p1;
    }
    if (threshold - v2).abs() < INTERP_EPSILON {
        return p2;
    }
    if (v1 - v2).abs() < INTERP_EPSILON {
        return p1;
    }
    let t = (threshold - v1) / (v2 - v1);
    p1 + (p2 - p1) * t
}

#[inline]
fn lattice_position(p: [usize; 3], voxel_size: f32) -> Vec3 {
    Vec3::new(p[0] as f32, p[1] as f32, p[2] as f32) * voxel_size
}
