//! Whole-mesh vertex deduplication
//!
//! Two interchangeable strategies decide which vertices merge:
//!
//! - [`DedupStrategy::NeighborHash`] merges any vertex within
//!   `merge_distance` of an already accepted one (radius semantics).
//! - [`DedupStrategy::SortQuantize`] snaps positions to a grid of
//!   `merge_distance` cells and merges vertices landing in the same cell.
//!   Vertices straddling a cell boundary stay separate even when closer
//!   than `merge_distance`.
//!
//! Every pass finishes by dropping triangles whose remapped indices are no
//! longer pairwise distinct.

use std::collections::HashMap;

use glam::Vec3;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::normals::{face_normal, DEFAULT_NORMAL};
use super::ChunkMesh;

/// Vertex merge strategy
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupStrategy {
    /// Spatial hash with a 27-cell neighbour probe
    NeighborHash,
    /// Quantize, sort, collapse runs
    #[default]
    SortQuantize,
}

impl DedupStrategy {
    /// Compute the vertex merge mapping for this strategy
    pub fn remap(self, vertices: &[Vec3], merge_distance: f32) -> Remap {
        if !(merge_distance.is_finite() && merge_distance > 0.0) {
            log::warn!("Skipping dedup with merge distance {}", merge_distance);
            return Remap::identity(vertices.len());
        }
        match self {
            DedupStrategy::NeighborHash => neighbor_hash(vertices, merge_distance),
            DedupStrategy::SortQuantize => sort_quantize(vertices, merge_distance),
        }
    }
}

/// Vertex merge mapping
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Remap {
    /// New index of every input vertex
    pub old_to_new: Vec<u32>,
    /// Input index of every retained vertex, in output order
    pub kept: Vec<u32>,
}

impl Remap {
    /// Mapping that keeps every vertex
    pub fn identity(count: usize) -> Self {
        let ids: Vec<u32> = (0..count as u32).collect();
        Self { old_to_new: ids.clone(), kept: ids }
    }

    /// Number of retained vertices
    pub fn len(&self) -> usize {
        self.kept.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kept.is_empty()
    }

    /// Gather retained entries of a per-vertex array
    pub fn gather<T: Copy>(&self, values: &[T]) -> Vec<T> {
        self.kept.iter().map(|&i| values[i as usize]).collect()
    }

    /// Rewrite triangle indices through the mapping
    pub fn apply_to_triangles(&self, triangles: &[u32]) -> Vec<u32> {
        triangles.iter().map(|&i| self.old_to_new[i as usize]).collect()
    }
}

/// Summary of one dedup pass
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DedupStats {
    pub vertices_before: usize,
    pub vertices_after: usize,
    pub triangles_dropped: usize,
}

fn neighbor_hash(vertices: &[Vec3], merge_distance: f32) -> Remap {
    let max_dist_sq = merge_distance * merge_distance;
    // i64 cells: chunk-local coordinates over a tiny merge distance overflow i32
    let cell_of = |v: Vec3| {
        let q = (v / merge_distance).floor();
        [q.x as i64, q.y as i64, q.z as i64]
    };

    let mut grid: HashMap<[i64; 3], Vec<u32>> = HashMap::new();
    let mut old_to_new = Vec::with_capacity(vertices.len());
    let mut kept: Vec<u32> = Vec::new();

    for (i, &v) in vertices.iter().enumerate() {
        let cell = cell_of(v);
        let mut found = None;

        'probe: for dz in -1..=1 {
            for dy in -1..=1 {
                for dx in -1..=1 {
                    let neighbour = [
                        cell[0].saturating_add(dx),
                        cell[1].saturating_add(dy),
                        cell[2].saturating_add(dz),
                    ];
                    let Some(bucket) = grid.get(&neighbour) else {
                        continue;
                    };
                    for &candidate in bucket {
                        let rep = vertices[kept[candidate as usize] as usize];
                        if rep.distance_squared(v) <= max_dist_sq {
                            found = Some(candidate);
                            break 'probe;
                        }
                    }
                }
            }
        }

        let index = found.unwrap_or_else(|| {
            let index = kept.len() as u32;
            kept.push(i as u32);
            grid.entry(cell).or_default().push(index);
            index
        });
        old_to_new.push(index);
    }

    Remap { old_to_new, kept }
}

fn sort_quantize(vertices: &[Vec3], merge_distance: f32) -> Remap {
    // Ties round to even so a vertex exactly half a cell away does not get
    // pushed across the boundary
    let keys: Vec<[i64; 3]> = vertices
        .par_iter()
        .map(|v| {
            let q = *v / merge_distance;
            [
                q.x.round_ties_even() as i64,
                q.y.round_ties_even() as i64,
                q.z.round_ties_even() as i64,
            ]
        })
        .collect();

    let mut order: Vec<u32> = (0..vertices.len() as u32).collect();
    order.par_sort_unstable_by_key(|&i| (keys[i as usize], i));

    // Each run collapses onto its lowest original index
    let mut representative = vec![0u32; vertices.len()];
    let mut run_start = 0;
    for pos in 0..order.len() {
        if keys[order[pos] as usize] != keys[order[run_start] as usize] {
            run_start = pos;
        }
        representative[order[pos] as usize] = order[run_start];
    }

    // Representatives keep their relative input order
    let mut old_to_new = vec![0u32; vertices.len()];
    let mut kept = Vec::new();
    for i in 0..vertices.len() {
        let rep = representative[i] as usize;
        if rep == i {
            old_to_new[i] = kept.len() as u32;
            kept.push(i as u32);
        } else {
            old_to_new[i] = old_to_new[rep];
        }
    }

    Remap { old_to_new, kept }
}

/// Drop triangles whose indices are not pairwise distinct
///
/// Returns the number of triangles removed.
pub fn remove_degenerate(triangles: &mut Vec<u32>) -> usize {
    let before = triangles.len() / 3;
    let survivors: Vec<u32> = triangles
        .chunks_exact(3)
        .filter(|t| t[0] != t[1] && t[1] != t[2] && t[0] != t[2])
        .flatten()
        .copied()
        .collect();
    let dropped = before - survivors.len() / 3;
    if dropped > 0 {
        *triangles = survivors;
    }
    dropped
}

/// Merge near-coincident vertices of a raw vertex/triangle list
pub fn dedup_vertices(
    vertices: &[Vec3],
    triangles: &[u32],
    merge_distance: f32,
    strategy: DedupStrategy,
) -> (Vec<Vec3>, Vec<u32>) {
    let remap = strategy.remap(vertices, merge_distance);
    let mut triangles = remap.apply_to_triangles(triangles);
    remove_degenerate(&mut triangles);
    (remap.gather(vertices), triangles)
}

/// Merge near-coincident vertices of a mesh in place
///
/// Retained vertices keep their own normal and UV when those are present.
pub fn dedup_mesh(mesh: &mut ChunkMesh, strategy: DedupStrategy, merge_distance: f32) -> DedupStats {
    let vertices_before = mesh.vertices.len();
    let remap = strategy.remap(&mesh.vertices, merge_distance);

    let mut triangles = remap.apply_to_triangles(&mesh.triangles);
    let triangles_dropped = remove_degenerate(&mut triangles);

    if !mesh.normals.is_empty() {
        mesh.normals = remap.gather(&mesh.normals);
    }
    if !mesh.uvs.is_empty() {
        mesh.uvs = remap.gather(&mesh.uvs);
    }
    mesh.vertices = remap.gather(&mesh.vertices);
    mesh.triangles = triangles;

    DedupStats { vertices_before, vertices_after: mesh.vertices.len(), triangles_dropped }
}

/// Merge vertices and rebuild normals as the average of adjacent faces
///
/// Existing normals and UVs no longer line up with the merged vertices and
/// are discarded; normals are replaced by the normalized sum of the face
/// normals around each retained vertex.
pub fn dedup_with_normal_averaging(
    mesh: &mut ChunkMesh,
    strategy: DedupStrategy,
    merge_distance: f32,
) -> DedupStats {
    mesh.normals.clear();
    mesh.uvs.clear();
    let stats = dedup_mesh(mesh, strategy, merge_distance);

    let mut sums = vec![Vec3::ZERO; mesh.vertices.len()];
    for [a, b, c] in mesh.triangle_indices() {
        let (a, b, c) = (a as usize, b as usize, c as usize);
        if let Some(n) = face_normal(mesh.vertices[a], mesh.vertices[b], mesh.vertices[c]) {
            sums[a] += n;
            sums[b] += n;
            sums[c] += n;
        }
    }
    mesh.normals = sums
        .into_iter()
        .map(|n| n.try_normalize().unwrap_or(DEFAULT_NORMAL))
        .collect();

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::extract;
    use crate::voxel::DensityField;

    const STRATEGIES: [DedupStrategy; 2] = [DedupStrategy::NeighborHash, DedupStrategy::SortQuantize];

    fn blob_mesh() -> ChunkMesh {
        let field = DensityField::from_fn(10, |x, y, z| {
            let p = Vec3::new(x as f32, y as f32, z as f32);
            3.7 - p.distance(Vec3::splat(5.0)) + ((x * 3 + z) % 4) as f32 * 0.2
        });
        extract(&field, 1.0, 0.0)
    }

    #[test]
    fn test_two_points_merge() {
        let vertices = [Vec3::ZERO, Vec3::new(0.05, 0.0, 0.0)];
        for strategy in STRATEGIES {
            let (merged, _) = dedup_vertices(&vertices, &[], 0.1, strategy);
            assert_eq!(merged.len(), 1, "{:?}", strategy);
            assert_eq!(merged[0], Vec3::ZERO);
        }
    }

    #[test]
    fn test_two_points_stay_apart() {
        let vertices = [Vec3::ZERO, Vec3::new(0.05, 0.0, 0.0)];
        for strategy in STRATEGIES {
            let (merged, _) = dedup_vertices(&vertices, &[], 0.01, strategy);
            assert_eq!(merged.len(), 2, "{:?}", strategy);
        }
    }

    #[test]
    fn test_boundary_straddle_differs() {
        // 0.02 apart, but on opposite sides of a quantization cell boundary
        let vertices = [Vec3::new(0.04, 0.0, 0.0), Vec3::new(0.06, 0.0, 0.0)];
        let hash = DedupStrategy::NeighborHash.remap(&vertices, 0.1);
        let quantize = DedupStrategy::SortQuantize.remap(&vertices, 0.1);
        assert_eq!(hash.len(), 1);
        assert_eq!(quantize.len(), 2);
    }

    #[test]
    fn test_strategies_agree_when_well_separated() {
        let mut vertices = Vec::new();
        for x in 0..6 {
            for y in 0..6 {
                for z in 0..6 {
                    vertices.push(Vec3::new(x as f32, y as f32, z as f32));
                    // A near-duplicate at the center of the same cell
                    if (x + y + z) % 3 == 0 {
                        vertices.push(Vec3::new(x as f32 + 0.01, y as f32, z as f32 - 0.01));
                    }
                }
            }
        }
        let hash = DedupStrategy::NeighborHash.remap(&vertices, 0.1);
        let quantize = DedupStrategy::SortQuantize.remap(&vertices, 0.1);
        assert_eq!(hash.len(), 216);
        assert_eq!(quantize.len(), 216);
    }

    #[test]
    fn test_degenerate_triangles_removed() {
        let vertices = [Vec3::ZERO, Vec3::new(0.01, 0.0, 0.0), Vec3::Y, Vec3::X * 2.0];
        let triangles = [0, 1, 2, 0, 3, 2];
        for strategy in STRATEGIES {
            let (v, t) = dedup_vertices(&vertices, &triangles, 0.1, strategy);
            assert_eq!(v.len(), 3);
            assert_eq!(t, vec![0, 2, 1], "{:?}", strategy);
        }
    }

    #[test]
    fn test_remove_degenerate() {
        let mut tris = vec![0, 1, 2, 3, 3, 4, 5, 6, 5, 7, 8, 9];
        assert_eq!(remove_degenerate(&mut tris), 2);
        assert_eq!(tris, vec![0, 1, 2, 7, 8, 9]);

        let mut clean = vec![0, 1, 2];
        assert_eq!(remove_degenerate(&mut clean), 0);
        assert_eq!(clean, vec![0, 1, 2]);
    }

    #[test]
    fn test_dedup_idempotent() {
        for strategy in STRATEGIES {
            let mut once = blob_mesh();
            dedup_mesh(&mut once, strategy, 0.45);
            let mut twice = once.clone();
            let stats = dedup_mesh(&mut twice, strategy, 0.45);
            assert_eq!(once, twice, "{:?}", strategy);
            assert_eq!(stats.triangles_dropped, 0);
        }
    }

    #[test]
    fn test_dedup_never_grows() {
        let raw = blob_mesh();
        for strategy in STRATEGIES {
            for d in [0.01, 0.2, 0.45, 0.9] {
                let mut mesh = raw.clone();
                let stats = dedup_mesh(&mut mesh, strategy, d);
                assert!(mesh.vertex_count() <= raw.vertex_count());
                assert_eq!(stats.vertices_before, raw.vertex_count());
                assert!(mesh.is_aligned());
                for [a, b, c] in mesh.triangle_indices() {
                    assert!(a != b && b != c && a != c);
                }
            }
        }
    }

    #[test]
    fn test_neighbor_hash_separation() {
        let mut mesh = blob_mesh();
        let d = 0.45;
        dedup_mesh(&mut mesh, DedupStrategy::NeighborHash, d);
        for i in 0..mesh.vertices.len() {
            for j in (i + 1)..mesh.vertices.len() {
                assert!(mesh.vertices[i].distance_squared(mesh.vertices[j]) > d * d);
            }
        }
    }

    #[test]
    fn test_tiny_merge_distance_far_from_origin() {
        // Cell indices here exceed i32 range
        let vertices = [Vec3::new(3200.0, 10.0, 10.0), Vec3::new(3199.0, 10.0, 10.0)];
        for strategy in STRATEGIES {
            let (merged, _) = dedup_vertices(&vertices, &[], 1e-6, strategy);
            assert_eq!(merged, vertices.to_vec(), "{:?}", strategy);
        }

        let same = [Vec3::new(3200.0, 10.0, 10.0); 2];
        let (merged, _) = dedup_vertices(&same, &[], 1e-6, DedupStrategy::NeighborHash);
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn test_sort_quantize_keeps_first_in_input_order() {
        let vertices = [Vec3::new(5.0, 0.0, 0.0), Vec3::new(0.02, 0.0, 0.0), Vec3::ZERO, Vec3::new(5.01, 0.0, 0.0)];
        let remap = DedupStrategy::SortQuantize.remap(&vertices, 0.1);
        assert_eq!(remap.kept, vec![0, 1]);
        assert_eq!(remap.old_to_new, vec![0, 1, 1, 0]);
    }

    #[test]
    fn test_dedup_mesh_carries_attributes() {
        let mut mesh = ChunkMesh {
            vertices: vec![Vec3::ZERO, Vec3::X, Vec3::new(1.01, 0.0, 0.0), Vec3::Y],
            triangles: vec![0, 1, 3, 0, 3, 2],
            normals: vec![Vec3::Z, Vec3::X, Vec3::Y, Vec3::NEG_Z],
            uvs: vec![glam::Vec2::ZERO, glam::Vec2::X, glam::Vec2::Y, glam::Vec2::ONE],
        };
        dedup_mesh(&mut mesh, DedupStrategy::NeighborHash, 0.1);
        assert!(mesh.is_aligned());
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.normals, vec![Vec3::Z, Vec3::X, Vec3::NEG_Z]);
        assert_eq!(mesh.triangles, vec![0, 1, 2, 0, 2, 1]);
    }

    #[test]
    fn test_normal_averaging() {
        // Two triangles folded along the shared edge
        let mut mesh = ChunkMesh {
            vertices: vec![
                Vec3::ZERO, Vec3::X, Vec3::Y,
                Vec3::new(0.0, 0.0, 0.001), Vec3::new(0.0, 1.0, 0.001), Vec3::Z,
            ],
            triangles: vec![0, 1, 2, 3, 4, 5],
            normals: vec![Vec3::X; 6],
            uvs: vec![glam::Vec2::ZERO; 6],
        };
        let stats = dedup_with_normal_averaging(&mut mesh, DedupStrategy::NeighborHash, 0.01);
        assert_eq!(stats.vertices_after, 4);
        assert!(mesh.uvs.is_empty());
        assert_eq!(mesh.normals.len(), 4);

        // Shared vertices average +Z and +X faces
        let expected = Vec3::new(1.0, 0.0, 1.0).normalize();
        assert!((mesh.normals[0] - expected).length() < 1e-4);
        assert!((mesh.normals[2] - expected).length() < 1e-4);
        assert!((mesh.normals[1] - Vec3::Z).length() < 1e-4);
        assert!((mesh.normals[3] - Vec3::X).length() < 1e-4);
    }

    #[test]
    fn test_invalid_merge_distance_is_identity() {
        let vertices = [Vec3::ZERO, Vec3::ZERO];
        assert_eq!(DedupStrategy::SortQuantize.remap(&vertices, 0.0), Remap::identity(2));
        assert_eq!(DedupStrategy::NeighborHash.remap(&vertices, f32::NAN), Remap::identity(2));
    }

    #[test]
    fn test_strategy_serde() {
        let s: DedupStrategy = serde_json::from_str("\"neighbor_hash\"").unwrap();
        assert_eq!(s, DedupStrategy::NeighborHash);
        assert_eq!(serde_json::to_string(&DedupStrategy::SortQuantize).unwrap(), "\"sort_quantize\"");
    }
}
