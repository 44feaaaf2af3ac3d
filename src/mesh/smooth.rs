//! Taubin smoothing
//!
//! Each iteration runs a shrinking Laplacian pass (`lambda > 0`) followed by
//! an inflating pass (`mu < 0`, `|mu| > lambda`), which damps high-frequency
//! noise without the volume loss of plain Laplacian smoothing.

use glam::Vec3;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Smoothing settings
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingParams {
    pub enabled: bool,
    pub iterations: u32,
    pub lambda: f32,
    pub mu: f32,
}

impl Default for SmoothingParams {
    fn default() -> Self {
        Self {
            enabled: true,
            iterations: 5,
            lambda: 0.5,
            mu: -0.53,
        }
    }
}

/// Neighbour lists built from a triangle list, sorted and without repeats
pub fn build_adjacency(vertex_count: usize, triangles: &[u32]) -> Vec<Vec<u32>> {
    let mut adjacency = vec![Vec::new(); vertex_count];
    for t in triangles.chunks_exact(3) {
        for k in 0..3 {
            let v = t[k] as usize;
            adjacency[v].push(t[(k + 1) % 3]);
            adjacency[v].push(t[(k + 2) % 3]);
        }
    }
    for neighbours in &mut adjacency {
        neighbours.sort_unstable();
        neighbours.dedup();
    }
    adjacency
}

/// Smooth vertex positions in place
///
/// Every pass reads only the previous pass's positions. Vertices with no
/// neighbours do not move.
pub fn taubin_smooth(vertices: &mut Vec<Vec3>, triangles: &[u32], lambda: f32, mu: f32, iterations: u32) {
    if iterations == 0 || vertices.is_empty() {
        return;
    }
    let adjacency = build_adjacency(vertices.len(), triangles);
    let mut scratch = vec![Vec3::ZERO; vertices.len()];

    for _ in 0..iterations {
        relax(vertices, &mut scratch, &adjacency, lambda);
        std::mem::swap(vertices, &mut scratch);
        relax(vertices, &mut scratch, &adjacency, mu);
        std::mem::swap(vertices, &mut scratch);
    }
}

fn relax(src: &[Vec3], dst: &mut [Vec3], adjacency: &[Vec<u32>], factor: f32) {
    dst.par_iter_mut().enumerate().for_each(|(i, out)| {
        let neighbours = &adjacency[i];
        let p = src[i];
        *out = if neighbours.is_empty() {
            p
        } else {
            let centroid = neighbours.iter().map(|&n| src[n as usize]).sum::<Vec3>() / neighbours.len() as f32;
            p + (centroid - p) * factor
        };
    });
}
