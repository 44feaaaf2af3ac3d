//! Field-to-mesh generation for one chunk
//!
//! A [`GenerationJob`] is a by-value snapshot of everything one chunk
//! generation needs, so it can run on any thread without touching
//! scheduler state. Stages:
//! 1. Density cache (sampler plus region edits)
//! 2. Marching cubes extraction
//! 3. Optional vertex dedup
//! 4. Optional Taubin smoothing
//! 5. Gradient normals and planar UVs

use std::time::{Duration, Instant};

use glam::Vec3;

use super::config::MeshingConfig;
use crate::core::types::Result;
use crate::mesh::dedup::{dedup_mesh, dedup_with_normal_averaging, DedupStats};
use crate::mesh::normals::gradient_normals;
use crate::mesh::uv::planar_uvs;
use crate::mesh::{extract, taubin_smooth, ChunkMesh};
use crate::terrain::{DensityParams, DensitySampler};
use crate::voxel::{ChunkCoord, ChunkExtent, DensityEdit, DensityField, EditedDensity};

/// Inputs for generating one chunk
#[derive(Clone, Debug)]
pub struct GenerationJob {
    /// Slot the result is destined for
    pub slot: u64,
    /// Slot epoch when the job was issued
    pub epoch: u64,
    pub coord: ChunkCoord,
    pub priority: f32,
    /// World-space minimum corner
    pub origin: Vec3,
    pub extent: ChunkExtent,
    pub density: DensityParams,
    /// Region edits overlapping this chunk
    pub edits: Vec<DensityEdit>,
    pub meshing: MeshingConfig,
    /// Rebuild normals by face averaging when deduplicating
    pub average_normals: bool,
}

/// Per-generation counters
#[derive(Clone, Copy, Debug, Default)]
pub struct GenerationStats {
    /// Vertices straight out of extraction
    pub extracted_vertices: usize,
    pub dedup: Option<DedupStats>,
    pub elapsed: Duration,
}

/// Finished buffers for one chunk
#[derive(Debug)]
pub struct GeneratedChunk {
    pub slot: u64,
    pub epoch: u64,
    pub coord: ChunkCoord,
    pub mesh: ChunkMesh,
    /// Density cache, when the configuration keeps it
    pub field: Option<DensityField>,
    pub stats: GenerationStats,
}

impl GenerationJob {
    /// Run the whole pipeline on the calling thread
    ///
    /// Fails only on an invalid chunk extent, before any work is done.
    pub fn run(&self) -> Result<GeneratedChunk> {
        self.extent.validate()?;
        let start = Instant::now();

        let sampler = DensitySampler::new(self.density.clone());
        let density = EditedDensity::new(&sampler, &self.edits);
        let field = DensityField::build(self.origin, self.extent, &density)?;

        let meshing = &self.meshing;
        let voxel = self.extent.voxel_size;
        let mut mesh = extract(&field, voxel, meshing.threshold);
        let extracted_vertices = mesh.vertex_count();

        let mut dedup = None;
        let mut averaged = false;
        if meshing.dedup_enabled && extracted_vertices >= meshing.min_vertices_for_dedup {
            dedup = Some(if self.average_normals {
                averaged = true;
                dedup_with_normal_averaging(&mut mesh, meshing.dedup_strategy, meshing.merge_distance)
            } else {
                dedup_mesh(&mut mesh, meshing.dedup_strategy, meshing.merge_distance)
            });
        }

        let smoothing = &meshing.smoothing;
        if smoothing.enabled && smoothing.iterations > 0 {
            taubin_smooth(&mut mesh.vertices, &mesh.triangles, smoothing.lambda, smoothing.mu, smoothing.iterations);
        }

        if !averaged {
            mesh.normals = gradient_normals(&mesh.vertices, self.origin, voxel, &density);
        }
        mesh.uvs = planar_uvs(&mesh.vertices, self.origin);

        let stats = GenerationStats {
            extracted_vertices,
            dedup,
            elapsed: start.elapsed(),
        };
        log::debug!(
            "Generated chunk {}: {} -> {} vertices, {} triangles in {:?}",
            self.coord,
            extracted_vertices,
            mesh.vertex_count(),
            mesh.triangle_count(),
            stats.elapsed
        );

        Ok(GeneratedChunk {
            slot: self.slot,
            epoch: self.epoch,
            coord: self.coord,
            mesh,
            field: meshing.keep_density_field.then_some(field),
            stats,
        })
    }
}
