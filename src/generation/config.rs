//! World and meshing configuration
//!
//! Every struct uses `#[serde(default)]` so a JSON file only needs the
//! fields it overrides.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::Error;
use crate::core::types::Result;
use crate::mesh::{DedupStrategy, SmoothingParams};
use crate::streaming::lod::LodConfig;
use crate::terrain::DensityParams;
use crate::voxel::ChunkExtent;

/// Mesh extraction and post-processing settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshingConfig {
    /// Density below which space is open
    pub threshold: f32,
    /// Vertices closer than this may be merged
    pub merge_distance: f32,
    pub dedup_enabled: bool,
    pub dedup_strategy: DedupStrategy,
    /// Meshes with fewer vertices skip dedup
    pub min_vertices_for_dedup: usize,
    /// Rebuild normals by face averaging during dedup (synchronous generation only)
    pub average_normals_on_merge: bool,
    /// Keep the density cache on the chunk after meshing
    pub keep_density_field: bool,
    pub smoothing: SmoothingParams,
}

impl Default for MeshingConfig {
    fn default() -> Self {
        Self {
            threshold: 0.0,
            merge_distance: 0.1,
            dedup_enabled: true,
            dedup_strategy: DedupStrategy::SortQuantize,
            min_vertices_for_dedup: 80_000,
            average_normals_on_merge: true,
            keep_density_field: true,
            smoothing: SmoothingParams::default(),
        }
    }
}

/// Streaming world configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// World units per lattice step
    pub voxel_size: f32,
    /// Voxels per chunk axis (1..=128)
    pub chunk_size: u32,
    /// Radius of the required set, in chunks
    pub view_distance: u32,
    /// Additional cap on vertical chunk offsets
    pub vertical_view_limit: Option<u32>,
    /// Upper bound on tracked chunks
    pub max_active_chunks: usize,
    /// Generations started per tick
    pub chunks_per_tick: usize,
    /// Generate on worker threads instead of inside `tick`
    pub async_generation: bool,
    /// Concurrent background generations
    pub worker_threads: usize,
    /// Idle slots kept for reuse
    pub pool_capacity: usize,
    /// Numerator of the `K / (distance + 1)` priority
    pub priority_scale: f32,
    pub lod: LodConfig,
    pub density: DensityParams,
    pub meshing: MeshingConfig,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            voxel_size: 50.0,
            chunk_size: 64,
            view_distance: 5,
            vertical_view_limit: Some(2),
            max_active_chunks: 2000,
            chunks_per_tick: 5,
            async_generation: true,
            worker_threads: 4,
            pool_capacity: 50,
            priority_scale: 10_000.0,
            lod: LodConfig::default(),
            density: DensityParams::default(),
            meshing: MeshingConfig::default(),
        }
    }
}

impl WorldConfig {
    /// Load and validate a JSON configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: WorldConfig = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Lattice resolution of every chunk
    pub fn extent(&self) -> ChunkExtent {
        ChunkExtent::new(self.voxel_size, self.chunk_size)
    }

    /// Chunk edge length in world units
    pub fn chunk_world_size(&self) -> f32 {
        self.extent().world_size()
    }

    /// Check the whole configuration
    pub fn validate(&self) -> Result<()> {
        self.extent().validate()?;

        if self.chunks_per_tick == 0 {
            return Err(Error::InvalidConfig("chunks_per_tick must be at least 1".into()));
        }
        if self.async_generation && self.worker_threads == 0 {
            return Err(Error::InvalidConfig("worker_threads must be at least 1".into()));
        }
        if self.max_active_chunks == 0 {
            return Err(Error::InvalidConfig("max_active_chunks must be at least 1".into()));
        }
        if !(self.priority_scale.is_finite() && self.priority_scale > 0.0) {
            return Err(Error::InvalidConfig(format!("priority_scale {} must be > 0", self.priority_scale)));
        }
        if !self.lod.is_valid() {
            return Err(Error::InvalidConfig("lod distances must be ascending and non-negative".into()));
        }
        let meshing = &self.meshing;
        if !meshing.threshold.is_finite() {
            return Err(Error::InvalidConfig("threshold must be finite".into()));
        }
        if meshing.dedup_enabled && !(meshing.merge_distance.is_finite() && meshing.merge_distance > 0.0) {
            return Err(Error::InvalidConfig(format!("merge_distance {} must be > 0", meshing.merge_distance)));
        }
        if self.density.frequency <= 0.0 {
            return Err(Error::InvalidConfig("density frequency must be > 0".into()));
        }
        Ok(())
    }
}
