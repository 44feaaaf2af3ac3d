//! Chunk generation scheduler
//!
//! Tracks which chunks should exist around an observer and drives their
//! lifecycle:
//!
//! NotTracked -> Queued -> Generating -> Active -> evicted (pooled or dropped)
//!
//! All bookkeeping (queue, registry, pool) lives on the thread that calls
//! [`ChunkScheduler::tick`]. Generation runs either inline or on a
//! [`MeshWorker`]; background results are only applied if the target slot's
//! epoch still matches the one the job was issued with.

use std::collections::{HashMap, HashSet};

use crate::core::types::{Result, Vec3};
use crate::generation::{GenerationJob, WorldConfig};
use crate::streaming::pool::ChunkPool;
use crate::streaming::priority::{chunk_priority, GenerationQueue, GenerationTask};
use crate::streaming::slot::{ChunkSlot, SharedBuffers};
use crate::streaming::worker::{run_job, GenerationResult, MeshWorker};
use crate::terrain::{DensityFn, DensitySampler};
use crate::voxel::{ChunkCoord, ChunkExtent, DensityEdit, EditedDensity};

/// Observable state of a chunk coordinate
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkState {
    NotTracked,
    Queued,
    Generating,
    /// Tracked and idle, whether or not a mesh was produced
    Active,
}

/// Notification sent to listeners
#[derive(Clone, Debug, PartialEq)]
pub enum ChunkEvent {
    /// New buffers were committed for a chunk
    Generated {
        coord: ChunkCoord,
        vertices: usize,
        triangles: usize,
    },
    LodChanged { coord: ChunkCoord, lod: u32 },
    Evicted { coord: ChunkCoord },
}

/// Listener callback
pub type ChunkListener = Box<dyn FnMut(&ChunkEvent) + Send>;

/// Snapshot of scheduler counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChunkStatistics {
    /// Tracked plus pooled slots
    pub total: usize,
    /// Tracked slots (generating or idle)
    pub active: usize,
    pub generating: usize,
    pub pooled: usize,
    pub queued: usize,
    /// Chunks waiting for their generation to finish before eviction
    pub pending_evictions: usize,
}

/// What one tick did
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// Generations started (new chunks and dirty rebuilds)
    pub started: usize,
    /// Results committed
    pub committed: usize,
    /// Stale results thrown away
    pub discarded: usize,
    pub evicted: usize,
}

/// Streams chunk meshes around an observer
pub struct ChunkScheduler {
    config: WorldConfig,
    extent: ChunkExtent,
    sampler: DensitySampler,
    queue: GenerationQueue,
    chunks: HashMap<ChunkCoord, ChunkSlot>,
    pool: ChunkPool,
    worker: Option<MeshWorker>,
    edits: Vec<DensityEdit>,
    observer: Option<Vec3>,
    required: HashSet<ChunkCoord>,
    pending_evictions: HashSet<ChunkCoord>,
    listeners: Vec<ChunkListener>,
}

impl ChunkScheduler {
    /// Create a scheduler; starts the background worker when configured for async generation
    pub fn new(config: WorldConfig) -> Result<Self> {
        config.validate()?;

        let worker = if config.async_generation {
            Some(MeshWorker::new(config.worker_threads)?)
        } else {
            None
        };
        let pool = ChunkPool::new(config.pool_capacity, config.max_active_chunks);
        log::info!(
            "Chunk scheduler: chunk {} x {} units, view distance {}, {} generation",
            config.chunk_size,
            config.voxel_size,
            config.view_distance,
            if worker.is_some() { "async" } else { "sync" }
        );

        Ok(Self {
            extent: config.extent(),
            sampler: DensitySampler::new(config.density.clone()),
            config,
            queue: GenerationQueue::new(),
            chunks: HashMap::new(),
            pool,
            worker,
            edits: Vec::new(),
            observer: None,
            required: HashSet::new(),
            pending_evictions: HashSet::new(),
            listeners: Vec::new(),
        })
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Register a listener for chunk events
    pub fn add_listener(&mut self, listener: impl FnMut(&ChunkEvent) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Chunk edge length in world units
    pub fn chunk_world_size(&self) -> f32 {
        self.extent.world_size()
    }

    /// Chunk containing a world position
    pub fn world_to_chunk(&self, world: Vec3) -> ChunkCoord {
        ChunkCoord::from_world_pos(world, self.chunk_world_size())
    }

    /// World-space minimum corner of a chunk
    pub fn chunk_origin(&self, coord: ChunkCoord) -> Vec3 {
        coord.world_origin(self.chunk_world_size())
    }


    /// Current priority of a chunk for the last known observer
    pub fn priority_of(&self, coord: ChunkCoord) -> f32 {
        chunk_priority(self.config.priority_scale, self.observer, coord.world_center(self.chunk_world_size()))
    }

    /// Queue a chunk for generation
    ///
    /// Returns `false` when the chunk is already tracked or queued.
    pub fn request_chunk(&mut self, coord: ChunkCoord) -> bool {
        if self.chunks.contains_key(&coord) || self.queue.contains(coord) {
            return false;
        }
        let priority = self.priority_of(coord);
        self.queue.push(GenerationTask { coord, priority })
    }

    /// Coordinates within the view sphere around `center`
    pub fn required_set(&self, center: ChunkCoord) -> HashSet<ChunkCoord> {
        let r = self.config.view_distance as i32;
        let v = self.config.vertical_view_limit.map_or(r, |limit| r.min(limit as i32));
        let r_sq = (r as i64) * (r as i64);

        let mut required = HashSet::new();
        for dx in -r..=r {
            for dy in -v..=v {
                for dz in -r..=r {
                    let offset = center.offset(dx, dy, dz);
                    if offset.distance_squared(center) <= r_sq {
                        required.insert(offset);
                    }
                }
            }
        }
        required
    }

    /// Move the observer: request missing chunks and evict stale ones
    ///
    /// Chunks that are still generating are evicted once their result has
    /// been integrated, never interrupted.
    pub fn update_around_observer(&mut self, position: Vec3) {
        self.observer = Some(position);
        let required = self.required_set(self.world_to_chunk(position));

        let mut missing: Vec<ChunkCoord> = required
            .iter()
            .copied()
            .filter(|c| !self.chunks.contains_key(c))
            .collect();
        missing.sort();
        for coord in missing {
            self.request_chunk(coord);
        }

        let unwanted: Vec<ChunkCoord> = self
            .queue
            .iter()
            .map(|t| t.coord)
            .filter(|c| !required.contains(c))
            .collect();
        for coord in unwanted {
            self.queue.remove(coord);
        }

        let scale = self.config.priority_scale;
        let size = self.chunk_world_size();
        self.queue
            .reprioritize(|c| chunk_priority(scale, Some(position), c.world_center(size)));

        let stale: Vec<ChunkCoord> = self
            .chunks
            .keys()
            .copied()
            .filter(|c| !required.contains(c))
            .collect();
        for coord in stale {
            let generating = self.chunks.get(&coord).is_some_and(|s| s.is_generating());
            if generating {
                log::trace!("Deferring eviction of generating chunk {}", coord);
                self.pending_evictions.insert(coord);
            } else {
                self.evict(coord);
            }
        }
        self.pending_evictions.retain(|c| !required.contains(c));
        self.required = required;
    }

    /// Run one scheduling step
    ///
    /// Integrates finished background work, then starts up to
    /// `chunks_per_tick` generations (dirty chunks first, then the
    /// highest priority queued chunks) and refreshes LOD buckets.
    pub fn tick(&mut self) -> TickSummary {
        let mut summary = TickSummary::default();

        let results = match self.worker.as_mut() {
            Some(worker) => worker.poll_results(),
            None => Vec::new(),
        };
        for result in results {
            self.integrate(result, &mut summary);
        }

        let budget = self.config.chunks_per_tick;

        let mut dirty: Vec<ChunkCoord> = self
            .chunks
            .values()
            .filter(|s| s.is_dirty() && !s.is_generating())
            .map(|s| s.coord())
            .collect();
        dirty.sort_by(|a, b| self.priority_of(*b).total_cmp(&self.priority_of(*a)));
        // Aborted launches still use up the budget
        let mut issued = 0;
        for coord in dirty.into_iter().take(budget) {
            issued += 1;
            if self.launch(coord, &mut summary) {
                summary.started += 1;
            }
        }

        while issued < budget {
            let Some(task) = self.queue.pop() else {
                break;
            };
            if self.chunks.contains_key(&task.coord) {
                continue;
            }
            let slot = match self.pool.acquire(task.coord, self.chunks.len()) {
                Ok(slot) => slot,
                Err(e) => {
                    log::error!("Dropping generation of chunk {}: {}", task.coord, e);
                    continue;
                }
            };
            self.chunks.insert(task.coord, slot);
            issued += 1;
            if self.launch(task.coord, &mut summary) {
                summary.started += 1;
            }
        }

        self.update_lods();

        // Synchronous generations may have finished chunks that were waiting
        let ready: Vec<ChunkCoord> = self
            .pending_evictions
            .iter()
            .copied()
            .filter(|c| self.chunks.get(c).is_none_or(|s| !s.is_generating()))
            .collect();
        for coord in ready {
            if self.evict(coord) {
                summary.evicted += 1;
            }
        }

        summary
    }

    /// Issue a generation for a tracked chunk
    ///
    /// Returns `false` when the generation was aborted before it started.
    fn launch(&mut self, coord: ChunkCoord, summary: &mut TickSummary) -> bool {
        let extent = self.extent;
        let size = extent.world_size();
        let origin = coord.world_origin(size);
        // Gradient normals sample half a voxel outside the chunk
        let bounds = {
            let mut b = coord.world_bounds(size);
            b.min -= Vec3::splat(extent.voxel_size);
            b.max += Vec3::splat(extent.voxel_size);
            b
        };
        let edits: Vec<DensityEdit> = self.edits.iter().copied().filter(|e| e.affects(&bounds)).collect();
        let priority = self.priority_of(coord);
        let is_async = self.worker.is_some();

        let Some(slot) = self.chunks.get_mut(&coord) else {
            return false;
        };
        let epoch = slot.begin_generation();
        if let Err(e) = extent.validate() {
            log::error!("Aborting generation of chunk {}: {}", coord, e);
            slot.abort_generation();
            return false;
        }

        let job = GenerationJob {
            slot: slot.id(),
            epoch,
            coord,
            priority,
            origin,
            extent,
            density: self.config.density.clone(),
            edits,
            meshing: self.config.meshing.clone(),
            average_normals: !is_async && self.config.meshing.average_normals_on_merge,
        };

        if let Some(worker) = self.worker.as_mut() {
            if let Err(e) = worker.submit(job) {
                log::error!("Could not queue chunk {}: {}", coord, e);
                if let Some(slot) = self.chunks.get_mut(&coord) {
                    slot.abort_generation();
                }
                return false;
            }
            return true;
        }

        let result = run_job(job);
        self.integrate(result, summary);
        true
    }

    /// Apply a finished generation if its slot is still waiting for it
    fn integrate(&mut self, result: GenerationResult, summary: &mut TickSummary) {
        let coord = result.coord();
        let live = self
            .chunks
            .get(&coord)
            .is_some_and(|s| s.id() == result.slot() && s.is_current(result.epoch()));
        if !live {
            log::trace!("Discarding stale result for chunk {}", coord);
            summary.discarded += 1;
            return;
        }
        let Some(slot) = self.chunks.get_mut(&coord) else {
            return;
        };

        match result {
            GenerationResult::Completed(chunk) => {
                let event = ChunkEvent::Generated {
                    coord,
                    vertices: chunk.mesh.vertex_count(),
                    triangles: chunk.mesh.triangle_count(),
                };
                slot.commit(chunk.mesh, chunk.field);
                summary.committed += 1;
                self.notify(&event);
            }
            GenerationResult::Failed { error, .. } => {
                log::warn!("Generation of chunk {} failed: {}", coord, error);
                slot.abort_generation();
            }
        }

        if self.pending_evictions.contains(&coord)
            && !self.required.contains(&coord)
            && self.evict(coord)
        {
            summary.evicted += 1;
        }
    }

    /// Remove a chunk from the registry and return its slot to the pool
    ///
    /// Returns `false` if the chunk was not tracked.
    fn evict(&mut self, coord: ChunkCoord) -> bool {
        self.pending_evictions.remove(&coord);
        let Some(slot) = self.chunks.remove(&coord) else {
            return false;
        };
        let pooled = self.pool.release(slot);
        log::debug!("Evicted chunk {} ({})", coord, if pooled { "pooled" } else { "discarded" });
        self.notify(&ChunkEvent::Evicted { coord });
        true
    }

    fn update_lods(&mut self) {
        let Some(observer) = self.observer else {
            return;
        };
        let size = self.chunk_world_size();
        let mut changed = Vec::new();
        for slot in self.chunks.values_mut() {
            let distance = observer.distance(slot.coord().world_center(size));
            let lod = self.config.lod.lod_for_distance(distance);
            if slot.set_lod(lod) {
                changed.push(ChunkEvent::LodChanged { coord: slot.coord(), lod });
            }
        }
        for event in &changed {
            self.notify(event);
        }
    }

    fn notify(&mut self, event: &ChunkEvent) {
        for listener in &mut self.listeners {
            listener(event);
        }
    }

    /// Apply a spherical density edit and mark affected chunks for rebuild
    ///
    /// Returns the number of tracked chunks marked dirty.
    pub fn modify_region(&mut self, center: Vec3, radius: f32, strength: f32) -> usize {
        if !(radius.is_finite() && radius > 0.0 && strength.is_finite()) {
            log::warn!("Ignoring region edit at {:?} with radius {} strength {}", center, radius, strength);
            return 0;
        }
        let edit = DensityEdit::new(center, radius, strength);
        self.edits.push(edit);

        let size = self.chunk_world_size();
        let mut marked = 0;
        for slot in self.chunks.values_mut() {
            if edit.affects(&slot.coord().world_bounds(size)) {
                slot.mark_dirty();
                marked += 1;
            }
        }
        log::debug!("Region edit at {:?} r={} marked {} chunks dirty", center, radius, marked);
        marked
    }

    /// Region edits applied so far
    pub fn edits(&self) -> &[DensityEdit] {
        &self.edits
    }

    /// Evaluate the edited density field at a world position
    pub fn sample_density_at(&self, world: Vec3) -> f32 {
        EditedDensity::new(&self.sampler, &self.edits).density(world)
    }

    /// Release every chunk and queue the required set again
    pub fn regenerate_all(&mut self) {
        log::info!("Regenerating {} chunks", self.chunks.len());
        self.release_all();
        if let Some(position) = self.observer {
            self.update_around_observer(position);
        }
    }

    /// Change the chunk lattice and regenerate everything
    ///
    /// The extent is not validated here; an invalid one aborts every
    /// generation, leaving chunks tracked without meshes.
    pub fn set_chunk_extent(&mut self, extent: ChunkExtent) {
        if let Err(e) = extent.validate() {
            log::warn!("Chunk extent {:?} is invalid: {}", extent, e);
        }
        self.extent = extent;
        self.config.voxel_size = extent.voxel_size;
        self.config.chunk_size = extent.chunk_size;
        self.regenerate_all();
    }

    /// Drop every tracked and queued chunk
    pub fn clear(&mut self) {
        self.release_all();
        self.pool.clear();
    }

    fn release_all(&mut self) {
        let coords: Vec<ChunkCoord> = self.chunks.keys().copied().collect();
        for coord in coords {
            self.evict(coord);
        }
        self.queue.clear();
        self.pending_evictions.clear();
        self.required.clear();
    }

    /// Observable state of a coordinate
    pub fn chunk_state(&self, coord: ChunkCoord) -> ChunkState {
        match self.chunks.get(&coord) {
            Some(slot) if slot.is_generating() => ChunkState::Generating,
            Some(_) => ChunkState::Active,
            None if self.queue.contains(coord) => ChunkState::Queued,
            None => ChunkState::NotTracked,
        }
    }

    /// Shared buffers of a tracked chunk, for the renderer
    pub fn chunk_buffers(&self, coord: ChunkCoord) -> Option<SharedBuffers> {
        self.chunks.get(&coord).map(|s| s.buffers())
    }

    /// Whether a tracked chunk has committed buffers
    pub fn has_mesh(&self, coord: ChunkCoord) -> bool {
        self.chunks.get(&coord).is_some_and(|s| s.has_mesh())
    }

    pub fn chunk_lod(&self, coord: ChunkCoord) -> Option<u32> {
        self.chunks.get(&coord).map(|s| s.lod())
    }

    /// Tracked chunk coordinates
    pub fn tracked(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        self.chunks.keys().copied()
    }

    /// Queued tasks from highest to lowest priority
    pub fn queued(&self) -> impl Iterator<Item = &GenerationTask> {
        self.queue.iter()
    }

    /// Nothing queued and nothing generating
    pub fn is_idle(&self) -> bool {
        self.queue.is_empty() && self.chunks.values().all(|s| !s.is_generating())
    }

    pub fn statistics(&self) -> ChunkStatistics {
        let active = self.chunks.len();
        let pooled = self.pool.len();
        ChunkStatistics {
            total: active + pooled,
            active,
            generating: self.chunks.values().filter(|s| s.is_generating()).count(),
            pooled,
            queued: self.queue.len(),
            pending_evictions: self.pending_evictions.len(),
        }
    }
}
