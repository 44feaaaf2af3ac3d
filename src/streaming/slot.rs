//! Chunk slots: the per-chunk record the scheduler tracks
//!
//! A slot owns at most one mesh and density cache. The buffers sit behind a
//! per-slot mutex because a renderer may read them while the scheduler
//! commits a new generation; the lock is only taken for the commit itself.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use crate::mesh::ChunkMesh;
use crate::voxel::{ChunkCoord, DensityField};

/// Generation state of a slot
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotState {
    /// No generation in flight
    Idle,
    /// A generation has been issued and not yet integrated
    Generating,
}

/// Mesh and density buffers owned by a slot
#[derive(Debug, Default)]
pub struct SlotBuffers {
    pub mesh: ChunkMesh,
    pub field: Option<DensityField>,
}

/// Buffers shared with the rendering side
pub type SharedBuffers = Arc<Mutex<SlotBuffers>>;

/// Mutable record for one tracked chunk
#[derive(Debug)]
pub struct ChunkSlot {
    id: u64,
    coord: ChunkCoord,
    state: SlotState,
    /// Bumped on every generation start and every release
    epoch: u64,
    lod: u32,
    last_touch: Instant,
    dirty: bool,
    has_mesh: bool,
    buffers: SharedBuffers,
}

impl ChunkSlot {
    /// Create a fresh idle slot
    pub fn new(id: u64, coord: ChunkCoord) -> Self {
        Self {
            id,
            coord,
            state: SlotState::Idle,
            epoch: 0,
            lod: 0,
            last_touch: Instant::now(),
            dirty: false,
            has_mesh: false,
            buffers: Arc::new(Mutex::new(SlotBuffers::default())),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    pub fn state(&self) -> SlotState {
        self.state
    }

    pub fn is_generating(&self) -> bool {
        self.state == SlotState::Generating
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn lod(&self) -> u32 {
        self.lod
    }

    /// Set the LOD bucket; returns whether it changed
    pub fn set_lod(&mut self, lod: u32) -> bool {
        let changed = self.lod != lod;
        self.lod = lod;
        changed
    }

    pub fn last_touch(&self) -> Instant {
        self.last_touch
    }

    pub fn touch(&mut self) {
        self.last_touch = Instant::now();
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Whether a generation has ever been committed since the slot was assigned
    pub fn has_mesh(&self) -> bool {
        self.has_mesh
    }

    /// Shared handle to the slot's buffers
    pub fn buffers(&self) -> SharedBuffers {
        Arc::clone(&self.buffers)
    }

    /// Point a recycled slot at a new coordinate
    pub fn assign(&mut self, coord: ChunkCoord) {
        self.coord = coord;
        self.touch();
    }

    /// Mark the slot busy and return the epoch the new generation must match
    pub fn begin_generation(&mut self) -> u64 {
        self.epoch += 1;
        self.state = SlotState::Generating;
        self.dirty = false;
        self.epoch
    }

    /// Whether a result issued at `epoch` still belongs to this slot
    pub fn is_current(&self, epoch: u64) -> bool {
        self.state == SlotState::Generating && self.epoch == epoch
    }

    /// Install freshly generated buffers and go idle
    pub fn commit(&mut self, mesh: ChunkMesh, field: Option<DensityField>) {
        {
            let mut buffers = lock(&self.buffers);
            buffers.mesh = mesh;
            buffers.field = field;
        }
        self.state = SlotState::Idle;
        self.has_mesh = true;
        self.touch();
    }

    /// Go idle without touching the buffers
    pub fn abort_generation(&mut self) {
        self.state = SlotState::Idle;
    }

    /// Clear everything before the slot goes back to the pool
    ///
    /// Bumps the epoch so any result still in flight for the old
    /// assignment is discarded.
    pub fn reset(&mut self) {
        {
            let mut buffers = lock(&self.buffers);
            buffers.mesh.clear();
            buffers.field = None;
        }
        self.epoch += 1;
        self.state = SlotState::Idle;
        self.lod = 0;
        self.dirty = false;
        self.has_mesh = false;
    }
}

/// Lock slot buffers, recovering from a poisoned lock
pub fn lock(buffers: &SharedBuffers) -> MutexGuard<'_, SlotBuffers> {
    buffers.lock().unwrap_or_else(|e| e.into_inner())
}
