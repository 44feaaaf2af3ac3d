//! Chunk streaming: generation queue, slot pooling, LOD and scheduling

pub mod priority;
pub mod lod;
pub mod slot;
pub mod pool;
pub mod worker;
pub mod scheduler;

pub use priority::{chunk_priority, GenerationQueue, GenerationTask};
pub use lod::{LodConfig, LOD_DISTANCES};
pub use slot::{ChunkSlot, SharedBuffers, SlotBuffers, SlotState};
pub use pool::{ChunkPool, DEFAULT_POOL_CAPACITY};
pub use worker::{GenerationResult, MeshWorker};
pub use scheduler::{
    ChunkEvent, ChunkListener, ChunkScheduler, ChunkState, ChunkStatistics, TickSummary,
};
