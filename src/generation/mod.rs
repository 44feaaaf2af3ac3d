//! Chunk generation: configuration and the field-to-mesh pipeline

pub mod config;
pub mod pipeline;

pub use config::{MeshingConfig, WorldConfig};
pub use pipeline::{GeneratedChunk, GenerationJob, GenerationStats};
