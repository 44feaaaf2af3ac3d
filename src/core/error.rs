//! Error types for cave generation

use thiserror::Error;

/// Main error type for the crate
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid chunk size {0} (expected 1..=128)")]
    InvalidChunkSize(u32),

    #[error("invalid voxel size {0} (must be finite and > 0)")]
    InvalidVoxelSize(f32),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("density field has {actual} samples, expected {expected}")]
    FieldSize { expected: usize, actual: usize },

    #[error("chunk slot limit reached ({limit} active chunks)")]
    SlotExhausted { limit: usize },

    #[error("Streaming error: {0}")]
    Streaming(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
