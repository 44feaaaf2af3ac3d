//! Chunk grid, density caches and edits

pub mod chunk;
pub mod field;
pub mod edit;

pub use chunk::{ChunkCoord, ChunkExtent, MAX_CHUNK_SIZE};
pub use field::DensityField;
pub use edit::{DensityEdit, EditedDensity};
