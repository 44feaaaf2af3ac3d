//! Cavern - streaming marching-cubes cave terrain
//!
//! Density sampling, chunk field caching, mesh extraction and
//! post-processing, and the chunk generation scheduler that streams
//! meshes around a moving observer.

pub mod core;
pub mod math;
pub mod terrain;
pub mod voxel;
pub mod mesh;
pub mod generation;
pub mod streaming;
