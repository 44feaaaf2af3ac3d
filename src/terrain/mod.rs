//! Procedural density generation

pub mod density;

pub use density::{DensityFn, DensityParams, DensitySampler, ThresholdProbe};
