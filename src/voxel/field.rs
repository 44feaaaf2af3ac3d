//! Dense per-chunk density cache
//!
//! Stores `(chunk_size + 1)^3` samples, indexed `x + y*S + z*S*S` with
//! `S = chunk_size + 1`. A field is always fully populated.

use crate::core::error::Error;
use crate::core::types::{Result, Vec3};
use crate::terrain::DensityFn;
use crate::voxel::chunk::ChunkExtent;
use rayon::prelude::*;

/// Density reported for lattice points outside the cache
pub const OUTSIDE_DENSITY: f32 = 1.0;

/// Sampled density lattice for one chunk
#[derive(Clone, Debug, PartialEq)]
pub struct DensityField {
    chunk_size: u32,
    values: Vec<f32>,
}

impl DensityField {
    /// Sample `density` at every lattice point of a chunk
    ///
    /// Lattice point `(x, y, z)` maps to `origin + (x, y, z) * voxel_size`.
    /// Z-slices are filled in parallel.
    pub fn build<D: DensityFn + ?Sized>(origin: Vec3, extent: ChunkExtent, density: &D) -> Result<Self> {
        extent.validate()?;

        let s = extent.samples_per_axis();
        let voxel = extent.voxel_size;
        let mut values = vec![0.0f32; s * s * s];

        values.par_chunks_mut(s * s).enumerate().for_each(|(z, slice)| {
            for y in 0..s {
                for x in 0..s {
                    let world = origin + Vec3::new(x as f32, y as f32, z as f32) * voxel;
                    slice[x + y * s] = density.density(world);
                }
            }
        });

        Ok(Self { chunk_size: extent.chunk_size, values })
    }

    /// Wrap precomputed samples; the length must be exactly `(chunk_size + 1)^3`
    pub fn from_values(chunk_size: u32, values: Vec<f32>) -> Result<Self> {
        let s = chunk_size as usize + 1;
        let expected = s * s * s;
        if values.len() != expected {
            return Err(Error::FieldSize { expected, actual: values.len() });
        }
        Ok(Self { chunk_size, values })
    }

    /// Fill a field from a function of lattice indices
    pub fn from_fn(chunk_size: u32, f: impl Fn(u32, u32, u32) -> f32) -> Self {
        let s = chunk_size + 1;
        let mut values = Vec::with_capacity((s as usize).pow(3));
        for z in 0..s {
            for y in 0..s {
                for x in 0..s {
                    values.push(f(x, y, z));
                }
            }
        }
        Self { chunk_size, values }
    }

    /// Field with every sample set to `value`
    pub fn uniform(chunk_size: u32, value: f32) -> Self {
        let s = chunk_size as usize + 1;
        Self { chunk_size, values: vec![value; s * s * s] }
    }

    pub fn chunk_size(&self) -> u32 {
        self.chunk_size
    }

    /// Samples per axis
    pub fn samples_per_axis(&self) -> usize {
        self.chunk_size as usize + 1
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Flat index of a lattice point
    #[inline]
    pub fn index(&self, x: usize, y: usize, z: usize) -> usize {
        let s = self.samples_per_axis();
        x + y * s + z * s * s
    }

    /// Sample at a lattice point, if it is inside the cache
    #[inline]
    pub fn get(&self, x: usize, y: usize, z: usize) -> Option<f32> {
        let s = self.samples_per_axis();
        if x < s && y < s && z < s {
            Some(self.values[self.index(x, y, z)])
        } else {
            None
        }
    }

    /// Sample at a lattice point, treating anything outside the cache as solid
    #[inline]
    pub fn get_or_solid(&self, x: usize, y: usize, z: usize) -> f32 {
        self.get(x, y, z).unwrap_or(OUTSIDE_DENSITY)
    }
}
