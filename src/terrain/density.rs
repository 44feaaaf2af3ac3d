//! Procedural cave density function
//!
//! Density is a scalar over world space. Values below the meshing threshold
//! are open cave space, values above it are rock. The field has no bounded
//! range; callers only ever compare it against a threshold.

use glam::Vec3;
use noise::{NoiseFn, Perlin};
use serde::{Deserialize, Serialize};

/// A low-frequency noise probe that carves a void wherever it dips below `cutoff`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThresholdProbe {
    /// Frequency applied on top of the sampler's base frequency
    pub frequency: f32,
    /// Noise value below which the probe fires
    pub cutoff: f32,
    /// Amount subtracted from the density when it fires
    pub depth: f32,
}

/// Parameters controlling cave density
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DensityParams {
    pub seed: u32,
    pub frequency: f32,        // World-to-noise scale
    pub octaves: u32,          // Detail octaves summed before negation
    pub octave_frequency: f32, // Frequency of the first octave
    pub lacunarity: f32,       // Frequency multiplier per octave
    pub persistence: f32,      // Amplitude multiplier per octave
    pub open_bias: f32,        // Constant pushing the field towards open space
    pub floor_offset: f32,     // Height where the vertical gradient is zero
    pub floor_span: f32,       // Height range over which the gradient adds `floor_weight`
    pub floor_weight: f32,
    pub chamber: ThresholdProbe,
    pub tunnel: ThresholdProbe,
}

impl Default for DensityParams {
    fn default() -> Self {
        Self {
            seed: 12345,
            frequency: 0.002,
            octaves: 2,
            octave_frequency: 0.3,
            // 0.3 -> 0.8 between the two octaves
            lacunarity: 8.0 / 3.0,
            persistence: 0.3,
            open_bias: 0.2,
            floor_offset: 5000.0,
            floor_span: 20000.0,
            floor_weight: 0.2,
            chamber: ThresholdProbe { frequency: 0.05, cutoff: -0.1, depth: 1.5 },
            tunnel: ThresholdProbe { frequency: 0.1, cutoff: -0.2, depth: 0.8 },
        }
    }
}

/// A density function that can be evaluated from any thread
pub trait DensityFn: Send + Sync {
    /// Evaluate the density at a world-space position
    fn density(&self, world: Vec3) -> f32;
}

impl<F> DensityFn for F
where
    F: Fn(Vec3) -> f32 + Send + Sync,
{
    fn density(&self, world: Vec3) -> f32 {
        self(world)
    }
}

/// Seeded cave density sampler
///
/// Pure: identical input always yields identical output, on any thread.
pub struct DensitySampler {
    params: DensityParams,
    noise: Perlin,
}

impl DensitySampler {
    /// Create a sampler with the given parameters
    pub fn new(params: DensityParams) -> Self {
        let noise = Perlin::new(params.seed);
        Self { params, noise }
    }

    /// Get sampler parameters
    pub fn params(&self) -> &DensityParams {
        &self.params
    }

    /// Sample the density at a world position
    pub fn sample(&self, world: Vec3) -> f32 {
        let p = &self.params;
        let q = world * p.frequency;

        let mut sum = 0.0;
        let mut freq = p.octave_frequency;
        let mut amp = 1.0;
        for _ in 0..p.octaves {
            sum += self.perlin(q * freq) * amp;
            freq *= p.lacunarity;
            amp *= p.persistence;
        }

        let mut density = -sum + p.open_bias;
        density += ((world.y - p.floor_offset) / p.floor_span) * p.floor_weight;

        for probe in [&p.chamber, &p.tunnel] {
            if self.perlin(q * probe.frequency) < probe.cutoff {
                density -= probe.depth;
            }
        }

        density
    }

    fn perlin(&self, p: Vec3) -> f32 {
        self.noise.get([p.x as f64, p.y as f64, p.z as f64]) as f32
    }
}

impl DensityFn for DensitySampler {
    fn density(&self, world: Vec3) -> f32 {
        self.sample(world)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;

    fn flat_params() -> DensityParams {
        DensityParams {
            octaves: 0,
            chamber: ThresholdProbe { frequency: 0.05, cutoff: -10.0, depth: 1.5 },
            tunnel: ThresholdProbe { frequency: 0.1, cutoff: -10.0, depth: 0.8 },
            ..Default::default()
        }
    }

    #[test]
    fn test_sample_deterministic() {
        let sampler = DensitySampler::new(DensityParams::default());
        let p = Vec3::new(1234.5, -678.25, 91011.0);
        assert_eq!(sampler.sample(p).to_bits(), sampler.sample(p).to_bits());

        // Same seed, separate instance
        let other = DensitySampler::new(DensityParams::default());
        assert_eq!(sampler.sample(p).to_bits(), other.sample(p).to_bits());
    }

    #[test]
    fn test_sample_deterministic_across_threads() {
        let sampler = DensitySampler::new(DensityParams::default());
        let points: Vec<Vec3> = (0..512)
            .map(|i| Vec3::new(i as f32 * 37.0, i as f32 * -11.5, i as f32 * 3.25))
            .collect();

        let serial: Vec<u32> = points.iter().map(|&p| sampler.sample(p).to_bits()).collect();
        let parallel: Vec<u32> = points.par_iter().map(|&p| sampler.sample(p).to_bits()).collect();
        assert_eq!(serial, parallel);
    }

    #[test]
    fn test_seed_changes_field() {
        let a = DensitySampler::new(DensityParams { seed: 1, ..Default::default() });
        let b = DensitySampler::new(DensityParams { seed: 2, ..Default::default() });
        let differs = (0..64).any(|i| {
            let p = Vec3::new(i as f32 * 173.0, i as f32 * 59.0, i as f32 * 311.0);
            a.sample(p) != b.sample(p)
        });
        assert!(differs);
    }

    #[test]
    fn test_vertical_gradient() {
        // Without octaves or probes only the bias and floor gradient remain
        let sampler = DensitySampler::new(flat_params());

        let at_offset = sampler.sample(Vec3::new(10.0, 5000.0, -3.0));
        assert!((at_offset - 0.2).abs() < 1e-6);

        let one_span_up = sampler.sample(Vec3::new(10.0, 25000.0, -3.0));
        assert!((one_span_up - 0.4).abs() < 1e-6);

        // Lower is less dense
        assert!(sampler.sample(Vec3::new(0.0, 0.0, 0.0)) < at_offset);
    }

    #[test]
    fn test_probe_carves_void() {
        let base = DensitySampler::new(flat_params());

        // A cutoff above the noise range always fires
        let carved = DensitySampler::new(DensityParams {
            chamber: ThresholdProbe { frequency: 0.05, cutoff: 2.0, depth: 1.5 },
            ..flat_params()
        });

        let p = Vec3::new(250.0, 5000.0, 125.0);
        assert!((base.sample(p) - carved.sample(p) - 1.5).abs() < 1e-5);
    }

    #[test]
    fn test_closure_density_fn() {
        let plane = |p: Vec3| p.y - 2.0;
        assert_eq!(plane.density(Vec3::new(0.0, 5.0, 0.0)), 3.0);
    }

    #[test]
    fn test_params_json_defaults() {
        let params: DensityParams = serde_json::from_str(r#"{"seed": 7}"#).unwrap();
        assert_eq!(params.seed, 7);
        assert_eq!(params.octaves, 2);
        assert_eq!(params.chamber, DensityParams::default().chamber);
    }
}
