//! Distance-based level-of-detail buckets
//!
//! A chunk's LOD is the number of thresholds its center lies beyond:
//! - LOD 0: closer than 5000 units
//! - LOD 1: 5000-10000
//! - LOD 2: 10000-20000
//! - LOD 3: beyond 20000

use serde::{Deserialize, Serialize};

/// Default LOD thresholds in world units
pub const LOD_DISTANCES: [f32; 3] = [5000.0, 10000.0, 20000.0];

/// Configuration for LOD behavior
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LodConfig {
    /// Ascending distance thresholds
    pub distances: Vec<f32>,
}

impl Default for LodConfig {
    fn default() -> Self {
        Self {
            distances: LOD_DISTANCES.to_vec(),
        }
    }
}

impl LodConfig {
    /// Coarsest LOD level this configuration can produce
    pub fn max_lod(&self) -> u32 {
        self.distances.len() as u32
    }

    /// Calculate LOD level from distance
    ///
    /// # Examples
    /// ```
    /// use cavern::streaming::lod::LodConfig;
    ///
    /// let lod = LodConfig::default();
    /// assert_eq!(lod.lod_for_distance(100.0), 0);
    /// assert_eq!(lod.lod_for_distance(5000.0), 0);
    /// assert_eq!(lod.lod_for_distance(7500.0), 1);
    /// assert_eq!(lod.lod_for_distance(50000.0), 3);
    /// ```
    pub fn lod_for_distance(&self, distance: f32) -> u32 {
        self.distances.iter().filter(|&&d| distance > d).count() as u32
    }

    /// Whether the thresholds are finite, non-negative and ascending
    pub fn is_valid(&self) -> bool {
        self.distances.iter().all(|d| d.is_finite() && *d >= 0.0)
            && self.distances.windows(2).all(|w| w[0] <= w[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lod_boundaries() {
        let lod = LodConfig::default();
        assert_eq!(lod.lod_for_distance(0.0), 0);
        assert_eq!(lod.lod_for_distance(5000.0), 0);
        assert_eq!(lod.lod_for_distance(5000.1), 1);
        assert_eq!(lod.lod_for_distance(10000.0), 1);
        assert_eq!(lod.lod_for_distance(10001.0), 2);
        assert_eq!(lod.lod_for_distance(20001.0), 3);
        assert_eq!(lod.lod_for_distance(f32::MAX), lod.max_lod());
    }

    #[test]
    fn test_lod_monotonic() {
        let lod = LodConfig::default();
        let mut last = 0;
        for i in 0..300 {
            let level = lod.lod_for_distance(i as f32 * 100.0);
            assert!(level >= last);
            last = level;
        }
    }

    #[test]
    fn test_validity() {
        assert!(LodConfig::default().is_valid());
        assert!(!LodConfig { distances: vec![10.0, 5.0] }.is_valid());
        assert!(!LodConfig { distances: vec![f32::NAN] }.is_valid());
        assert!(LodConfig { distances: vec![] }.is_valid());
    }
}
