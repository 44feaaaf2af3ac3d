//! Chunk coordinates and extents

use crate::core::error::Error;
use crate::core::types::{Result, Vec3};
use crate::math::Aabb;
use serde::{Deserialize, Serialize};

/// Largest supported chunk size in voxels per axis
pub const MAX_CHUNK_SIZE: u32 = 128;

/// Integer coordinate identifying a chunk in the world grid
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl ChunkCoord {
    /// Create a new chunk coordinate
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Convert world position to chunk coordinate (floors towards negative infinity)
    pub fn from_world_pos(pos: Vec3, chunk_world_size: f32) -> Self {
        Self {
            x: (pos.x / chunk_world_size).floor() as i32,
            y: (pos.y / chunk_world_size).floor() as i32,
            z: (pos.z / chunk_world_size).floor() as i32,
        }
    }

    /// Get the world-space origin (minimum corner) of this chunk
    pub fn world_origin(&self, chunk_world_size: f32) -> Vec3 {
        Vec3::new(
            self.x as f32 * chunk_world_size,
            self.y as f32 * chunk_world_size,
            self.z as f32 * chunk_world_size,
        )
    }

    /// Get the world-space bounds of this chunk
    pub fn world_bounds(&self, chunk_world_size: f32) -> Aabb {
        Aabb::from_origin_extent(self.world_origin(chunk_world_size), chunk_world_size)
    }

    /// World-space center of this chunk
    pub fn world_center(&self, chunk_world_size: f32) -> Vec3 {
        self.world_bounds(chunk_world_size).center()
    }

    /// Squared distance to another coordinate, in chunk units
    pub fn distance_squared(&self, other: ChunkCoord) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        let dz = (self.z - other.z) as i64;
        dx * dx + dy * dy + dz * dz
    }

    /// Offset this coordinate by a delta
    pub fn offset(&self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }
}

impl std::fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Lattice resolution of a chunk
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChunkExtent {
    /// World units per lattice step
    pub voxel_size: f32,
    /// Voxels per axis
    pub chunk_size: u32,
}

impl ChunkExtent {
    pub fn new(voxel_size: f32, chunk_size: u32) -> Self {
        Self { voxel_size, chunk_size }
    }

    /// Edge length of one chunk in world units
    pub fn world_size(&self) -> f32 {
        self.voxel_size * self.chunk_size as f32
    }

    /// Lattice samples per axis (`chunk_size + 1`)
    pub fn samples_per_axis(&self) -> usize {
        self.chunk_size as usize + 1
    }

    /// Reject chunk sizes outside `1..=128` and non-positive voxel sizes
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 || self.chunk_size > MAX_CHUNK_SIZE {
            return Err(Error::InvalidChunkSize(self.chunk_size));
        }
        if !(self.voxel_size.is_finite() && self.voxel_size > 0.0) {
            return Err(Error::InvalidVoxelSize(self.voxel_size));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_coord_new() {
        let coord = ChunkCoord::new(1, 2, 3);
        assert_eq!(coord.x, 1);
        assert_eq!(coord.y, 2);
        assert_eq!(coord.z, 3);
    }

    #[test]
    fn test_from_world_pos() {
        let cs = 3200.0;
        assert_eq!(ChunkCoord::from_world_pos(Vec3::splat(1600.0), cs), ChunkCoord::new(0, 0, 0));
        assert_eq!(
            ChunkCoord::from_world_pos(Vec3::new(3200.0, 6399.0, 0.0), cs),
            ChunkCoord::new(1, 1, 0)
        );
    }

    #[test]
    fn test_from_world_pos_negative() {
        let coord = ChunkCoord::from_world_pos(Vec3::new(-0.5, -3200.0, -3200.5), 3200.0);
        assert_eq!(coord, ChunkCoord::new(-1, -1, -2));
    }

    #[test]
    fn test_world_origin_roundtrip() {
        let cs = 64.0;
        let coord = ChunkCoord::new(-3, 0, 7);
        let origin = coord.world_origin(cs);
        assert_eq!(origin, Vec3::new(-192.0, 0.0, 448.0));
        assert_eq!(ChunkCoord::from_world_pos(origin + Vec3::splat(1.0), cs), coord);
    }

    #[test]
    fn test_world_center() {
        let coord = ChunkCoord::new(-1, 0, 2);
        assert_eq!(coord.world_center(8.0), Vec3::new(-4.0, 4.0, 20.0));
        assert!(coord.world_bounds(8.0).intersects_sphere(coord.world_center(8.0), 0.0));
    }

    #[test]
    fn test_distance_squared() {
        let a = ChunkCoord::new(0, 0, 0);
        assert_eq!(a.distance_squared(ChunkCoord::new(1, 1, 1)), 3);
        assert_eq!(a.distance_squared(ChunkCoord::new(-2, 0, 0)), 4);
    }

    #[test]
    fn test_extent_validate() {
        assert!(ChunkExtent::new(50.0, 64).validate().is_ok());
        assert!(ChunkExtent::new(1.0, 1).validate().is_ok());
        assert!(ChunkExtent::new(1.0, 128).validate().is_ok());
        assert!(matches!(ChunkExtent::new(1.0, 0).validate(), Err(Error::InvalidChunkSize(0))));
        assert!(matches!(ChunkExtent::new(1.0, 129).validate(), Err(Error::InvalidChunkSize(129))));
        assert!(matches!(ChunkExtent::new(0.0, 8).validate(), Err(Error::InvalidVoxelSize(_))));
        assert!(ChunkExtent::new(-2.0, 8).validate().is_err());
        assert!(ChunkExtent::new(f32::NAN, 8).validate().is_err());
    }

    #[test]
    fn test_extent_world_size() {
        let extent = ChunkExtent::new(50.0, 64);
        assert_eq!(extent.world_size(), 3200.0);
        assert_eq!(extent.samples_per_axis(), 65);
    }
}
