//! Axis-aligned bounding box

use crate::core::types::Vec3;

/// Axis-aligned bounding box defined by min and max corners
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Create a cube from its minimum corner and edge length
    pub fn from_origin_extent(origin: Vec3, extent: f32) -> Self {
        Self {
            min: origin,
            max: origin + Vec3::splat(extent),
        }
    }

    /// Get center point
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Closest point inside the box to `p`
    pub fn closest_point(&self, p: Vec3) -> Vec3 {
        p.clamp(self.min, self.max)
    }

    /// Check if a sphere overlaps the box (touching counts)
    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        self.closest_point(center).distance_squared(center) <= radius * radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center() {
        let aabb = Aabb::from_origin_extent(Vec3::new(-2.0, 0.0, 4.0), 4.0);
        assert_eq!(aabb.center(), Vec3::new(0.0, 2.0, 6.0));
    }

    #[test]
    fn test_from_origin_extent() {
        let aabb = Aabb::from_origin_extent(Vec3::new(-1.0, 0.0, 1.0), 2.0);
        assert_eq!(aabb.min, Vec3::new(-1.0, 0.0, 1.0));
        assert_eq!(aabb.max, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_closest_point() {
        let aabb = Aabb::from_origin_extent(Vec3::ZERO, 1.0);
        assert_eq!(aabb.closest_point(Vec3::splat(0.5)), Vec3::splat(0.5));
        assert_eq!(aabb.closest_point(Vec3::new(3.0, -1.0, 0.5)), Vec3::new(1.0, 0.0, 0.5));
    }

    #[test]
    fn test_intersects_sphere() {
        let aabb = Aabb::from_origin_extent(Vec3::ZERO, 10.0);

        // Center inside
        assert!(aabb.intersects_sphere(Vec3::splat(5.0), 0.1));
        // Overlapping a face
        assert!(aabb.intersects_sphere(Vec3::new(12.0, 5.0, 5.0), 2.5));
        // Near a corner but outside the radius
        assert!(!aabb.intersects_sphere(Vec3::new(12.0, 12.0, 12.0), 3.0));
        // Same corner, large enough radius (distance is sqrt(12) ~ 3.46)
        assert!(aabb.intersects_sphere(Vec3::new(12.0, 12.0, 12.0), 3.5));
    }
}
