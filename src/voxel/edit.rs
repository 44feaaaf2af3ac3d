//! Region edits layered over the procedural density
//!
//! Edits are kept as a diff list and applied in world space whenever a
//! chunk field is built, so neighbouring chunks see the same edited field.

use crate::core::types::Vec3;
use crate::math::Aabb;
use crate::terrain::DensityFn;

/// A spherical density modification
///
/// Positive strength adds rock, negative strength carves space. The
/// contribution falls off linearly from `strength` at the center to zero at
/// `radius`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DensityEdit {
    pub center: Vec3,
    pub radius: f32,
    pub strength: f32,
}

impl DensityEdit {
    pub fn new(center: Vec3, radius: f32, strength: f32) -> Self {
        Self { center, radius, strength }
    }

    /// Density delta at a world position
    #[inline]
    pub fn contribution(&self, world: Vec3) -> f32 {
        let d = world.distance(self.center);
        if d < self.radius {
            self.strength * (1.0 - d / self.radius)
        } else {
            0.0
        }
    }

    /// Whether the edit can change any density inside `bounds`
    pub fn affects(&self, bounds: &Aabb) -> bool {
        bounds.intersects_sphere(self.center, self.radius)
    }
}

/// A base density with a list of edits applied on top
pub struct EditedDensity<'a, D: DensityFn + ?Sized> {
    base: &'a D,
    edits: &'a [DensityEdit],
}

impl<'a, D: DensityFn + ?Sized> EditedDensity<'a, D> {
    pub fn new(base: &'a D, edits: &'a [DensityEdit]) -> Self {
        Self { base, edits }
    }
}

impl<D: DensityFn + ?Sized> DensityFn for EditedDensity<'_, D> {
    fn density(&self, world: Vec3) -> f32 {
        self.edits
            .iter()
            .fold(self.base.density(world), |acc, edit| acc + edit.contribution(world))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contribution_falloff() {
        let edit = DensityEdit::new(Vec3::ZERO, 10.0, -2.0);
        assert_eq!(edit.contribution(Vec3::ZERO), -2.0);
        assert!((edit.contribution(Vec3::new(5.0, 0.0, 0.0)) + 1.0).abs() < 1e-6);
        assert_eq!(edit.contribution(Vec3::new(10.0, 0.0, 0.0)), 0.0);
        assert_eq!(edit.contribution(Vec3::new(0.0, 20.0, 0.0)), 0.0);
    }

    #[test]
    fn test_affects_bounds() {
        let edit = DensityEdit::new(Vec3::new(-5.0, 5.0, 5.0), 6.0, 1.0);
        assert!(edit.affects(&Aabb::from_origin_extent(Vec3::ZERO, 10.0)));
        assert!(!edit.affects(&Aabb::from_origin_extent(Vec3::new(20.0, 0.0, 0.0), 10.0)));
    }

    #[test]
    fn test_edited_density_sums_edits() {
        let base = |_: Vec3| 1.0;
        let edits = [
            DensityEdit::new(Vec3::ZERO, 4.0, -3.0),
            DensityEdit::new(Vec3::ZERO, 4.0, 0.5),
        ];
        let edited = EditedDensity::new(&base, &edits);
        assert!((edited.density(Vec3::ZERO) - (-1.5)).abs() < 1e-6);
        assert_eq!(edited.density(Vec3::splat(100.0)), 1.0);
    }
}
