//! Planar UV projection

use glam::{Vec2, Vec3};

/// World units to texture units
pub const UV_SCALE: f32 = 0.01;

/// Project chunk-local vertices onto the horizontal plane in world space
///
/// Using world rather than local coordinates keeps texturing continuous
/// across chunk borders.
pub fn planar_uvs(vertices: &[Vec3], origin: Vec3) -> Vec<Vec2> {
    vertices
        .iter()
        .map(|&v| {
            let world = origin + v;
            Vec2::new(world.x, world.z) * UV_SCALE
        })
        .collect()
}
