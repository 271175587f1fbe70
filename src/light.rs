//! Scene lighting.

use glam::Vec3;

/// A single directional light with Phong colour terms.
///
/// `direction` points from the light toward the scene and is not required to be
/// normalised; shaders normalise it. `ambient`, `diffuse` and `specular` are RGB
/// intensities.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectLight {
    pub direction: Vec3,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
}

impl DirectLight {
    pub fn new(direction: Vec3, ambient: Vec3, diffuse: Vec3, specular: Vec3) -> Self {
        Self {
            direction,
            ambient,
            diffuse,
            specular,
        }
    }
}

impl Default for DirectLight {
    /// Grey low-angle light from the upper left behind the player.
    fn default() -> Self {
        Self::new(
            Vec3::new(-2.0, -3.0, -3.0),
            Vec3::splat(0.3),
            Vec3::splat(0.4),
            Vec3::splat(0.1),
        )
    }
}
