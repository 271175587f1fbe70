//! Gameplay configuration.

use glam::Vec3;

use crate::camera::Camera;
use crate::light::DirectLight;
use crate::render::Color;

/// Everything the [`crate::Game`] needs to set up a session.
///
/// Defaults reproduce the classic three-target room.
///
/// ```
/// use aimlab::GameConfig;
///
/// let config = GameConfig::new().targets(5).smoothness(32).sensitivity(0.12);
/// assert_eq!(config.target_count, 5);
/// ```
#[derive(Clone, Debug)]
pub struct GameConfig {
    pub camera_position: Vec3,
    pub camera_front: Vec3,
    pub movement_speed: f32,
    pub sensitivity: f32,
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub target_count: usize,
    pub target_radius: f32,
    /// Sphere tessellation; each target has `2 × smoothness²` triangles.
    pub smoothness: u32,
    pub target_color: Color,
    pub wall_color: Color,
    pub light: DirectLight,
    /// Crosshair arm span in pixels.
    pub crosshair_length: f32,
    pub crosshair_color: Color,
    pub background: Color,
    pub text_scale: f32,
    pub text_color: Color,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            camera_position: Vec3::new(20.0, 1.0, 18.0),
            camera_front: Vec3::NEG_Z,
            movement_speed: Camera::DEFAULT_SPEED,
            sensitivity: Camera::DEFAULT_SENSITIVITY,
            fov: Camera::DEFAULT_FOV,
            target_count: 3,
            target_radius: 1.0,
            smoothness: 64,
            target_color: Color::CYAN,
            wall_color: Color::rgb8(255, 229, 204),
            light: DirectLight::default(),
            crosshair_length: 10.0,
            crosshair_color: Color::RED,
            background: Color::rgb8(133, 204, 255),
            text_scale: 0.5,
            text_color: Color::BLACK,
        }
    }
}

impl GameConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn movement_speed(mut self, speed: f32) -> Self {
        self.movement_speed = speed;
        self
    }

    pub fn sensitivity(mut self, sensitivity: f32) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    pub fn fov(mut self, fov_degrees: f32) -> Self {
        self.fov = fov_degrees;
        self
    }

    pub fn targets(mut self, count: usize) -> Self {
        self.target_count = count;
        self
    }

    pub fn smoothness(mut self, smoothness: u32) -> Self {
        self.smoothness = smoothness;
        self
    }

    /// Build the camera described by this config for a `width × height` viewport.
    pub fn build_camera(&self, width: f32, height: f32) -> Camera {
        let mut camera = Camera::new(self.camera_position, self.camera_front)
            .speed(self.movement_speed)
            .sensitivity(self.sensitivity)
            .fov(self.fov);
        if height > 0.0 {
            camera.set_aspect(width / height);
        }
        camera
    }
}
