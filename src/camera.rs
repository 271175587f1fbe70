//! First-person Euler camera.
//!
//! [`Camera`] keeps a position and a yaw/pitch pair (in degrees) and derives an
//! orthonormal `front`/`right`/`up` basis from them against a fixed world-up axis.
//! Keyboard movement goes through [`Camera::apply_movement`], pointer look through
//! [`Camera::apply_look`].
//!
//! # Conventions
//!
//! - yaw = 0° looks toward +X, yaw = -90° looks toward -Z
//! - pitch is positive when looking up and is clamped to ±[`PITCH_LIMIT`]
//! - matrices are right-handed, projection depth maps to `[0, 1]` (wgpu)
//!
//! # Example
//!
//! ```
//! use aimlab::{Camera, Movement, Vec3};
//!
//! let mut camera = Camera::new(Vec3::new(20.0, 1.0, 18.0), Vec3::NEG_Z).speed(5.0);
//!
//! camera.apply_movement(Movement::Forward, 0.5);
//! assert!((camera.position().z - 15.5).abs() < 1e-4);
//!
//! camera.apply_look(100.0, 0.0);
//! let view = camera.view_matrix();
//! # let _ = view;
//! ```

use glam::{Mat4, Vec3};

use crate::picking::Ray;

/// Largest pitch magnitude in degrees. Keeps `front` away from `world_up`.
pub const PITCH_LIMIT: f32 = 89.0;

/// A discrete movement direction, one per held key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Movement {
    Forward,
    Backward,
    Left,
    Right,
    /// Along the fixed world-up axis, regardless of pitch.
    WorldUp,
    WorldDown,
}

/// A first-person camera driven by yaw/pitch Euler angles.
///
/// `front`, `right` and `up` are always unit length and mutually orthogonal;
/// they are recomputed from yaw, pitch and world-up after every orientation change.
#[derive(Clone, Debug)]
pub struct Camera {
    position: Vec3,
    front: Vec3,
    up: Vec3,
    right: Vec3,
    world_up: Vec3,
    yaw: f32,
    pitch: f32,
    /// Movement speed in world units per second.
    pub movement_speed: f32,
    /// Degrees of rotation per unit of raw pointer movement.
    pub sensitivity: f32,
    /// Vertical field of view in degrees.
    pub fov: f32,
    /// Viewport width / height.
    pub aspect: f32,
    /// Near clipping plane.
    pub near: f32,
    /// Far clipping plane.
    pub far: f32,
}

impl Camera {
    pub const DEFAULT_SPEED: f32 = 2.5;
    pub const DEFAULT_SENSITIVITY: f32 = 0.08;
    pub const DEFAULT_FOV: f32 = 90.0;
    pub const DEFAULT_ASPECT: f32 = 16.0 / 9.0;
    pub const DEFAULT_NEAR: f32 = 0.1;
    pub const DEFAULT_FAR: f32 = 100.0;

    /// Create a camera at `position` looking along `front`.
    ///
    /// Yaw and pitch are recovered from `front` by inverse trigonometry, so
    /// [`Camera::front`] returns the normalised input as long as its pitch lies
    /// within ±[`PITCH_LIMIT`]. A zero `front` falls back to -Z.
    pub fn new(position: impl Into<Vec3>, front: impl Into<Vec3>) -> Self {
        let front = front.into().normalize_or(Vec3::NEG_Z);
        let yaw = front.z.atan2(front.x).to_degrees();
        let pitch = front
            .y
            .clamp(-1.0, 1.0)
            .asin()
            .to_degrees()
            .clamp(-PITCH_LIMIT, PITCH_LIMIT);

        let mut camera = Self {
            position: position.into(),
            front,
            up: Vec3::Y,
            right: Vec3::X,
            world_up: Vec3::Y,
            yaw,
            pitch,
            movement_speed: Self::DEFAULT_SPEED,
            sensitivity: Self::DEFAULT_SENSITIVITY,
            fov: Self::DEFAULT_FOV,
            aspect: Self::DEFAULT_ASPECT,
            near: Self::DEFAULT_NEAR,
            far: Self::DEFAULT_FAR,
        };
        camera.update_vectors();
        camera
    }

    /// Set movement speed in units per second.
    pub fn speed(mut self, speed: f32) -> Self {
        self.movement_speed = speed;
        self
    }

    /// Set pointer sensitivity in degrees per raw unit.
    pub fn sensitivity(mut self, sensitivity: f32) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    /// Set the vertical field of view in degrees.
    pub fn fov(mut self, fov_degrees: f32) -> Self {
        self.fov = fov_degrees;
        self
    }

    /// Update the aspect ratio, e.g. after a window resize.
    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn front(&self) -> Vec3 {
        self.front
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn world_up(&self) -> Vec3 {
        self.world_up
    }

    /// Yaw in degrees. Unbounded; it wraps through the trigonometric functions.
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    /// Pitch in degrees, always within ±[`PITCH_LIMIT`].
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Move by `movement_speed × elapsed` in the given direction.
    ///
    /// Forward/backward follow `front` (including its pitch), left/right follow
    /// `right`, and the world directions follow the fixed world-up axis.
    pub fn apply_movement(&mut self, direction: Movement, elapsed: f32) {
        let distance = self.movement_speed * elapsed;
        match direction {
            Movement::Forward => self.position += self.front * distance,
            Movement::Backward => self.position -= self.front * distance,
            Movement::Left => self.position -= self.right * distance,
            Movement::Right => self.position += self.right * distance,
            Movement::WorldUp => self.position += self.world_up * distance,
            Movement::WorldDown => self.position -= self.world_up * distance,
        }
    }

    /// Rotate by raw pointer offsets.
    ///
    /// Offsets are scaled by `sensitivity`; positive `y_offset` looks up.
    pub fn apply_look(&mut self, x_offset: f32, y_offset: f32) {
        self.yaw += x_offset * self.sensitivity;
        self.pitch = (self.pitch + y_offset * self.sensitivity).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.update_vectors();
    }

    fn update_vectors(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        self.front = Vec3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        )
        .normalize();
        self.right = self.front.cross(self.world_up).normalize();
        self.up = self.right.cross(self.front).normalize();
    }

    /// Look-at view matrix from `position` toward `position + front`.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.front, self.up)
    }

    /// Perspective projection from `fov`, `aspect`, `near` and `far`.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov.to_radians(), self.aspect, self.near, self.far)
    }

    /// The ray through the centre of the screen.
    pub fn look_ray(&self) -> Ray {
        Ray::new(self.position, self.front)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Vec3::NEG_Z)
    }
}
