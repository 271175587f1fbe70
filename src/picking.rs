//! Look-ray hit testing against sphere targets.
//!
//! A shot travels along the camera's `front` vector from the camera position.
//! The test is against the whole *line* through the camera, not a half-ray: a
//! sphere directly behind the camera counts as hit. That matches how the
//! trainer has always scored and is kept deliberately.
//!
//! # Example
//!
//! ```
//! use aimlab::{Ray, Vec3};
//!
//! let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
//! assert!(ray.hits_sphere(Vec3::new(0.5, 0.0, -10.0), 1.0));
//! assert!(!ray.hits_sphere(Vec3::new(3.0, 0.0, -10.0), 1.0));
//! ```

use glam::Vec3;

/// A line in 3D space with an origin and a unit direction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit length, or zero if constructed from a zero vector.
    pub direction: Vec3,
}

impl Ray {
    /// The direction is normalised.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    #[inline]
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Squared perpendicular distance from `point` to the line carrying this ray.
    pub fn distance_squared_to(&self, point: Vec3) -> f32 {
        perpendicular_distance_squared(self.origin, self.direction, point)
    }

    /// Whether the line through this ray passes strictly inside the sphere.
    pub fn hits_sphere(&self, center: Vec3, radius: f32) -> bool {
        hit_test(self.origin, self.direction, center, radius)
    }
}

fn perpendicular_distance_squared(origin: Vec3, direction: Vec3, point: Vec3) -> f32 {
    let to_point = point - origin;
    let length = direction.length();
    if length <= f32::EPSILON {
        return to_point.length_squared();
    }
    let along = to_point.dot(direction) / length;
    // Rounding can push this a hair below zero when the point sits on the line.
    (to_point.length_squared() - along * along).max(0.0)
}

/// Line-sphere hit test.
///
/// Projects `center - origin` onto `direction` (which need not be normalised)
/// and compares the squared perpendicular distance against `radius²`. The
/// comparison is strict, so a tangent line misses.
///
/// With a zero `direction` the test degenerates to "is the origin inside the sphere".
pub fn hit_test(origin: Vec3, direction: Vec3, center: Vec3, radius: f32) -> bool {
    perpendicular_distance_squared(origin, direction, center) < radius * radius
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centred_sphere_is_hit() {
        assert!(hit_test(Vec3::ZERO, Vec3::NEG_Z, Vec3::new(0.0, 0.0, -20.0), 1.0));
    }

    #[test]
    fn offset_sphere_is_missed() {
        assert!(!hit_test(Vec3::ZERO, Vec3::NEG_Z, Vec3::new(1.5, 0.0, -20.0), 1.0));
        assert!(hit_test(Vec3::ZERO, Vec3::NEG_Z, Vec3::new(0.9, 0.0, -20.0), 1.0));
    }

    #[test]
    fn tangent_line_misses() {
        assert!(!hit_test(Vec3::ZERO, Vec3::X, Vec3::new(4.0, 1.0, 0.0), 1.0));
    }

    #[test]
    fn sphere_behind_origin_counts() {
        assert!(hit_test(Vec3::ZERO, Vec3::NEG_Z, Vec3::new(0.0, 0.2, 15.0), 1.0));
    }

    #[test]
    fn direction_length_does_not_matter() {
        let center = Vec3::new(0.7, 0.0, -8.0);
        for scale in [0.01, 1.0, 37.0] {
            assert!(hit_test(Vec3::ZERO, Vec3::NEG_Z * scale, center, 1.0));
        }
        assert!(hit_test(Vec3::ZERO, Vec3::new(0.0, 0.0, -3.0), center, 1.0));
    }

    #[test]
    fn zero_direction_checks_origin_containment() {
        assert!(hit_test(Vec3::ZERO, Vec3::ZERO, Vec3::new(0.5, 0.0, 0.0), 1.0));
        assert!(!hit_test(Vec3::ZERO, Vec3::ZERO, Vec3::new(5.0, 0.0, 0.0), 1.0));
    }

    #[test]
    fn ray_normalises_direction() {
        let ray = Ray::new(Vec3::ONE, Vec3::new(0.0, 3.0, 4.0));
        assert!((ray.direction.length() - 1.0).abs() < 1e-6);
        assert!(ray.point_at(5.0).distance(Vec3::new(1.0, 4.0, 5.0)) < 1e-5);
    }

    #[test]
    fn distance_to_point_on_line_is_zero() {
        let ray = Ray::new(Vec3::new(20.0, 1.0, 18.0), Vec3::new(1.0, 2.0, -3.0));
        let on_line = ray.point_at(7.5);
        assert!(ray.distance_squared_to(on_line) < 1e-3);
        assert!(ray.hits_sphere(on_line, 0.1));
    }
}
