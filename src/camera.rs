//! First-person camera used to aim the snapshot frustum.
//!
//! # Coordinate System
//!
//! Uses a **left-handed** coordinate system:
//! - X: positive right
//! - Y: positive up
//! - Z: positive forward
//!
//! # Orientation
//!
//! Orientation is stored as yaw/pitch angles and converted to a rotation
//! matrix when needed.
//!
//! - **Yaw**: Rotation around Y-axis (horizontal look, positive = look right)
//! - **Pitch**: Rotation around X-axis (vertical look, positive = look up)

use crate::math::mat4::Mat4;
use crate::math::vec3::Vec3;

/// First-person camera with position and yaw/pitch orientation.
#[derive(Debug, Clone)]
pub struct Camera {
    position: Vec3,
    yaw: f32,   // Rotation around Y-axis (radians)
    pitch: f32, // Rotation around X-axis (radians)

    pitch_min: f32,
    pitch_max: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::ZERO)
    }
}

impl Camera {
    /// Creates a new camera at the given position, looking along +Z axis.
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            yaw: 0.0,
            pitch: 0.0,
            pitch_min: -89.0_f32.to_radians(),
            pitch_max: 89.0_f32.to_radians(),
        }
    }

    /// Creates a camera at `position` looking toward `target`.
    pub fn looking_at(position: Vec3, target: Vec3) -> Self {
        let mut camera = Self::new(position);
        camera.look_at(target);
        camera
    }

    /// Order: Yaw (Y) * Pitch (X). Yaw is negated so positive yaw turns right.
    fn rotation_matrix(&self) -> Mat4 {
        Mat4::rotation_y(-self.yaw) * Mat4::rotation_x(self.pitch)
    }

    // =========================================================================
    // Orientation
    // =========================================================================

    /// Sets yaw (horizontal) and pitch (vertical) in radians. Pitch is
    /// clamped to the camera's limits.
    pub fn set_orientation(&mut self, yaw: f32, pitch: f32) {
        self.yaw = yaw;
        self.pitch = pitch.clamp(self.pitch_min, self.pitch_max);
    }

    /// Points the camera at a world position.
    pub fn look_at(&mut self, target: Vec3) {
        let direction = target - self.position;
        let horizontal_len = (direction.x * direction.x + direction.z * direction.z).sqrt();

        if horizontal_len > f32::EPSILON {
            self.yaw = direction.x.atan2(direction.z);
        }

        if direction.magnitude() > f32::EPSILON {
            self.pitch = direction
                .y
                .atan2(horizontal_len)
                .clamp(self.pitch_min, self.pitch_max);
        }
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// The +Z axis transformed by the rotation matrix.
    pub fn forward(&self) -> Vec3 {
        let rot = self.rotation_matrix();
        Vec3::new(rot.get(0, 2), rot.get(1, 2), rot.get(2, 2)).normalize()
    }

    /// The +X axis transformed by the rotation matrix.
    pub fn right(&self) -> Vec3 {
        let rot = self.rotation_matrix();
        Vec3::new(rot.get(0, 0), rot.get(1, 0), rot.get(2, 0)).normalize()
    }

    /// Completes the left-handed basis: `right × up = forward`.
    pub fn up(&self) -> Vec3 {
        self.forward().cross(self.right()).normalize()
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn default_basis_is_axis_aligned() {
        let camera = Camera::default();
        assert_relative_eq!(camera.forward(), Vec3::FORWARD, epsilon = 1e-6);
        assert_relative_eq!(camera.right(), Vec3::RIGHT, epsilon = 1e-6);
        assert_relative_eq!(camera.up(), Vec3::UP, epsilon = 1e-6);
    }

    #[test]
    fn positive_yaw_turns_right() {
        let mut camera = Camera::default();
        camera.set_orientation(FRAC_PI_2, 0.0);
        assert_relative_eq!(camera.forward(), Vec3::RIGHT, epsilon = 1e-6);
        assert_relative_eq!(camera.right(), Vec3::BACK, epsilon = 1e-6);
    }

    #[test]
    fn positive_pitch_looks_up() {
        let mut camera = Camera::default();
        camera.set_orientation(0.0, 0.3);
        assert!(camera.forward().y > 0.0);
        assert_relative_eq!(camera.up().dot(camera.forward()), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn pitch_is_clamped() {
        let mut camera = Camera::default();
        camera.set_orientation(0.0, 10.0);
        assert_relative_eq!(camera.pitch(), 89.0_f32.to_radians());
    }

    #[test]
    fn looking_at_faces_target() {
        let camera = Camera::looking_at(Vec3::new(1.0, 2.0, 3.0), Vec3::new(4.0, 6.0, 3.0));
        assert_relative_eq!(camera.forward(), Vec3::new(0.6, 0.8, 0.0), epsilon = 1e-5);
    }
}
