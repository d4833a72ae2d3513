//! Perspective projection parameters.
//!
//! The [`Projection`] struct is the single source of truth for the view
//! volume's shape (FOV, aspect ratio, near/far planes). Combined with a
//! [`Camera`] it produces the world-space [`Frustum`] used for clipping.

use crate::camera::Camera;
use crate::error::Result;
use crate::frustum::Frustum;
use crate::plane::Plane;

/// Perspective projection parameters.
#[derive(Debug, Clone, Copy)]
pub struct Projection {
    /// Vertical field of view in radians.
    fov_y: f32,
    /// Aspect ratio (width / height).
    aspect_ratio: f32,
    /// Near clipping plane distance.
    z_near: f32,
    /// Far clipping plane distance.
    z_far: f32,
}

impl Default for Projection {
    fn default() -> Self {
        Self::from_degrees(60.0, 16.0 / 9.0, 0.3, 1000.0)
    }
}

impl Projection {
    /// Creates a new projection with the given parameters.
    ///
    /// # Arguments
    /// * `fov_y` - Vertical field of view in radians
    /// * `aspect_ratio` - Width divided by height
    /// * `z_near` - Near clipping plane distance (must be > 0)
    /// * `z_far` - Far clipping plane distance (must be > z_near)
    pub fn new(fov_y: f32, aspect_ratio: f32, z_near: f32, z_far: f32) -> Self {
        Self {
            fov_y,
            aspect_ratio,
            z_near,
            z_far,
        }
    }

    /// Creates a projection from degrees instead of radians.
    pub fn from_degrees(fov_y_degrees: f32, aspect_ratio: f32, z_near: f32, z_far: f32) -> Self {
        Self::new(fov_y_degrees.to_radians(), aspect_ratio, z_near, z_far)
    }

    /// Returns the vertical field of view in radians.
    pub fn fov_y(&self) -> f32 {
        self.fov_y
    }

    /// Returns the horizontal field of view in radians.
    ///
    /// Computed from the vertical FOV and aspect ratio.
    pub fn fov_x(&self) -> f32 {
        2.0 * (self.aspect_ratio * (self.fov_y / 2.0).tan()).atan()
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    pub fn z_near(&self) -> f32 {
        self.z_near
    }

    pub fn z_far(&self) -> f32 {
        self.z_far
    }

    /// Builds the world-space frustum seen by `camera`.
    ///
    /// Side planes pass through the camera position; their normals are tilted
    /// from the camera's right/up axes toward forward by half the FOV so they
    /// point into the volume.
    pub fn frustum(&self, camera: &Camera) -> Result<Frustum> {
        let eye = camera.position();
        let forward = camera.forward();
        let right = camera.right();
        let up = camera.up();
        let (sin_x, cos_x) = (self.fov_x() / 2.0).sin_cos();
        let (sin_y, cos_y) = (self.fov_y / 2.0).sin_cos();

        Frustum::new([
            Plane::from_point_normal(eye + forward * self.z_near, forward),
            Plane::from_point_normal(eye + forward * self.z_far, -forward),
            Plane::from_point_normal(eye, right * cos_x + forward * sin_x),
            Plane::from_point_normal(eye, -right * cos_x + forward * sin_x),
            Plane::from_point_normal(eye, -up * cos_y + forward * sin_y),
            Plane::from_point_normal(eye, up * cos_y + forward * sin_y),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frustum::FrustumPlane;
    use crate::math::vec3::Vec3;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_4;

    #[test]
    fn fov_x_matches_aspect_ratio() {
        // With aspect ratio 1:1, fov_x should equal fov_y
        let proj = Projection::new(FRAC_PI_4, 1.0, 0.1, 100.0);
        assert_relative_eq!(proj.fov_x(), proj.fov_y(), epsilon = 1e-6);
    }

    #[test]
    fn fov_x_wider_with_higher_aspect() {
        let proj = Projection::new(FRAC_PI_4, 16.0 / 9.0, 0.1, 100.0);
        assert!(proj.fov_x() > proj.fov_y());
    }

    #[test]
    fn from_degrees_converts_correctly() {
        let proj = Projection::from_degrees(45.0, 1.0, 0.1, 100.0);
        assert_relative_eq!(proj.fov_y(), FRAC_PI_4, epsilon = 1e-6);
    }

    #[test]
    fn frustum_contains_points_ahead_of_camera() {
        let proj = Projection::from_degrees(90.0, 1.0, 0.5, 50.0);
        let frustum = proj.frustum(&Camera::default()).unwrap();

        assert!(frustum.contains_point(Vec3::new(0.0, 0.0, 5.0)));
        assert!(frustum.contains_point(Vec3::new(4.9, -4.9, 5.0)));
        assert_eq!(
            frustum.failed_planes(Vec3::new(0.0, 0.0, 0.1)).single(),
            Some(FrustumPlane::Near)
        );
        assert_eq!(
            frustum.failed_planes(Vec3::new(0.0, 0.0, 60.0)).single(),
            Some(FrustumPlane::Far)
        );
        assert_eq!(
            frustum.failed_planes(Vec3::new(6.0, 0.0, 5.0)).single(),
            Some(FrustumPlane::Right)
        );
        assert_eq!(
            frustum.failed_planes(Vec3::new(0.0, 6.0, 5.0)).single(),
            Some(FrustumPlane::Top)
        );
        assert_eq!(frustum.failed_planes(Vec3::new(-6.0, -6.0, 5.0)).len(), 2);
    }

    #[test]
    fn frustum_follows_camera_orientation() {
        let proj = Projection::from_degrees(60.0, 1.0, 0.1, 100.0);
        let camera = Camera::looking_at(Vec3::new(10.0, 0.0, 0.0), Vec3::new(10.0, 0.0, -10.0));
        let frustum = proj.frustum(&camera).unwrap();
        assert!(frustum.contains_point(Vec3::new(10.0, 0.0, -5.0)));
        assert!(!frustum.contains_point(Vec3::new(10.0, 0.0, 5.0)));
    }
}
