//! Plane math: half-space tests, ray and multi-plane intersections.
//!
//! A [`Plane`] is stored as `(normal, distance)` so that a point `p` lies on
//! the plane when `normal · p + distance == 0`. The half-space the normal
//! points into is the "inside".

use crate::math::vec3::Vec3;

/// Minimum squared sine of the angle between two planes (roughly four and a
/// half degrees) for [`Plane::intersect_plane`] to report a line.
pub const PLANE_LINE_TOLERANCE: f32 = 0.006;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub distance: f32,
}

/// An infinite line through `point` along `direction`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Line {
    pub point: Vec3,
    pub direction: Vec3,
}

impl Plane {
    pub const fn new(normal: Vec3, distance: f32) -> Self {
        Self { normal, distance }
    }

    /// Plane through `point` whose inside is the side `normal` points to.
    pub fn from_point_normal(point: Vec3, normal: Vec3) -> Self {
        Self::new(normal, -normal.dot(point))
    }

    /// Supporting plane of a triangle. The normal is `(b - a) × (c - a)`, so it
    /// follows the triangle's winding.
    ///
    /// Returns `None` when the triangle is degenerate (doubled area at most
    /// `min_area`).
    pub fn from_triangle(a: Vec3, b: Vec3, c: Vec3, min_area: f32) -> Option<Self> {
        let normal = (b - a).cross(c - a).try_normalize(min_area)?;
        Some(Self::from_point_normal(a, normal))
    }

    /// Rescales the plane to a unit normal. `None` for a zero or non-finite normal.
    pub fn normalized(&self) -> Option<Self> {
        let length = self.normal.magnitude();
        if !length.is_finite() || !self.distance.is_finite() || length <= f32::EPSILON {
            return None;
        }
        Some(Self::new(self.normal / length, self.distance / length))
    }

    /// Same plane with the inside and outside swapped.
    pub fn flipped(&self) -> Self {
        Self::new(-self.normal, -self.distance)
    }

    /// Signed distance of `point` along the normal (exact for unit normals).
    /// Positive = inside, negative = outside.
    #[inline]
    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.distance
    }

    /// True when `point` is on the plane or inside its half-space.
    #[inline]
    pub fn side(&self, point: Vec3) -> bool {
        self.signed_distance(point) >= 0.0
    }

    /// Point on the plane nearest to `point`. Assumes a unit normal.
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        point - self.normal * self.signed_distance(point)
    }

    /// Parametric distance `t` such that `origin + t * direction` lies on the
    /// plane, or `None` when the ray is parallel to it (`|normal · direction|`
    /// below `tolerance`).
    pub fn ray_intersection(&self, origin: Vec3, direction: Vec3, tolerance: f32) -> Option<f32> {
        let denominator = self.normal.dot(direction);
        if denominator.abs() < tolerance {
            return None;
        }
        Some(-self.signed_distance(origin) / denominator)
    }

    /// Casts a ray from `inside` toward `outside` and returns where it meets
    /// the plane.
    ///
    /// `None` when the two points coincide, the ray runs parallel to the
    /// plane, or the hit does not lie on the segment between them (the
    /// segment does not actually cross the plane).
    pub fn project_between(&self, inside: Vec3, outside: Vec3, tolerance: f32) -> Option<Vec3> {
        let segment = outside - inside;
        let length = segment.magnitude();
        let direction = segment.try_normalize(f32::EPSILON)?;
        let t = self.ray_intersection(inside, direction, tolerance)?;
        let slack = tolerance * (1.0 + length);
        if t < -slack || t > length + slack {
            return None;
        }
        Some(inside + direction * t)
    }

    /// Line shared by two planes, or `None` when the squared sine of the angle
    /// between them is at most `min_sin_sq`. Both planes are assumed to have
    /// unit normals.
    pub fn intersect_plane(&self, other: &Plane, min_sin_sq: f32) -> Option<Line> {
        let direction = self.normal.cross(other.normal);
        // Runs inside `other`, perpendicular to the line, toward `self`.
        let across = other.normal.cross(direction);
        let denominator = self.normal.dot(across);
        if denominator.abs() <= min_sin_sq {
            return None;
        }

        let on_self = self.closest_point(Vec3::ZERO);
        let on_other = other.closest_point(Vec3::ZERO);
        let t = self.normal.dot(on_self - on_other) / denominator;
        Some(Line {
            point: on_other + across * t,
            direction: direction.normalize(),
        })
    }
}

/// Solves for the single point lying on all three planes.
///
/// The determinant `(n0 × n1) · n2` is compared signed against `epsilon`, so
/// the plane order matters: a triple that fails in one order may succeed with
/// two planes swapped. Callers are expected to retry with a permuted order.
pub fn intersect_three(p0: &Plane, p1: &Plane, p2: &Plane, epsilon: f32) -> Option<Vec3> {
    let det = p0.normal.cross(p1.normal).dot(p2.normal);
    if det.is_nan() || det < epsilon {
        return None;
    }

    let point = (p1.normal.cross(p2.normal) * -p0.distance
        - p2.normal.cross(p0.normal) * p1.distance
        - p0.normal.cross(p1.normal) * p2.distance)
        / det;
    point.is_finite().then_some(point)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    const TOLERANCE: f32 = 1e-4;

    fn x_plane(x: f32) -> Plane {
        Plane::from_point_normal(Vec3::new(x, 0.0, 0.0), Vec3::RIGHT)
    }

    #[test]
    fn side_includes_points_on_the_plane() {
        let plane = x_plane(1.0);
        assert!(plane.side(Vec3::new(1.0, 5.0, -3.0)));
        assert!(plane.side(Vec3::new(2.0, 0.0, 0.0)));
        assert!(!plane.side(Vec3::new(0.5, 0.0, 0.0)));
    }

    #[test]
    fn ray_intersection_hits_the_plane() {
        let plane = x_plane(2.0);
        let origin = Vec3::new(0.0, 1.0, 0.0);
        let direction = Vec3::new(1.0, 1.0, 0.0).normalize();
        let t = plane.ray_intersection(origin, direction, TOLERANCE).unwrap();
        let hit = origin + direction * t;
        assert_abs_diff_eq!(plane.signed_distance(hit), 0.0, epsilon = 1e-5);
        assert_relative_eq!(hit, Vec3::new(2.0, 3.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn ray_parallel_to_plane_misses() {
        let plane = x_plane(0.0);
        assert!(plane
            .ray_intersection(Vec3::new(1.0, 0.0, 0.0), Vec3::UP, TOLERANCE)
            .is_none());
    }

    #[test]
    fn project_between_lands_on_the_segment() {
        let plane = x_plane(0.0);
        let hit = plane
            .project_between(Vec3::new(1.0, 0.0, 0.0), Vec3::new(-3.0, 4.0, 0.0), TOLERANCE)
            .unwrap();
        assert_relative_eq!(hit, Vec3::new(0.0, 1.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn project_between_rejects_segments_that_do_not_cross() {
        let plane = x_plane(0.0);
        let a = Vec3::new(1.0, 0.0, 0.0);
        assert!(plane.project_between(a, Vec3::new(2.0, 1.0, 0.0), TOLERANCE).is_none());
        assert!(plane.project_between(a, a, TOLERANCE).is_none());
    }

    #[test]
    fn three_axis_planes_meet_at_a_point() {
        let px = Plane::from_point_normal(Vec3::new(1.0, 0.0, 0.0), Vec3::RIGHT);
        let py = Plane::from_point_normal(Vec3::new(0.0, 2.0, 0.0), Vec3::UP);
        let pz = Plane::from_point_normal(Vec3::new(0.0, 0.0, 3.0), Vec3::FORWARD);
        let point = intersect_three(&px, &py, &pz, TOLERANCE).unwrap();
        assert_relative_eq!(point, Vec3::new(1.0, 2.0, 3.0), epsilon = 1e-5);
    }

    #[test]
    fn three_plane_order_flips_determinant_sign() {
        let px = Plane::from_point_normal(Vec3::new(1.0, 0.0, 0.0), Vec3::RIGHT);
        let py = Plane::from_point_normal(Vec3::new(0.0, 2.0, 0.0), Vec3::UP);
        let pz = Plane::from_point_normal(Vec3::new(0.0, 0.0, 3.0), Vec3::FORWARD);
        assert!(intersect_three(&px, &pz, &py, TOLERANCE).is_none());
        let point = intersect_three(&px, &py, &pz, TOLERANCE).unwrap();
        assert_relative_eq!(point, Vec3::new(1.0, 2.0, 3.0), epsilon = 1e-5);
    }

    #[test]
    fn parallel_planes_have_no_common_point() {
        let a = x_plane(0.0);
        let b = x_plane(1.0);
        let c = Plane::from_point_normal(Vec3::ZERO, Vec3::UP);
        assert!(intersect_three(&a, &b, &c, TOLERANCE).is_none());
        assert!(intersect_three(&a, &c, &b, TOLERANCE).is_none());
    }

    #[test]
    fn two_planes_share_a_line() {
        let px = x_plane(1.0);
        let py = Plane::from_point_normal(Vec3::new(0.0, -2.0, 0.0), Vec3::UP);
        let line = px.intersect_plane(&py, PLANE_LINE_TOLERANCE).unwrap();
        assert_abs_diff_eq!(px.signed_distance(line.point), 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!(py.signed_distance(line.point), 0.0, epsilon = 1e-5);
        assert_relative_eq!(line.direction.abs(), Vec3::FORWARD, epsilon = 1e-5);
    }

    #[test]
    fn nearly_parallel_planes_have_no_line() {
        let a = x_plane(0.0);
        let b = Plane::from_point_normal(Vec3::ZERO, Vec3::new(1.0, 0.001, 0.0).normalize());
        assert!(a.intersect_plane(&b, PLANE_LINE_TOLERANCE).is_none());
    }

    #[test]
    fn triangle_plane_follows_winding() {
        let plane = Plane::from_triangle(
            Vec3::ZERO,
            Vec3::RIGHT,
            Vec3::UP,
            f32::EPSILON,
        )
        .unwrap();
        assert_relative_eq!(plane.normal, Vec3::FORWARD);
        assert!(Plane::from_triangle(Vec3::ZERO, Vec3::RIGHT, Vec3::RIGHT * 2.0, 1e-6).is_none());
    }

    #[test]
    fn normalized_rescales_distance() {
        let plane = Plane::new(Vec3::new(0.0, 2.0, 0.0), 4.0).normalized().unwrap();
        assert_relative_eq!(plane.normal, Vec3::UP);
        assert_relative_eq!(plane.distance, 2.0);
        assert!(Plane::new(Vec3::ZERO, 1.0).normalized().is_none());
    }
}
