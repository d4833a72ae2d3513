//! Axis-aligned bounding box.

use super::vec3::Vec3;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// A cube of edge length `size` centered on `center`.
    pub fn from_center_size(center: Vec3, size: f32) -> Self {
        let half = Vec3::splat(size * 0.5);
        Self::new(center - half, center + half)
    }

    /// Smallest box enclosing all points, or `None` for an empty slice.
    pub fn from_points(points: &[Vec3]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        Some(rest.iter().fold(Self::new(*first, *first), |acc, &p| {
            Self::new(acc.min.min(p), acc.max.max(p))
        }))
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Half the size along each axis.
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_points_encloses_all() {
        let bounds = Aabb::from_points(&[
            Vec3::new(1.0, -2.0, 0.0),
            Vec3::new(-1.0, 3.0, 0.5),
            Vec3::new(0.0, 0.0, -4.0),
        ])
        .unwrap();
        assert_eq!(bounds.min, Vec3::new(-1.0, -2.0, -4.0));
        assert_eq!(bounds.max, Vec3::new(1.0, 3.0, 0.5));
        assert!(Aabb::from_points(&[]).is_none());
    }

    #[test]
    fn center_and_extents() {
        let bounds = Aabb::from_center_size(Vec3::new(1.0, 1.0, 1.0), 0.5);
        assert_eq!(bounds.center(), Vec3::new(1.0, 1.0, 1.0));
        assert_eq!(bounds.extents(), Vec3::splat(0.25));
    }
}
