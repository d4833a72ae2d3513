//! Six-plane view frustum.
//!
//! Every plane's normal points toward the interior, so a point is inside the
//! frustum when it is on the inside of all six planes.

use std::fmt;

use crate::error::{ClipError, Result};
use crate::math::aabb::Aabb;
use crate::math::vec3::Vec3;
use crate::plane::{Line, Plane, PLANE_LINE_TOLERANCE};

/// The six frustum planes, in storage order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FrustumPlane {
    Near,
    Far,
    Left,
    Right,
    Top,
    Bottom,
}

impl FrustumPlane {
    pub const ALL: [FrustumPlane; 6] = [
        FrustumPlane::Near,
        FrustumPlane::Far,
        FrustumPlane::Left,
        FrustumPlane::Right,
        FrustumPlane::Top,
        FrustumPlane::Bottom,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// A subset of the six frustum planes, stored as a bitmask.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PlaneSet(u8);

impl PlaneSet {
    pub const EMPTY: Self = Self(0);

    pub fn insert(&mut self, plane: FrustumPlane) {
        self.0 |= 1 << plane.index();
    }

    pub fn contains(&self, plane: FrustumPlane) -> bool {
        self.0 & (1 << plane.index()) != 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// The single plane in the set, if there is exactly one.
    pub fn single(&self) -> Option<FrustumPlane> {
        if self.len() == 1 {
            self.iter().next()
        } else {
            None
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = FrustumPlane> {
        let set = *self;
        FrustumPlane::ALL.into_iter().filter(move |&p| set.contains(p))
    }
}

impl FromIterator<FrustumPlane> for PlaneSet {
    fn from_iter<I: IntoIterator<Item = FrustumPlane>>(iter: I) -> Self {
        let mut set = PlaneSet::EMPTY;
        for plane in iter {
            set.insert(plane);
        }
        set
    }
}

impl fmt::Debug for PlaneSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// A convex view volume bounded by six inward-facing unit planes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frustum {
    planes: [Plane; 6],
}

impl Frustum {
    /// Builds a frustum from planes given in [`FrustumPlane::ALL`] order
    /// (near, far, left, right, top, bottom).
    ///
    /// Each plane is rescaled to a unit normal; a zero or non-finite normal is
    /// rejected.
    pub fn new(planes: [Plane; 6]) -> Result<Self> {
        let mut normalized = planes;
        for (which, plane) in FrustumPlane::ALL.into_iter().zip(normalized.iter_mut()) {
            *plane = plane
                .normalized()
                .ok_or(ClipError::InvalidFrustum(which))?;
        }
        Ok(Self { planes: normalized })
    }

    /// An axis-aligned box volume: near/far bound z, left/right bound x,
    /// bottom/top bound y.
    pub fn from_box(bounds: &Aabb) -> Result<Self> {
        let Aabb { min, max } = *bounds;
        Self::new([
            Plane::from_point_normal(min, Vec3::FORWARD),
            Plane::from_point_normal(max, Vec3::BACK),
            Plane::from_point_normal(min, Vec3::RIGHT),
            Plane::from_point_normal(max, Vec3::LEFT),
            Plane::from_point_normal(max, Vec3::DOWN),
            Plane::from_point_normal(min, Vec3::UP),
        ])
    }

    #[inline]
    pub fn plane(&self, which: FrustumPlane) -> &Plane {
        &self.planes[which.index()]
    }

    pub fn planes(&self) -> &[Plane; 6] {
        &self.planes
    }

    pub fn iter(&self) -> impl Iterator<Item = (FrustumPlane, &Plane)> {
        FrustumPlane::ALL.into_iter().zip(self.planes.iter())
    }

    /// The planes whose inside half-space does not contain `point`.
    pub fn failed_planes(&self, point: Vec3) -> PlaneSet {
        self.iter()
            .filter(|(_, plane)| !plane.side(point))
            .map(|(which, _)| which)
            .collect()
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes.iter().all(|plane| plane.side(point))
    }

    /// Planes `point` lies further than `tolerance` outside of.
    pub fn violated_beyond(&self, point: Vec3, tolerance: f32) -> PlaneSet {
        self.iter()
            .filter(|(_, plane)| plane.signed_distance(point) < -tolerance)
            .map(|(which, _)| which)
            .collect()
    }

    /// True when the box is inside or straddles every plane, i.e. it is not
    /// entirely outside any single plane.
    ///
    /// Conservative near frustum edges and corners: a box outside the volume
    /// but not fully behind one plane still passes.
    pub fn intersects_aabb(&self, bounds: &Aabb) -> bool {
        let center = bounds.center();
        let extents = bounds.extents();
        self.planes.iter().all(|plane| {
            let reach = extents.dot(plane.normal.abs());
            plane.signed_distance(center) + reach >= 0.0
        })
    }

    /// Line where two frustum planes meet, e.g. a side edge for `Left`/`Top`.
    /// `None` for opposite (near-parallel) planes.
    pub fn edge(&self, a: FrustumPlane, b: FrustumPlane) -> Option<Line> {
        self.plane(a).intersect_plane(self.plane(b), PLANE_LINE_TOLERANCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn unit_box() -> Frustum {
        Frustum::from_box(&Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0))).unwrap()
    }

    #[test]
    fn plane_set_tracks_membership() {
        let mut set = PlaneSet::EMPTY;
        assert!(set.is_empty());
        set.insert(FrustumPlane::Left);
        assert_eq!(set.single(), Some(FrustumPlane::Left));
        set.insert(FrustumPlane::Top);
        set.insert(FrustumPlane::Left);
        assert_eq!(set.len(), 2);
        assert_eq!(set.single(), None);
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            vec![FrustumPlane::Left, FrustumPlane::Top]
        );
        assert_eq!(format!("{set:?}"), "{Left, Top}");
    }

    #[test]
    fn box_frustum_contains_its_interior() {
        let frustum = unit_box();
        assert!(frustum.contains_point(Vec3::ZERO));
        assert!(frustum.contains_point(Vec3::splat(1.0)));
        assert!(!frustum.contains_point(Vec3::new(1.5, 0.0, 0.0)));
    }

    #[test]
    fn failed_planes_reports_each_violation() {
        let frustum = unit_box();
        assert!(frustum.failed_planes(Vec3::ZERO).is_empty());
        assert_eq!(
            frustum.failed_planes(Vec3::new(2.0, 0.0, 0.0)).single(),
            Some(FrustumPlane::Right)
        );
        let corner = frustum.failed_planes(Vec3::new(-2.0, 2.0, 0.0));
        assert_eq!(corner.len(), 2);
        assert!(corner.contains(FrustumPlane::Left));
        assert!(corner.contains(FrustumPlane::Top));
        assert_eq!(
            frustum.failed_planes(Vec3::new(0.0, 0.0, -3.0)).single(),
            Some(FrustumPlane::Near)
        );
    }

    #[test]
    fn new_normalizes_and_rejects_zero_normals() {
        let mut planes = *unit_box().planes();
        planes[0] = Plane::new(Vec3::new(0.0, 0.0, 4.0), 4.0);
        let frustum = Frustum::new(planes).unwrap();
        assert_abs_diff_eq!(frustum.plane(FrustumPlane::Near).distance, 1.0);

        planes[3] = Plane::new(Vec3::ZERO, 1.0);
        assert!(matches!(
            Frustum::new(planes),
            Err(ClipError::InvalidFrustum(FrustumPlane::Right))
        ));
    }

    #[test]
    fn aabb_test_accepts_straddling_boxes() {
        let frustum = unit_box();
        let straddling = Aabb::from_center_size(Vec3::new(1.04, 0.0, 0.0), 0.1);
        let outside = Aabb::from_center_size(Vec3::new(1.2, 0.0, 0.0), 0.1);
        assert!(frustum.intersects_aabb(&straddling));
        assert!(!frustum.intersects_aabb(&outside));
    }

    #[test]
    fn adjacent_planes_share_an_edge() {
        let frustum = unit_box();
        let edge = frustum.edge(FrustumPlane::Left, FrustumPlane::Top).unwrap();
        assert_abs_diff_eq!(edge.point.x, -1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(edge.point.y, 1.0, epsilon = 1e-5);
        assert!(frustum.edge(FrustumPlane::Left, FrustumPlane::Right).is_none());
    }
}
