//! Per-triangle clipping.
//!
//! A triangle is classified by how many of its corners are inside the
//! frustum, then cut against the one or two planes its outside corners
//! violate:
//!
//! ```text
//!   two inside, one plane      two inside, two planes
//!
//!   I1 ------- I2              I1 ------- I2
//!    \         |                 \       /
//!  ---O1'-----O2'--- P            \     /
//!      \      /                  ---- C ---- P1 ∩ P2 ∩ supporting plane
//!       \   /
//!        O
//! ```
//!
//! A corner solution can land outside the source triangle when its far edge
//! dips back into the frustum. The whole triangle is then clipped as a
//! polygon against every plane its corners fail, and the result fanned.
//!
//! Cut points are computed in world space. Every emitted triangle keeps the
//! winding of its source triangle.

use log::{trace, warn};

use super::builder::{barycentric, ClipBuilder, CutVertex, EdgeKey, Slot};
use super::classify::Classification;
use crate::error::{ClipFailure, IntersectionKind};
use crate::frustum::{Frustum, FrustumPlane, PlaneSet};
use crate::math::Vec3;
use crate::plane::{intersect_three, Plane};

/// How many corners of a triangle are inside, with the corners rotated so
/// the listed order is a cyclic rotation of the source winding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriangleClass {
    Inside,
    Outside,
    /// Winding `(inside[0], inside[1], outside)`.
    TwoInside { inside: [u32; 2], outside: u32 },
    /// Winding `(inside, outside[0], outside[1])`.
    OneInside { inside: u32, outside: [u32; 2] },
}

impl TriangleClass {
    pub fn of(corners: [u32; 3], classification: &Classification) -> Self {
        let inside = corners.map(|i| classification.is_inside(i));
        let at = |k: usize| corners[k % 3];
        match inside {
            [true, true, true] => Self::Inside,
            [false, false, false] => Self::Outside,
            _ => {
                let count = inside.iter().filter(|&&b| b).count();
                if count == 2 {
                    let k = inside.iter().position(|&b| !b).unwrap_or(0);
                    Self::TwoInside {
                        inside: [at(k + 1), at(k + 2)],
                        outside: at(k),
                    }
                } else {
                    let k = inside.iter().position(|&b| b).unwrap_or(0);
                    Self::OneInside {
                        inside: at(k),
                        outside: [at(k + 1), at(k + 2)],
                    }
                }
            }
        }
    }
}

/// Which planes an outside corner is cut against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Violation {
    Single(FrustumPlane),
    /// The two most deeply violated planes, deepest first.
    Corner(FrustumPlane, FrustumPlane),
}

/// Clips triangles of one mesh against one frustum.
pub(crate) struct TriangleClipper<'c> {
    frustum: &'c Frustum,
    classification: &'c Classification,
    epsilon: f32,
}

impl<'c> TriangleClipper<'c> {
    pub fn new(frustum: &'c Frustum, classification: &'c Classification, epsilon: f32) -> Self {
        Self {
            frustum,
            classification,
            epsilon,
        }
    }

    /// Clips source triangle number `triangle` into `builder`. Failures are
    /// recorded on the builder and drop only this triangle.
    pub fn clip(&self, triangle: usize, corners: [u32; 3], builder: &mut ClipBuilder) {
        let class = TriangleClass::of(corners, self.classification);
        match class {
            TriangleClass::Inside => {
                builder.push_triangle(corners);
                builder.stats_mut().retained += 1;
            }
            TriangleClass::Outside => builder.stats_mut().discarded += 1,
            _ => match self.cut(triangle, class, corners) {
                Ok((support, pieces)) => {
                    trace!("triangle {triangle}: {class:?} -> {} pieces", pieces.len());
                    self.emit(corners, &support, pieces, builder);
                    builder.stats_mut().clipped += 1;
                }
                Err(failure) => {
                    warn!("dropping {failure}");
                    builder.fail(failure);
                }
            },
        }
    }

    /// Computes every emitted piece before anything is appended, so a failed
    /// triangle leaves no vertices behind.
    fn cut(
        &self,
        triangle: usize,
        class: TriangleClass,
        corners: [u32; 3],
    ) -> Result<(Plane, Vec<[Slot; 3]>), ClipFailure> {
        let degenerate = |kind| ClipFailure::DegenerateIntersection { triangle, kind };

        let [a, b, c] = corners.map(|i| self.classification.world(i));
        let support = Plane::from_triangle(a, b, c, f32::EPSILON)
            .ok_or(degenerate(IntersectionKind::SupportingPlane))?;

        let pieces = match class {
            TriangleClass::TwoInside { inside, outside } => {
                self.two_inside(inside, outside, &support)
            }
            TriangleClass::OneInside { inside, outside } => {
                self.one_inside(inside, outside, &support)
            }
            TriangleClass::Inside | TriangleClass::Outside => Ok(Vec::new()),
        }
        .map_err(degenerate)?;

        let pieces = if pieces.iter().flatten().all(|&slot| self.within([a, b, c], slot)) {
            pieces
        } else {
            trace!("triangle {triangle}: corner outside the source, clipping as a polygon");
            self.polygon(corners)
        };

        for slot in pieces.iter().flatten() {
            let planes = self.escapes(*slot);
            if !planes.is_empty() {
                return Err(ClipFailure::OutsideFrustum { triangle, planes });
            }
        }
        Ok((support, pieces))
    }

    /// Planes a synthesized vertex lies beyond, allowing a tolerance that
    /// grows with its distance from the origin. Source vertices never escape.
    fn escapes(&self, slot: Slot) -> PlaneSet {
        match slot {
            Slot::Source(_) => PlaneSet::EMPTY,
            Slot::Cut(cut) => {
                let tolerance = self.epsilon * (1.0 + cut.world.magnitude());
                self.frustum.violated_beyond(cut.world, tolerance)
            }
        }
    }

    fn two_inside(
        &self,
        [i1, i2]: [u32; 2],
        outside: u32,
        support: &Plane,
    ) -> Result<Vec<[Slot; 3]>, IntersectionKind> {
        match self.violation(outside) {
            Violation::Single(plane) => {
                let o1 = self.project(i1, outside, plane)?;
                let o2 = self.project(i2, outside, plane)?;
                let (i1, i2) = (Slot::Source(i1), Slot::Source(i2));
                Ok(vec![[i1, i2, o2], [i1, o2, o1]])
            }
            Violation::Corner(p1, p2) => {
                let corner = self.corner(p1, p2, support)?;
                Ok(vec![[Slot::Source(i1), Slot::Source(i2), corner]])
            }
        }
    }

    fn one_inside(
        &self,
        inside: u32,
        [o1, o2]: [u32; 2],
        support: &Plane,
    ) -> Result<Vec<[Slot; 3]>, IntersectionKind> {
        let i = Slot::Source(inside);
        match (self.violation(o1), self.violation(o2)) {
            (Violation::Single(p1), Violation::Single(p2)) if p1 != p2 => {
                let c1 = self.project(inside, o1, p1)?;
                let c2 = self.project(inside, o2, p2)?;
                // The far edge wraps around the frustum edge between p1 and
                // p2. Planes that never meet inside the volume (opposite
                // sides) leave a band of that edge inside.
                match self.corner(p1, p2, support) {
                    Ok(corner) if self.escapes(corner).is_empty() => {
                        Ok(vec![[i, c1, corner], [i, corner, c2]])
                    }
                    _ => Ok(self.polygon([inside, o1, o2])),
                }
            }
            (v1, v2) => {
                let c1 = self.cut_corner(inside, o1, v1, support)?;
                let c2 = self.cut_corner(inside, o2, v2, support)?;
                Ok(vec![[i, c1, c2]])
            }
        }
    }

    fn cut_corner(
        &self,
        inside: u32,
        outside: u32,
        violation: Violation,
        support: &Plane,
    ) -> Result<Slot, IntersectionKind> {
        match violation {
            Violation::Single(plane) => self.project(inside, outside, plane),
            Violation::Corner(p1, p2) => self.corner(p1, p2, support),
        }
    }

    /// Point where the edge from `inside` to `outside` crosses `plane`.
    ///
    /// With bounds-based classification an inside vertex can itself be past
    /// `plane`; the edge then has no crossing and the inside vertex stands in
    /// for it.
    fn project(
        &self,
        inside: u32,
        outside: u32,
        plane: FrustumPlane,
    ) -> Result<Slot, IntersectionKind> {
        let frustum_plane = self.frustum.plane(plane);
        let from = self.classification.world(inside);
        if !frustum_plane.side(from) {
            return Ok(Slot::Source(inside));
        }

        let to = self.classification.world(outside);
        let world = frustum_plane
            .project_between(from, to, self.epsilon)
            .ok_or(IntersectionKind::RayPlane(plane))?;
        Ok(Slot::Cut(CutVertex {
            world,
            edge: Some((inside, outside, plane)),
        }))
    }

    /// Point on both frustum planes and the triangle's supporting plane.
    fn corner(
        &self,
        p1: FrustumPlane,
        p2: FrustumPlane,
        support: &Plane,
    ) -> Result<Slot, IntersectionKind> {
        let (a, b) = (self.frustum.plane(p1), self.frustum.plane(p2));
        let world = intersect_three(a, support, b, self.epsilon)
            .or_else(|| intersect_three(a, b, support, self.epsilon))
            .ok_or(IntersectionKind::ThreePlane(p1, p2))?;
        Ok(Slot::Cut(CutVertex { world, edge: None }))
    }

    /// False for a corner solution outside the source triangle. Edge cuts lie
    /// on the source edges by construction.
    fn within(&self, source: [Vec3; 3], slot: Slot) -> bool {
        match slot {
            Slot::Cut(CutVertex { world, edge: None }) => {
                let weights = barycentric(world, source);
                weights.x.min(weights.y).min(weights.z) >= -self.epsilon
            }
            _ => true,
        }
    }

    /// Sutherland-Hodgman clip of the whole triangle against every plane one
    /// of its corners fails, fanned from the first corner. Planes no corner
    /// fails cannot cut a triangle, so the result is exact.
    fn polygon(&self, corners: [u32; 3]) -> Vec<[Slot; 3]> {
        let planes: PlaneSet = corners
            .iter()
            .flat_map(|&i| self.classification.class(i).failed.iter())
            .collect();

        let mut polygon: Vec<Slot> = corners.map(Slot::Source).to_vec();
        for which in planes.iter() {
            if polygon.len() < 3 {
                break;
            }
            let plane = self.frustum.plane(which);
            let mut output = Vec::with_capacity(polygon.len() + 1);
            for (k, &current) in polygon.iter().enumerate() {
                let next = polygon[(k + 1) % polygon.len()];
                let (from, to) = (self.world_of(current), self.world_of(next));
                let (d1, d2) = (plane.signed_distance(from), plane.signed_distance(to));

                if d1 >= 0.0 {
                    output.push(current);
                }
                if (d1 >= 0.0) != (d2 >= 0.0) {
                    output.push(Slot::Cut(CutVertex {
                        world: from.lerp(to, d1 / (d1 - d2)),
                        edge: self.crossing(current, next, which),
                    }));
                }
            }
            polygon = output;
        }

        (1..polygon.len().saturating_sub(1))
            .map(|k| [polygon[0], polygon[k], polygon[k + 1]])
            .collect()
    }

    /// Weld key for a polygon edge crossing `plane`. Inside-to-outside
    /// source edges share the key of a projected cut.
    fn crossing(&self, from: Slot, to: Slot, plane: FrustumPlane) -> Option<EdgeKey> {
        let (Slot::Source(a), Slot::Source(b)) = (from, to) else {
            return None;
        };
        match (self.classification.is_inside(a), self.classification.is_inside(b)) {
            (true, false) => Some((a, b, plane)),
            (false, true) => Some((b, a, plane)),
            _ => Some((a.min(b), a.max(b), plane)),
        }
    }

    /// The planes `index` is cut against: its deepest violated plane, or the
    /// two deepest when it violates more than one.
    fn violation(&self, index: u32) -> Violation {
        let point = self.classification.world(index);
        let mut depths = FrustumPlane::ALL
            .map(|which| (which, self.frustum.plane(which).signed_distance(point)));
        depths.sort_by(|a, b| a.1.total_cmp(&b.1));

        if self.classification.class(index).failed.len() >= 2 {
            Violation::Corner(depths[0].0, depths[1].0)
        } else {
            Violation::Single(depths[0].0)
        }
    }

    /// Appends the pieces, skipping slivers and restoring the source winding
    /// where a corner solution flipped it.
    fn emit(
        &self,
        corners: [u32; 3],
        support: &Plane,
        pieces: Vec<[Slot; 3]>,
        builder: &mut ClipBuilder,
    ) {
        let [a, b, c] = corners.map(|i| self.classification.world(i));
        let source_area = (b - a).cross(c - a).magnitude();
        // Pieces of one triangle always share their cut vertices, welded or not.
        let mut resolved: Vec<(Slot, u32)> = Vec::with_capacity(4);

        for piece in pieces {
            let [pa, pb, pc] = piece.map(|slot| self.world_of(slot));
            let normal = (pb - pa).cross(pc - pa);
            if normal.magnitude() <= self.epsilon * source_area {
                builder.stats_mut().degenerate += 1;
                continue;
            }
            let piece = if normal.dot(support.normal) < 0.0 {
                [piece[0], piece[2], piece[1]]
            } else {
                piece
            };
            let indices = piece.map(|slot| {
                if let Some(&(_, index)) = resolved.iter().find(|(seen, _)| *seen == slot) {
                    return index;
                }
                let index = builder.resolve(slot, corners);
                resolved.push((slot, index));
                index
            });
            builder.push_triangle(indices);
        }
    }

    fn world_of(&self, slot: Slot) -> Vec3 {
        match slot {
            Slot::Source(index) => self.classification.world(index),
            Slot::Cut(cut) => cut.world,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipper::VertexClassifier;
    use crate::math::{Aabb, Mat4};
    use crate::mesh::Mesh;

    fn unit_box() -> Frustum {
        Frustum::from_box(&Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0))).unwrap()
    }

    fn classify(points: &[Vec3]) -> Classification {
        VertexClassifier::default().classify(&Mat4::identity(), points, &unit_box())
    }

    #[test]
    fn class_rotation_preserves_winding() {
        let classification = classify(&[
            Vec3::ZERO,
            Vec3::new(5.0, 0.0, 0.0),
            Vec3::new(0.5, 0.5, 0.0),
        ]);
        assert_eq!(
            TriangleClass::of([0, 1, 2], &classification),
            TriangleClass::TwoInside {
                inside: [2, 0],
                outside: 1
            }
        );
        assert_eq!(
            TriangleClass::of([1, 2, 0], &classification),
            TriangleClass::TwoInside {
                inside: [2, 0],
                outside: 1
            }
        );

        let classification = classify(&[
            Vec3::new(5.0, 0.0, 0.0),
            Vec3::ZERO,
            Vec3::new(0.0, 5.0, 0.0),
        ]);
        assert_eq!(
            TriangleClass::of([0, 1, 2], &classification),
            TriangleClass::OneInside {
                inside: 1,
                outside: [2, 0]
            }
        );
    }

    #[test]
    fn all_in_and_all_out() {
        let classification = classify(&[Vec3::ZERO, Vec3::splat(0.5), Vec3::splat(5.0)]);
        assert_eq!(TriangleClass::of([0, 1, 0], &classification), TriangleClass::Inside);
        assert_eq!(TriangleClass::of([2, 2, 2], &classification), TriangleClass::Outside);
    }

    #[test]
    fn deepest_planes_are_chosen() {
        let points = [Vec3::new(3.0, 1.5, 5.0)];
        let classification = classify(&points);
        let frustum = unit_box();
        let clipper = TriangleClipper::new(&frustum, &classification, 1e-4);
        // Far by 4, Right by 2, Top by 0.5.
        assert_eq!(
            clipper.violation(0),
            Violation::Corner(FrustumPlane::Far, FrustumPlane::Right)
        );
    }

    #[test]
    fn failed_cut_leaves_builder_untouched() {
        // Degenerate source triangle: a line from inside to outside.
        let points = vec![
            Vec3::ZERO,
            Vec3::new(0.5, 0.0, 0.0),
            Vec3::new(3.0, 0.0, 0.0),
        ];
        let mesh = Mesh::new(points.clone(), vec![0, 1, 2]).unwrap();
        let classification = classify(&points);
        let frustum = unit_box();
        let clipper = TriangleClipper::new(&frustum, &classification, 1e-4);
        let inside = classification.inside_indices();
        let mut builder = ClipBuilder::new(&mesh, inside, Mat4::identity(), true);

        clipper.clip(0, [0, 1, 2], &mut builder);
        assert_eq!(builder.stats_mut().dropped, 1);
        assert_eq!(builder.stats_mut().synthesized, 0);
        assert!(builder.finish().unwrap().is_empty());
    }
}
