//! Append-only output buffers for one clipping pass.

use std::collections::HashMap;

use log::trace;

use super::rebuild::rebuild;
use super::{ClipStats, ClippedMesh};
use crate::error::{ClipFailure, Result};
use crate::frustum::FrustumPlane;
use crate::math::{Mat4, Vec2, Vec3};
use crate::mesh::Mesh;

/// Identifies the cut of the edge from an inside vertex to an outside vertex
/// by one frustum plane. Neighbouring triangles that share the edge produce
/// the same key.
pub(crate) type EdgeKey = (u32, u32, FrustumPlane);

/// A new world-space vertex produced by clipping.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct CutVertex {
    pub world: Vec3,
    /// Set for edge/plane intersections; corner solutions are never shared.
    pub edge: Option<EdgeKey>,
}

/// One corner of an emitted triangle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Slot {
    Source(u32),
    Cut(CutVertex),
}

/// Output of a clipping pass under construction.
///
/// Original vertices keep their indices; synthesized ones are appended to
/// every parallel buffer in the same call, so an index returned here stays
/// valid for the rest of the pass.
pub(crate) struct ClipBuilder {
    to_local: Mat4,
    positions: Vec<Vec3>,
    uvs: Option<Vec<Vec2>>,
    kept: Vec<u32>,
    triangles: Vec<[u32; 3]>,
    welded: Option<HashMap<EdgeKey, u32>>,
    diagnostics: Vec<ClipFailure>,
    stats: ClipStats,
}

impl ClipBuilder {
    /// `inside` must list the source's inside vertices in ascending order.
    pub fn new(
        source: &Mesh,
        inside: impl IntoIterator<Item = u32>,
        to_local: Mat4,
        weld_edges: bool,
    ) -> Self {
        Self {
            to_local,
            positions: source.positions().to_vec(),
            uvs: source.uvs().map(<[Vec2]>::to_vec),
            kept: inside.into_iter().collect(),
            triangles: Vec::with_capacity(source.triangle_count()),
            welded: weld_edges.then(HashMap::new),
            diagnostics: Vec::new(),
            stats: ClipStats::default(),
        }
    }

    pub fn stats_mut(&mut self) -> &mut ClipStats {
        &mut self.stats
    }

    pub fn fail(&mut self, failure: ClipFailure) {
        self.stats.dropped += 1;
        self.diagnostics.push(failure);
    }

    pub fn push_triangle(&mut self, triangle: [u32; 3]) {
        self.triangles.push(triangle);
    }

    /// Index for `slot`, appending a new vertex when needed. `source` is the
    /// triangle being clipped; cut vertices take their UV from it.
    pub fn resolve(&mut self, slot: Slot, source: [u32; 3]) -> u32 {
        match slot {
            Slot::Source(index) => index,
            Slot::Cut(cut) => {
                let cached = cut
                    .edge
                    .and_then(|key| self.welded.as_ref()?.get(&key).copied());
                if let Some(index) = cached {
                    self.stats.welded += 1;
                    return index;
                }

                let index = self.push_vertex(cut.world, source);
                if let (Some(key), Some(welded)) = (cut.edge, self.welded.as_mut()) {
                    welded.insert(key, index);
                }
                index
            }
        }
    }

    /// Appends a vertex given in world space and registers it as kept.
    fn push_vertex(&mut self, world: Vec3, source: [u32; 3]) -> u32 {
        let local = self.to_local.transform_point(world);
        let index = self.positions.len() as u32;

        if let Some(uvs) = self.uvs.as_mut() {
            let corners = source.map(|i| self.positions[i as usize]);
            let weights = barycentric(local, corners);
            let [ua, ub, uc] = source.map(|i| uvs[i as usize]);
            uvs.push(ua * weights.x + ub * weights.y + uc * weights.z);
        }
        self.positions.push(local);
        self.kept.push(index);
        self.stats.synthesized += 1;

        trace!("synthesized vertex {index} at {world:?}");
        index
    }

    /// Compacts the buffers into the output mesh. The mesh is empty when no
    /// triangle survived; diagnostics and stats are returned either way.
    pub fn finish(self) -> Result<ClippedMesh> {
        let mesh = if self.triangles.is_empty() {
            Mesh::default()
        } else {
            rebuild(
                &self.kept,
                &self.positions,
                self.uvs.as_deref(),
                &self.triangles,
            )?
        };
        Ok(ClippedMesh {
            mesh,
            diagnostics: self.diagnostics,
            stats: self.stats,
        })
    }
}

/// Barycentric weights of `p` (projected onto the triangle's plane).
/// Degenerate triangles weight the first corner fully.
pub(crate) fn barycentric(p: Vec3, [a, b, c]: [Vec3; 3]) -> Vec3 {
    let (v0, v1, v2) = (b - a, c - a, p - a);
    let d00 = v0.dot(v0);
    let d01 = v0.dot(v1);
    let d11 = v1.dot(v1);
    let d20 = v2.dot(v0);
    let d21 = v2.dot(v1);
    let denominator = d00 * d11 - d01 * d01;
    if denominator.abs() <= f32::EPSILON * (d00 * d11).max(f32::MIN_POSITIVE) {
        return Vec3::new(1.0, 0.0, 0.0);
    }
    let v = (d11 * d20 - d01 * d21) / denominator;
    let w = (d00 * d21 - d01 * d20) / denominator;
    Vec3::new(1.0 - v - w, v, w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn textured_triangle() -> Mesh {
        Mesh::new(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(2.0, 0.0, 0.0),
                Vec3::new(0.0, 2.0, 0.0),
            ],
            vec![0, 1, 2],
        )
        .unwrap()
        .with_uvs(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, 1.0),
        ])
        .unwrap()
    }

    fn cut(world: Vec3, edge: Option<EdgeKey>) -> Slot {
        Slot::Cut(CutVertex { world, edge })
    }

    #[test]
    fn barycentric_weights() {
        let corners = [Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)];
        let w = barycentric(Vec3::new(0.25, 0.5, 0.0), corners);
        assert_relative_eq!(w, Vec3::new(0.25, 0.25, 0.5), epsilon = 1e-6);
        let w = barycentric(Vec3::new(0.3, 0.3, 0.0), [Vec3::ZERO; 3]);
        assert_eq!(w, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn appends_in_local_space_with_interpolated_uv() {
        let mesh = textured_triangle();
        let to_local = Mat4::translation(-10.0, 0.0, 0.0);
        let mut builder = ClipBuilder::new(&mesh, [0, 1], to_local, true);

        let index = builder.resolve(cut(Vec3::new(11.0, 1.0, 0.0), None), [0, 1, 2]);
        assert_eq!(index, 3);
        builder.push_triangle([0, 1, index]);

        let clipped = builder.finish().unwrap();
        let positions = clipped.mesh.positions();
        assert_eq!(positions.len(), 3);
        assert_relative_eq!(positions[2], Vec3::new(1.0, 1.0, 0.0), epsilon = 1e-6);
        let uvs = clipped.mesh.uvs().unwrap();
        assert_relative_eq!(uvs[2].x, 0.5, epsilon = 1e-6);
        assert_relative_eq!(uvs[2].y, 0.5, epsilon = 1e-6);
        assert_eq!(clipped.stats.synthesized, 1);
    }

    #[test]
    fn welds_shared_edges() {
        let mesh = textured_triangle();
        let key = (0, 2, FrustumPlane::Top);
        let mut builder = ClipBuilder::new(&mesh, [0, 1], Mat4::identity(), true);

        let first = builder.resolve(cut(Vec3::new(0.0, 1.0, 0.0), Some(key)), [0, 1, 2]);
        let second = builder.resolve(cut(Vec3::new(0.0, 1.0, 0.0), Some(key)), [0, 1, 2]);
        assert_eq!(first, second);
        assert_eq!(builder.stats_mut().welded, 1);

        let mut unwelded = ClipBuilder::new(&mesh, [0, 1], Mat4::identity(), false);
        let a = unwelded.resolve(cut(Vec3::new(0.0, 1.0, 0.0), Some(key)), [0, 1, 2]);
        let b = unwelded.resolve(cut(Vec3::new(0.0, 1.0, 0.0), Some(key)), [0, 1, 2]);
        assert_ne!(a, b);
    }

    #[test]
    fn source_slots_reuse_original_indices() {
        let mesh = textured_triangle();
        let mut builder = ClipBuilder::new(&mesh, [0, 1, 2], Mat4::identity(), true);
        assert_eq!(builder.resolve(Slot::Source(2), [0, 1, 2]), 2);
        assert_eq!(builder.stats_mut().synthesized, 0);
    }

    #[test]
    fn nothing_emitted_is_empty() {
        let mesh = textured_triangle();
        let builder = ClipBuilder::new(&mesh, [0], Mat4::identity(), true);
        let clipped = builder.finish().unwrap();
        assert!(clipped.is_empty());
        assert_eq!(clipped.mesh.vertex_count(), 0);
    }

    #[test]
    fn failures_survive_an_empty_result() {
        let mesh = textured_triangle();
        let mut builder = ClipBuilder::new(&mesh, [0], Mat4::identity(), true);
        let failure = ClipFailure::OutsideFrustum {
            triangle: 0,
            planes: [FrustumPlane::Far].into_iter().collect(),
        };
        builder.fail(failure);

        let clipped = builder.finish().unwrap();
        assert!(clipped.is_empty());
        assert_eq!(clipped.diagnostics, vec![failure]);
        assert_eq!(clipped.stats.dropped, 1);
    }
}
