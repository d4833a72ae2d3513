//! Mesh clipping against a world-space frustum.
//!
//! A pass runs in three stages:
//!
//! - [`classify`]: every vertex is transformed to world space and marked
//!   inside or outside.
//! - [`triangle`]: each triangle is kept, discarded, or cut against the
//!   planes its outside corners violate. New vertices are appended to a
//!   single builder so their indices stay stable.
//! - [`rebuild`]: kept vertices are compacted and triangle indices remapped
//!   into a fresh [`Mesh`].
//!
//! Source meshes are never modified.

pub mod classify;
pub mod rebuild;
pub mod triangle;

mod builder;

use std::ops::AddAssign;

use log::debug;

pub use classify::{Classification, VertexClass, VertexClassifier};
pub use rebuild::rebuild;
pub use triangle::TriangleClass;

use crate::config::ClipConfig;
use crate::error::{ClipError, ClipFailure, Result};
use crate::frustum::Frustum;
use crate::mesh::Mesh;
use crate::transform::Transform;
use builder::ClipBuilder;
use triangle::TriangleClipper;

/// Counters for one or more clipping passes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClipStats {
    /// Source triangles kept unchanged.
    pub retained: usize,
    /// Source triangles cut against the frustum.
    pub clipped: usize,
    /// Source triangles entirely outside.
    pub discarded: usize,
    /// Source triangles lost to a [`ClipFailure`].
    pub dropped: usize,
    /// Emitted pieces skipped for having (near) zero area.
    pub degenerate: usize,
    pub synthesized: usize,
    /// Cut vertices reused from a neighbouring triangle.
    pub welded: usize,
}

impl AddAssign for ClipStats {
    fn add_assign(&mut self, other: Self) {
        self.retained += other.retained;
        self.clipped += other.clipped;
        self.discarded += other.discarded;
        self.dropped += other.dropped;
        self.degenerate += other.degenerate;
        self.synthesized += other.synthesized;
        self.welded += other.welded;
    }
}

/// Result of clipping one mesh.
#[derive(Clone, Debug)]
pub struct ClippedMesh {
    /// New mesh in the source's local space.
    pub mesh: Mesh,
    /// Triangles that could not be clipped and were dropped.
    pub diagnostics: Vec<ClipFailure>,
    pub stats: ClipStats,
}

impl ClippedMesh {
    /// True when no triangle survived. Diagnostics may still be present.
    pub fn is_empty(&self) -> bool {
        self.mesh.is_empty()
    }
}

/// Clips meshes against a frustum with a fixed configuration.
#[derive(Clone, Copy, Debug)]
pub struct MeshClipper {
    classifier: VertexClassifier,
    weld_edges: bool,
}

impl Default for MeshClipper {
    fn default() -> Self {
        Self::new(&ClipConfig::default())
    }
}

impl MeshClipper {
    pub fn new(config: &ClipConfig) -> Self {
        Self {
            classifier: config.classifier(),
            weld_edges: config.weld_edges,
        }
    }

    pub fn classifier(&self) -> &VertexClassifier {
        &self.classifier
    }

    /// Clips `mesh`, placed in the world by `transform`, against `frustum`.
    ///
    /// Returns `Ok(None)` when no vertex is inside. Individual triangles that
    /// cannot be clipped are dropped and listed in
    /// [`ClippedMesh::diagnostics`], which is kept even when no triangle
    /// survives and the mesh is empty. Only structural problems are errors.
    pub fn clip(
        &self,
        mesh: &Mesh,
        transform: &Transform,
        frustum: &Frustum,
    ) -> Result<Option<ClippedMesh>> {
        let to_world = transform.to_matrix();
        let classification = self
            .classifier
            .classify(&to_world, mesh.positions(), frustum);

        if classification.inside_count() == 0 {
            debug!("no vertex of {} inside the frustum", mesh.vertex_count());
            return Ok(None);
        }

        let to_local = transform.inverse_matrix().ok_or(ClipError::SingularTransform)?;
        let mut builder = ClipBuilder::new(
            mesh,
            classification.inside_indices(),
            to_local,
            self.weld_edges,
        );
        let clipper = TriangleClipper::new(frustum, &classification, self.classifier.epsilon());
        for (index, corners) in mesh.triangles().enumerate() {
            clipper.clip(index, corners, &mut builder);
        }

        let clipped = builder.finish()?;
        if clipped.is_empty() {
            debug!(
                "every triangle clipped away, {} dropped",
                clipped.diagnostics.len()
            );
        } else {
            debug!(
                "clipped {} -> {} triangles ({:?})",
                mesh.triangle_count(),
                clipped.mesh.triangle_count(),
                clipped.stats
            );
        }
        Ok(Some(clipped))
    }
}

/// Clips one mesh with `config`. See [`MeshClipper::clip`].
pub fn clip_mesh(
    mesh: &Mesh,
    transform: &Transform,
    frustum: &Frustum,
    config: &ClipConfig,
) -> Result<Option<ClippedMesh>> {
    MeshClipper::new(config).clip(mesh, transform, frustum)
}
