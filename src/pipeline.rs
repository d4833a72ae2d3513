//! Snapshot orchestration: clip every tagged object against a frustum and
//! hold the resulting duplicates until they are placed.

use std::collections::BTreeSet;

use log::{debug, info, warn};

use crate::clipper::{ClipStats, MeshClipper};
use crate::config::ClipConfig;
use crate::error::{ClipError, ClipFailure};
use crate::frustum::Frustum;
use crate::math::Vec3;
use crate::mesh::Mesh;
use crate::scene::{ObjectId, ObjectInstancer, SceneQuery};

/// A clipped duplicate waiting to be placed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PendingObject<H> {
    pub handle: H,
    pub source: ObjectId,
    /// Source position relative to the camera at snapshot time.
    pub offset: Vec3,
    pub rotation: Vec3,
}

/// An object skipped because its clip failed.
#[derive(Debug)]
pub struct ObjectFailure {
    pub object: ObjectId,
    pub error: ClipError,
}

/// Outcome of one [`ClipPipeline::snapshot`] pass.
#[derive(Debug, Default)]
pub struct SnapshotReport {
    /// Distinct objects found under the configured tags.
    pub considered: usize,
    /// Objects with nothing inside the frustum.
    pub empty: usize,
    /// Objects with vertices in view but no surviving triangle. Their
    /// dropped triangles are still listed in `diagnostics`.
    pub collapsed: usize,
    /// Objects that produced a pending duplicate.
    pub clipped: usize,
    pub failures: Vec<ObjectFailure>,
    /// Dropped triangles, by source object.
    pub diagnostics: Vec<(ObjectId, ClipFailure)>,
    pub stats: ClipStats,
}

struct Snapshot {
    source: ObjectId,
    offset: Vec3,
    rotation: Vec3,
    mesh: Mesh,
}

/// Clips tagged scene objects and manages the pending duplicates.
///
/// Pending duplicates belong to the pipeline from [`snapshot`] until
/// [`place`] hands them back to the scene or the next snapshot discards
/// them.
///
/// [`snapshot`]: ClipPipeline::snapshot
/// [`place`]: ClipPipeline::place
#[derive(Debug)]
pub struct ClipPipeline<H> {
    clipper: MeshClipper,
    tags: Vec<String>,
    pending: Vec<PendingObject<H>>,
}

impl<H> Default for ClipPipeline<H> {
    fn default() -> Self {
        Self::new(&ClipConfig::default())
    }
}

impl<H> ClipPipeline<H> {
    pub fn new(config: &ClipConfig) -> Self {
        Self {
            clipper: MeshClipper::new(config),
            tags: config.tags.clone(),
            pending: Vec::new(),
        }
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn pending(&self) -> &[PendingObject<H>] {
        &self.pending
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

impl<H: Copy + std::fmt::Debug + PartialEq> ClipPipeline<H> {
    /// Clips every active object carrying one of the configured tags against
    /// `frustum`, and replaces the pending list with duplicates holding the
    /// clipped meshes.
    ///
    /// All objects are clipped before the scene is touched. An object whose
    /// clip fails is skipped and reported; the rest of the pass continues.
    /// Previously pending duplicates are discarded.
    pub fn snapshot<W>(
        &mut self,
        world: &mut W,
        frustum: &Frustum,
        camera_position: Vec3,
    ) -> SnapshotReport
    where
        W: SceneQuery + ObjectInstancer<Handle = H>,
    {
        let mut report = SnapshotReport::default();
        let snapshots = self.clip_all(&*world, frustum, camera_position, &mut report);

        for stale in self.pending.drain(..) {
            debug!("discarding unplaced duplicate {:?}", stale.handle);
            world.discard(stale.handle);
        }

        for snapshot in snapshots {
            let Some(handle) = world.duplicate(snapshot.source, snapshot.offset, snapshot.rotation)
            else {
                warn!("{:?} could not be duplicated", snapshot.source);
                report.clipped -= 1;
                report.failures.push(ObjectFailure {
                    object: snapshot.source,
                    error: ClipError::MissingSource(snapshot.source),
                });
                continue;
            };
            world.assign_mesh(handle, snapshot.mesh);
            self.pending.push(PendingObject {
                handle,
                source: snapshot.source,
                offset: snapshot.offset,
                rotation: snapshot.rotation,
            });
        }

        info!(
            "snapshot: {} objects, {} clipped, {} empty, {} collapsed, {} failed, {} triangles dropped",
            report.considered,
            report.clipped,
            report.empty,
            report.collapsed,
            report.failures.len(),
            report.diagnostics.len()
        );
        report
    }

    fn clip_all<Q: SceneQuery + ?Sized>(
        &self,
        scene: &Q,
        frustum: &Frustum,
        camera_position: Vec3,
        report: &mut SnapshotReport,
    ) -> Vec<Snapshot> {
        let mut seen = BTreeSet::new();
        let mut snapshots = Vec::new();

        for tag in &self.tags {
            for object in scene.find_by_tag(tag) {
                if !seen.insert(object.id) {
                    continue;
                }
                report.considered += 1;

                match self.clipper.clip(object.mesh, object.transform, frustum) {
                    Ok(Some(clipped)) => {
                        let collapsed = clipped.is_empty();
                        report.stats += clipped.stats;
                        report
                            .diagnostics
                            .extend(clipped.diagnostics.into_iter().map(|d| (object.id, d)));
                        if collapsed {
                            debug!("{:?} ({tag}): no triangle survived", object.id);
                            report.collapsed += 1;
                            continue;
                        }

                        report.clipped += 1;
                        snapshots.push(Snapshot {
                            source: object.id,
                            offset: object.transform.position() - camera_position,
                            rotation: object.transform.rotation(),
                            mesh: clipped.mesh,
                        });
                    }
                    Ok(None) => report.empty += 1,
                    Err(error) => {
                        warn!("skipping {:?} ({tag}): {error}", object.id);
                        report.failures.push(ObjectFailure {
                            object: object.id,
                            error,
                        });
                    }
                }
            }
        }
        snapshots
    }

    /// Places every pending duplicate at `camera_position` plus its stored
    /// offset, then clears the list. Returns how many were placed.
    pub fn place<I>(&mut self, instancer: &mut I, camera_position: Vec3) -> usize
    where
        I: ObjectInstancer<Handle = H>,
    {
        let count = self.pending.len();
        for pending in self.pending.drain(..) {
            let position = camera_position + pending.offset;
            instancer.place(pending.handle, position, pending.rotation);
        }
        if count > 0 {
            info!("placed {count} clipped objects");
        }
        count
    }

    /// Discards every pending duplicate without placing it.
    pub fn clear<I>(&mut self, instancer: &mut I)
    where
        I: ObjectInstancer<Handle = H>,
    {
        for pending in self.pending.drain(..) {
            instancer.discard(pending.handle);
        }
    }
}
