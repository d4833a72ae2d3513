//! Error types for mesh handling and clipping.
//!
//! Failures are split by blast radius:
//! - [`ClipFailure`]: one triangle could not be clipped; it is dropped and the
//!   failure recorded as a diagnostic, the object still clips.
//! - [`ClipError`]: one object could not be clipped; the pipeline skips it.
//!   [`ClipError::InvalidFrustum`] is raised before a pass starts and aborts it.
//! - [`MeshError`]: a mesh failed validation or could not be loaded.

use std::fmt;

use thiserror::Error;

use crate::frustum::{FrustumPlane, PlaneSet};
use crate::scene::ObjectId;

/// Errors raised while constructing or loading a [`Mesh`](crate::mesh::Mesh).
#[derive(Error, Debug)]
pub enum MeshError {
    #[error("index buffer length {0} is not a multiple of 3")]
    IndexCountNotMultipleOfThree(usize),

    #[error("index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },

    #[error("{uvs} texture coordinates for {vertices} vertices")]
    UvCountMismatch { uvs: usize, vertices: usize },

    #[error("failed to load OBJ: {0}")]
    Obj(#[from] tobj::LoadError),

    #[error("OBJ file contains no meshes")]
    NoMeshes,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors that abort clipping of a single object (or, for
/// [`ClipError::InvalidFrustum`], a whole pass).
#[derive(Error, Debug)]
pub enum ClipError {
    #[error("invalid source mesh: {0}")]
    InvalidMesh(#[from] MeshError),

    /// The object's world matrix cannot be inverted, so synthesized vertices
    /// cannot be mapped back into object space.
    #[error("object transform is singular")]
    SingularTransform,

    #[error("frustum {0:?} plane has a zero or non-finite normal")]
    InvalidFrustum(FrustumPlane),

    /// An emitted triangle references a vertex that was never registered
    /// with the rebuild. Indicates an internal bookkeeping bug.
    #[error("triangle index {index} has no compacted vertex")]
    InconsistentRemap { index: u32 },

    /// The instancer could not copy an object that was clipped in the same
    /// pass.
    #[error("source object {0:?} no longer exists")]
    MissingSource(ObjectId),
}

/// Result type for clipping operations.
pub type Result<T> = std::result::Result<T, ClipError>;

/// What went wrong with a single intersection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntersectionKind {
    /// Edge runs parallel to the plane it should cross.
    RayPlane(FrustumPlane),
    /// The two violated planes and the triangle's plane have no unique
    /// common point in either order.
    ThreePlane(FrustumPlane, FrustumPlane),
    /// The triangle is too thin to define a supporting plane.
    SupportingPlane,
}

impl fmt::Display for IntersectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RayPlane(plane) => write!(f, "edge parallel to {plane:?} plane"),
            Self::ThreePlane(a, b) => write!(f, "no corner for {a:?}/{b:?} planes"),
            Self::SupportingPlane => write!(f, "degenerate supporting plane"),
        }
    }
}

/// A non-fatal, per-triangle clipping failure. The triangle is dropped.
#[derive(Error, Clone, Copy, Debug, PartialEq)]
pub enum ClipFailure {
    #[error("triangle {triangle}: degenerate intersection ({kind})")]
    DegenerateIntersection {
        triangle: usize,
        kind: IntersectionKind,
    },

    /// A synthesized vertex landed outside planes it was not clipped against.
    #[error("triangle {triangle}: synthesized vertex outside {planes:?}")]
    OutsideFrustum { triangle: usize, planes: PlaneSet },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = MeshError::IndexOutOfRange {
            index: 9,
            vertex_count: 3,
        };
        assert_eq!(err.to_string(), "index 9 out of range for 3 vertices");

        let err = ClipError::from(MeshError::IndexCountNotMultipleOfThree(4));
        assert!(err.to_string().contains("multiple of 3"));

        let failure = ClipFailure::DegenerateIntersection {
            triangle: 2,
            kind: IntersectionKind::ThreePlane(FrustumPlane::Left, FrustumPlane::Top),
        };
        assert!(failure.to_string().contains("Left/Top"));
    }

    #[test]
    fn errors_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ClipError>();
        assert_send_sync::<ClipFailure>();
    }
}
