//! Frustum clipping for triangle meshes.
//!
//! Cuts meshes against a six-plane view frustum and rebuilds compact meshes
//! holding only the geometry inside it. Straddling triangles are split along
//! the frustum planes, with new vertices synthesized on the cut.
//!
//! # Quick Start
//!
//! ```
//! use frustum_clip::prelude::*;
//!
//! let camera = Camera::new(Vec3::new(0.0, 0.0, -5.0));
//! let frustum = Projection::from_degrees(60.0, 1.0, 0.1, 100.0)
//!     .frustum(&camera)
//!     .unwrap();
//!
//! let cube = Mesh::cube(1.0);
//! let clipped = clip_mesh(&cube, &Transform::default(), &frustum, &ClipConfig::default())
//!     .unwrap()
//!     .expect("cube is in view");
//! assert_eq!(clipped.mesh.triangle_count(), 12);
//! ```

// Public API - exposed to library consumers
pub mod camera;
pub mod clipper;
pub mod config;
pub mod error;
pub mod frustum;
pub mod math;
pub mod mesh;
pub mod pipeline;
pub mod plane;
pub mod projection;
pub mod scene;
pub mod transform;

// Re-export commonly needed types at crate root for convenience
pub use camera::Camera;
pub use clipper::{clip_mesh, ClipStats, ClippedMesh, MeshClipper, VertexClassifier};
pub use config::{ClipConfig, VertexTest};
pub use error::{ClipError, ClipFailure, MeshError, Result};
pub use frustum::{Frustum, FrustumPlane, PlaneSet};
pub use mesh::Mesh;
pub use pipeline::{ClipPipeline, PendingObject, SnapshotReport};
pub use plane::Plane;
pub use projection::Projection;
pub use scene::{ObjectId, ObjectInstancer, Scene, SceneQuery};
pub use transform::Transform;

/// Prelude module for convenient imports.
///
/// # Example
/// ```
/// use frustum_clip::prelude::*;
/// ```
pub mod prelude {
    // Camera
    pub use crate::camera::Camera;
    pub use crate::projection::Projection;

    // Clipping
    pub use crate::clipper::{clip_mesh, ClippedMesh, MeshClipper};
    pub use crate::config::{ClipConfig, VertexTest};
    pub use crate::frustum::{Frustum, FrustumPlane};
    pub use crate::pipeline::ClipPipeline;

    // Scene
    pub use crate::mesh::Mesh;
    pub use crate::scene::{Entity, ObjectInstancer, Scene, SceneQuery};
    pub use crate::transform::Transform;

    // Math
    pub use crate::math::mat4::Mat4;
    pub use crate::math::vec2::Vec2;
    pub use crate::math::vec3::Vec3;
    pub use crate::math::vec4::Vec4;
    pub use crate::plane::Plane;
}
