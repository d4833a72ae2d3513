//! Per-vertex inside/outside classification against a frustum.

use crate::config::{VertexTest, DEFAULT_EPSILON};
use crate::frustum::{Frustum, PlaneSet};
use crate::math::{Aabb, Mat4, Vec3};

/// Inside/outside status of one vertex.
///
/// `failed` lists the planes the exact world-space point is outside of. It
/// is empty for inside vertices in [`VertexTest::Exact`] mode; in
/// [`VertexTest::Bounds`] mode a vertex can be inside and still fail a plane
/// by less than half the bounds size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VertexClass {
    pub inside: bool,
    pub failed: PlaneSet,
}

/// Classification of a mesh's vertex buffer, with the world-space positions
/// it was computed from.
#[derive(Clone, Debug)]
pub struct Classification {
    world: Vec<Vec3>,
    classes: Vec<VertexClass>,
    inside_count: usize,
}

impl Classification {
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    #[inline]
    pub fn class(&self, index: u32) -> VertexClass {
        self.classes[index as usize]
    }

    #[inline]
    pub fn is_inside(&self, index: u32) -> bool {
        self.classes[index as usize].inside
    }

    #[inline]
    pub fn world(&self, index: u32) -> Vec3 {
        self.world[index as usize]
    }

    pub fn inside_count(&self) -> usize {
        self.inside_count
    }

    pub fn all_inside(&self) -> bool {
        self.inside_count == self.classes.len()
    }

    /// Indices of inside vertices, ascending.
    pub fn inside_indices(&self) -> impl Iterator<Item = u32> + '_ {
        self.classes
            .iter()
            .enumerate()
            .filter(|(_, class)| class.inside)
            .map(|(i, _)| i as u32)
    }
}

/// Decides which vertices of a mesh lie inside a frustum.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VertexClassifier {
    epsilon: f32,
    vertex_test: VertexTest,
}

impl Default for VertexClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_EPSILON, VertexTest::Exact)
    }
}

impl VertexClassifier {
    /// `epsilon` is the numeric tolerance used by the clipper downstream;
    /// `vertex_test` selects exact point tests or per-vertex bounding boxes.
    pub fn new(epsilon: f32, vertex_test: VertexTest) -> Self {
        Self {
            epsilon,
            vertex_test,
        }
    }

    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    pub fn vertex_test(&self) -> VertexTest {
        self.vertex_test
    }

    /// Transforms each vertex by `to_world` and tests it against all six
    /// planes. O(vertices × 6); no side effects.
    pub fn classify(
        &self,
        to_world: &Mat4,
        vertices: &[Vec3],
        frustum: &Frustum,
    ) -> Classification {
        let world: Vec<Vec3> = vertices
            .iter()
            .map(|&v| to_world.transform_point(v))
            .collect();

        let classes: Vec<VertexClass> = world
            .iter()
            .map(|&p| {
                let failed = frustum.failed_planes(p);
                let inside = failed.is_empty()
                    || match self.vertex_test {
                        VertexTest::Exact => false,
                        VertexTest::Bounds { size } => {
                            frustum.intersects_aabb(&Aabb::from_center_size(p, size))
                        }
                    };
                VertexClass { inside, failed }
            })
            .collect();

        let inside_count = classes.iter().filter(|c| c.inside).count();
        Classification {
            world,
            classes,
            inside_count,
        }
    }
}
