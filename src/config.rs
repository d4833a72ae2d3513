//! Clipping configuration.

use crate::clipper::VertexClassifier;

/// Default tolerance for parallel rays, three-plane determinants, and
/// containment of synthesized vertices.
pub const DEFAULT_EPSILON: f32 = 1e-4;

/// Edge length of the cube tested around each vertex in
/// [`VertexTest::Bounds`] mode when no size is given.
pub const DEFAULT_VERTEX_BOUNDS_SIZE: f32 = 0.1;

/// Scene tags the pipeline clips by default.
pub const DEFAULT_TAGS: [&str; 2] = ["StaticObject", "DynamicObject"];

/// How a vertex is decided to be inside the frustum.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum VertexTest {
    /// The world-space point must be inside all six half-spaces.
    #[default]
    Exact,
    /// A cube of edge `size` centered on the world-space point must not be
    /// entirely outside any plane. Keeps vertices just beyond the boundary,
    /// so output can extend up to `size / 2` past the frustum.
    Bounds { size: f32 },
}

impl VertexTest {
    pub fn bounds() -> Self {
        Self::Bounds {
            size: DEFAULT_VERTEX_BOUNDS_SIZE,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClipConfig {
    pub epsilon: f32,
    pub vertex_test: VertexTest,
    /// Reuse the synthesized vertex of an (inside, outside, plane) edge in
    /// every triangle that cuts that edge.
    pub weld_edges: bool,
    /// Tags queried from the scene on each snapshot.
    pub tags: Vec<String>,
}

impl Default for ClipConfig {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
            vertex_test: VertexTest::Exact,
            weld_edges: true,
            tags: DEFAULT_TAGS.iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl ClipConfig {
    pub fn with_epsilon(mut self, epsilon: f32) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_vertex_test(mut self, vertex_test: VertexTest) -> Self {
        self.vertex_test = vertex_test;
        self
    }

    pub fn with_weld_edges(mut self, weld_edges: bool) -> Self {
        self.weld_edges = weld_edges;
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Classifier configured with this tolerance and vertex test.
    pub fn classifier(&self) -> VertexClassifier {
        VertexClassifier::new(self.epsilon, self.vertex_test)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ClipConfig::default();
        assert_eq!(config.epsilon, DEFAULT_EPSILON);
        assert_eq!(config.vertex_test, VertexTest::Exact);
        assert!(config.weld_edges);
        assert_eq!(config.tags, vec!["StaticObject", "DynamicObject"]);
    }

    #[test]
    fn builder_setters() {
        let config = ClipConfig::default()
            .with_epsilon(6e-3)
            .with_vertex_test(VertexTest::bounds())
            .with_weld_edges(false)
            .with_tags(["Props"]);
        assert_eq!(config.epsilon, 6e-3);
        assert_eq!(config.vertex_test, VertexTest::Bounds { size: 0.1 });
        assert!(!config.weld_edges);
        assert_eq!(config.tags, vec!["Props"]);
    }
}
