//! Scene collaborators used by the clip pipeline.
//!
//! The pipeline only needs two things from a host scene: a way to find
//! clippable objects by tag ([`SceneQuery`]) and a way to create, fill and
//! later place duplicates of them ([`ObjectInstancer`]). [`Scene`] is a
//! small in-memory implementation of both, used by the CLI and the tests.

use std::collections::BTreeMap;
use std::fmt::Debug;

use crate::math::Vec3;
use crate::mesh::Mesh;
use crate::transform::Transform;

/// Stable identifier of an object in a scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u32);

/// Read-only view of a clippable object.
#[derive(Clone, Copy, Debug)]
pub struct SceneObject<'a> {
    pub id: ObjectId,
    pub transform: &'a Transform,
    pub mesh: &'a Mesh,
}

/// Finds the objects a snapshot should clip.
pub trait SceneQuery {
    /// Active objects carrying `tag`.
    fn find_by_tag(&self, tag: &str) -> Vec<SceneObject<'_>>;
}

/// Creates and places the duplicates produced by a snapshot.
pub trait ObjectInstancer {
    type Handle: Copy + Debug + PartialEq;

    /// Inactive copy of `source`, positioned at `offset` from the camera and
    /// rotated by `rotation` (Euler angles, radians), until placed. `None`
    /// when `source` no longer exists.
    fn duplicate(
        &mut self,
        source: ObjectId,
        offset: Vec3,
        rotation: Vec3,
    ) -> Option<Self::Handle>;

    /// Replaces the duplicate's mesh with the clipped one.
    fn assign_mesh(&mut self, handle: Self::Handle, mesh: Mesh);

    /// Moves the duplicate to a world position and activates it.
    fn place(&mut self, handle: Self::Handle, position: Vec3, rotation: Vec3);

    /// Removes a duplicate that will never be placed.
    fn discard(&mut self, handle: Self::Handle);
}

/// An object owned by a [`Scene`].
#[derive(Clone, Debug)]
pub struct Entity {
    pub name: String,
    pub tags: Vec<String>,
    pub transform: Transform,
    pub mesh: Mesh,
    /// Inactive entities are invisible to [`SceneQuery`].
    pub active: bool,
}

impl Entity {
    pub fn new(name: impl Into<String>, transform: Transform, mesh: Mesh) -> Self {
        Self {
            name: name.into(),
            tags: Vec::new(),
            transform,
            mesh,
            active: true,
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// In-memory scene. Object ids are never reused.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    entities: BTreeMap<ObjectId, Entity>,
    next_id: u32,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, entity: Entity) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        self.entities.insert(id, entity);
        id
    }

    pub fn get(&self, id: ObjectId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    pub fn remove(&mut self, id: ObjectId) -> Option<Entity> {
        self.entities.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &Entity)> {
        self.entities.iter().map(|(&id, entity)| (id, entity))
    }
}

impl SceneQuery for Scene {
    fn find_by_tag(&self, tag: &str) -> Vec<SceneObject<'_>> {
        self.iter()
            .filter(|(_, entity)| entity.active && entity.has_tag(tag))
            .map(|(id, entity)| SceneObject {
                id,
                transform: &entity.transform,
                mesh: &entity.mesh,
            })
            .collect()
    }
}

impl ObjectInstancer for Scene {
    type Handle = ObjectId;

    fn duplicate(&mut self, source: ObjectId, offset: Vec3, rotation: Vec3) -> Option<ObjectId> {
        let mut copy = self.get(source)?.clone();
        copy.name.push_str(" (clipped)");
        copy.active = false;
        copy.transform.set_position(offset).set_rotation(rotation);
        Some(self.spawn(copy))
    }

    fn assign_mesh(&mut self, handle: ObjectId, mesh: Mesh) {
        if let Some(entity) = self.get_mut(handle) {
            entity.mesh = mesh;
        }
    }

    fn place(&mut self, handle: ObjectId, position: Vec3, rotation: Vec3) {
        if let Some(entity) = self.get_mut(handle) {
            entity.transform.set_position(position).set_rotation(rotation);
            entity.active = true;
        }
    }

    fn discard(&mut self, handle: ObjectId) {
        self.remove(handle);
    }
}
