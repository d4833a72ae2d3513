use frustum_clip::prelude::*;
use frustum_clip::ObjectId;

fn camera() -> Camera {
    Camera::looking_at(Vec3::new(0.0, 1.0, -6.0), Vec3::new(0.0, 1.0, 0.0))
}

fn frustum(camera: &Camera) -> Frustum {
    Projection::from_degrees(40.0, 1.0, 0.5, 20.0)
        .frustum(camera)
        .unwrap()
}

fn object(scene: &mut Scene, name: &str, position: Vec3, tag: &str) -> ObjectId {
    let entity = Entity::new(name, Transform::from_position(position), Mesh::cube(1.0));
    scene.spawn(entity.with_tag(tag))
}

fn world_points(entity: &Entity) -> Vec<Vec3> {
    let to_world = entity.transform.to_matrix();
    entity
        .mesh
        .positions()
        .iter()
        .map(|&p| to_world.transform_point(p))
        .collect()
}

#[test]
fn snapshot_then_place_in_front_of_the_camera() {
    let mut scene = Scene::new();
    let crate_id = object(&mut scene, "crate", Vec3::new(0.0, 1.0, 0.0), "StaticObject");
    let edge_id = object(&mut scene, "edge", Vec3::new(2.2, 1.0, 0.0), "DynamicObject");
    object(&mut scene, "behind", Vec3::new(0.0, 1.0, -12.0), "StaticObject");
    object(&mut scene, "prop", Vec3::new(0.0, 1.0, 0.0), "Untagged");

    let camera = camera();
    let frustum = frustum(&camera);
    let mut pipeline = ClipPipeline::default();
    let report = pipeline.snapshot(&mut scene, &frustum, camera.position());

    assert_eq!(report.considered, 3);
    assert_eq!(report.clipped, 2);
    assert_eq!(report.empty, 1);
    assert!(report.failures.is_empty());
    assert!(report.stats.retained > 0);
    assert!(report.stats.clipped > 0);

    let sources: Vec<ObjectId> = pipeline.pending().iter().map(|p| p.source).collect();
    assert_eq!(sources, vec![crate_id, edge_id]);

    // Pending duplicates are not visible to scene queries yet.
    assert_eq!(scene.find_by_tag("StaticObject").len(), 2);

    let handles: Vec<ObjectId> = pipeline.pending().iter().map(|p| p.handle).collect();
    assert_eq!(pipeline.place(&mut scene, camera.position()), 2);

    for handle in handles {
        let entity = scene.get(handle).unwrap();
        assert!(entity.active);
        for p in world_points(entity) {
            let violated = frustum.violated_beyond(p, 1e-3 * (1.0 + p.magnitude()));
            assert!(violated.is_empty(), "{} vertex {p:?} outside {violated:?}", entity.name);
        }
    }

    // The fully visible crate keeps its mesh; the edge object was cut.
    let crate_copy = scene.get(ObjectId(4)).unwrap();
    assert_eq!(crate_copy.mesh.triangle_count(), 12);
    let edge_copy = scene.get(ObjectId(5)).unwrap();
    assert!(edge_copy.mesh.vertex_count() > 0);
    assert!(edge_copy.mesh.positions().iter().any(|p| p.x < 1.0));
}

#[test]
fn placing_after_moving_keeps_the_offset() {
    let mut scene = Scene::new();
    object(&mut scene, "crate", Vec3::new(0.5, 1.0, 0.0), "StaticObject");

    let camera = camera();
    let mut pipeline = ClipPipeline::default();
    pipeline.snapshot(&mut scene, &frustum(&camera), camera.position());
    let pending = pipeline.pending()[0];
    assert_eq!(pending.offset, Vec3::new(0.5, 0.0, 6.0));

    let moved = Vec3::new(10.0, 0.0, 3.0);
    pipeline.place(&mut scene, moved);
    let placed = scene.get(pending.handle).unwrap();
    assert_eq!(placed.transform.position(), Vec3::new(10.5, 0.0, 9.0));
}

#[test]
fn placed_duplicates_are_clipped_by_later_snapshots() {
    let mut scene = Scene::new();
    object(&mut scene, "crate", Vec3::new(0.0, 1.0, 0.0), "StaticObject");

    let camera = camera();
    let frustum = frustum(&camera);
    let mut pipeline = ClipPipeline::default();
    pipeline.snapshot(&mut scene, &frustum, camera.position());
    pipeline.place(&mut scene, camera.position());

    let report = pipeline.snapshot(&mut scene, &frustum, camera.position());
    assert_eq!(report.considered, 2);
    assert_eq!(report.clipped, 2);
    assert_eq!(pipeline.pending().len(), 2);
}

#[test]
fn custom_tags_limit_the_query() {
    let mut scene = Scene::new();
    object(&mut scene, "a", Vec3::new(0.0, 1.0, 0.0), "StaticObject");
    let b = object(&mut scene, "b", Vec3::new(0.0, 1.0, 0.0), "Photo");

    let camera = camera();
    let config = ClipConfig::default().with_tags(["Photo"]);
    let mut pipeline = ClipPipeline::new(&config);
    let report = pipeline.snapshot(&mut scene, &frustum(&camera), camera.position());

    assert_eq!(report.considered, 1);
    assert_eq!(pipeline.pending()[0].source, b);
}
