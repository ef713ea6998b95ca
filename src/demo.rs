//! Assembly of the demo scene and its option callbacks.

use glam::{EulerRot, Quat, Vec3};

use crate::animate::{MARKER_TAG, TrackedObjects};
use crate::camera::Camera;
use crate::color::Color;
use crate::geometry::RawGeometry;
use crate::mesh::Transform;
use crate::options::{AnimationOptions, OptionChange};
use crate::orbit_camera::OrbitCamera;
use crate::picking::Collider;
use crate::scene::{AmbientLight, Fog, Material, Model, Name, Scene, SpotLight};

/// Where the orbit camera starts.
pub const CAMERA_START: Vec3 = Vec3::new(-10.0, 30.0, 30.0);
/// Where a loaded model is placed.
pub const MODEL_POSITION: Vec3 = Vec3::new(-12.0, 0.0, 0.0);
/// Tag given to the loaded model.
pub const MODEL_TAG: &str = "model";
/// Stand-in for the galaxy texture.
pub const GALAXY_TINT: Color = Color::hex(0x6a4c93);

/// Everything the frame loop reads or writes, owned by the application.
pub struct DemoContext {
    pub scene: Scene,
    pub camera: Camera,
    pub options: AnimationOptions,
}

impl DemoContext {
    /// Builds the scene and returns it together with the animated objects.
    pub fn new(aspect: f32) -> (Self, TrackedObjects) {
        let mut scene = Scene::new();
        let tracked = build_scene(&mut scene);
        let camera = initial_orbit().camera(aspect);
        let ctx = Self {
            scene,
            camera,
            options: AnimationOptions::default(),
        };
        (ctx, tracked)
    }
}

/// Orbit controller for the demo camera, centered on the origin.
pub fn initial_orbit() -> OrbitCamera {
    OrbitCamera::from_position(CAMERA_START, Vec3::ZERO)
        .fov(45.0)
        .clip(0.1, 1000.0)
}

/// Populates `scene` with the demo objects, lights and fog.
pub fn build_scene(scene: &mut Scene) -> TrackedObjects {
    scene.background = Color::BLACK;
    scene.ambient = AmbientLight {
        color: Color::hex(0x333333),
    };
    scene.spot_light = SpotLight {
        position: Vec3::new(-30.0, 50.0, 0.0),
        target: Vec3::ZERO,
        color: Color::WHITE,
        intensity: 0.7,
        angle: 0.5,
        penumbra: 0.0,
    };
    scene.fog = Some(Fog {
        color: Color::WHITE,
        density: 0.005,
    });

    let world = &mut scene.world;

    for (axis, color) in [(Vec3::X, Color::RED), (Vec3::Y, Color::GREEN), (Vec3::Z, Color::BLUE)] {
        world.spawn((
            Transform::new(),
            Material::flat(color),
            Model::new(RawGeometry::segment(Vec3::ZERO, axis * 5.0)),
        ));
    }

    let cube = world.spawn((
        Transform::new().rotation(Quat::from_euler(EulerRot::XYZ, 0.5, 0.5, 0.0)),
        Material::flat(Color::hex(0x00ff00)),
        Model::new(RawGeometry::cuboid(1.0, 1.0, 1.0)),
        Collider::box_collider(Vec3::ONE),
    ));

    world.spawn((
        Transform::new().rotation(Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2)),
        Material::lit(Color::WHITE),
        Model::new(RawGeometry::plane(30.0, 30.0, 1, 1)),
        Collider::Mesh,
    ));

    world.spawn((
        Transform::new(),
        Material::flat(Color::hex(0x888888)),
        Model::new(RawGeometry::grid(30.0, 10)),
    ));

    let sphere = world.spawn((
        Transform::from_position(Vec3::new(0.0, 4.0, 0.0)),
        Material::lit(Color::hex(0x0000ff)),
        Model::new(RawGeometry::sphere(4.0, 50, 50)),
        Collider::sphere(4.0),
    ));

    world.spawn((
        Transform::from_position(Vec3::new(0.0, 2.0, 10.0)),
        Material::lit(GALAXY_TINT),
        Model::new(RawGeometry::cuboid(4.0, 4.0, 4.0)),
        Collider::box_collider(Vec3::splat(4.0)),
        Name::new(MARKER_TAG),
    ));

    let jitter_plane = world.spawn((
        Transform::from_position(Vec3::new(10.0, 10.0, 15.0)),
        Material::lit(Color::WHITE).wireframe(true),
        Model::new(RawGeometry::plane(10.0, 10.0, 10, 10)),
        Collider::Mesh,
    ));

    world.spawn((
        Transform::from_position(Vec3::new(-5.0, 10.0, 10.0)),
        Material::flat(Color::hex(0xff0000)).without_fog(),
        Model::new(RawGeometry::sphere(4.0, 32, 16)),
        Collider::sphere(4.0),
    ));

    TrackedObjects {
        sphere: Some(sphere),
        cube: Some(cube),
        jitter_plane: Some(jitter_plane),
    }
}

/// Pushes a panel edit into the scene. Missing objects are ignored.
pub fn apply_option_change(scene: &mut Scene, tracked: &TrackedObjects, change: OptionChange) {
    let Some(mut material) = tracked
        .sphere
        .and_then(|e| scene.world.get::<&mut Material>(e).ok())
    else {
        return;
    };
    match change {
        OptionChange::SphereColor(color) => material.color = color,
        OptionChange::SphereWireframe(wireframe) => material.wireframe = wireframe,
    }
}

/// Adds a loaded model to the scene.
pub fn insert_model(scene: &mut Scene, geometry: RawGeometry) -> hecs::Entity {
    scene.world.spawn((
        Transform::from_position(MODEL_POSITION),
        Material::lit(Color::WHITE),
        Model::new(geometry),
        Collider::Mesh,
        Name::new(MODEL_TAG),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animate::{FrameInput, HIGHLIGHT, SceneAnimator};
    use glam::Vec2;

    #[test]
    fn scene_has_every_object() {
        let mut scene = Scene::new();
        let tracked = build_scene(&mut scene);
        assert_eq!(scene.world.len(), 10);
        assert!(tracked.sphere.is_some() && tracked.cube.is_some() && tracked.jitter_plane.is_some());

        let marker = scene.find_named(MARKER_TAG).unwrap();
        let t = scene.world.get::<&Transform>(marker).unwrap();
        assert_eq!(t.position, Vec3::new(0.0, 2.0, 10.0));
        let m = scene.world.get::<&Material>(marker).unwrap();
        assert_eq!(m.color, GALAXY_TINT);

        let plane = scene.world.get::<&Material>(tracked.jitter_plane.unwrap()).unwrap();
        assert!(plane.wireframe);
        assert_eq!(scene.spot_light.intensity, 0.7);
    }

    #[test]
    fn option_changes_reach_the_sphere() {
        let mut scene = Scene::new();
        let tracked = build_scene(&mut scene);

        apply_option_change(&mut scene, &tracked, OptionChange::SphereColor(Color::GREEN));
        apply_option_change(&mut scene, &tracked, OptionChange::SphereWireframe(true));

        let material = scene.world.get::<&Material>(tracked.sphere.unwrap()).unwrap();
        assert_eq!(material.color, Color::GREEN);
        assert!(material.wireframe);
    }

    #[test]
    fn option_change_without_sphere_is_ignored() {
        let mut scene = Scene::new();
        apply_option_change(
            &mut scene,
            &TrackedObjects::default(),
            OptionChange::SphereWireframe(true),
        );
        assert!(scene.world.is_empty());
    }

    #[test]
    fn inserted_model_is_pickable() {
        let mut scene = Scene::new();
        let model = insert_model(&mut scene, RawGeometry::cuboid(4.0, 4.0, 4.0));
        let camera = Camera::new()
            .at(MODEL_POSITION + Vec3::new(0.0, 0.0, 20.0))
            .looking_at(MODEL_POSITION);
        let ray = crate::picking::Ray::from_ndc(Vec2::ZERO, &camera);
        let hits = crate::picking::raycast_all(&scene.world, &ray);
        assert_eq!(hits.first().map(|h| h.entity), Some(model));
        assert!((hits[0].distance - 18.0).abs() < 1e-4);
    }

    #[test]
    fn starting_view_runs_a_frame() {
        let (mut ctx, tracked) = DemoContext::new(16.0 / 9.0);
        let mut animator = SceneAnimator::seeded(tracked, 5);
        let mut frames = 0;
        animator.on_frame(
            FrameInput::default(),
            &mut ctx.scene,
            &ctx.camera,
            &ctx.options,
            &mut |_: &Scene, _: &Camera| frames += 1,
        );
        assert_eq!(frames, 1);
        // The pointer starts at the view centre, whose ray grazes the sphere.
        let sphere = ctx.scene.world.get::<&Material>(tracked.sphere.unwrap()).unwrap();
        assert_eq!(sphere.color, HIGHLIGHT);
    }
}
