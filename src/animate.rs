//! The per-frame scene update.
//!
//! [`SceneAnimator::on_frame`] runs once per display refresh. In order, it
//!
//! 1. copies the spot light options onto the scene light,
//! 2. advances the bounce phase and places the tracked sphere,
//! 3. sets the tracked cube's rotation from elapsed time,
//! 4. jitters every vertex of the tracked wireframe plane,
//! 5. casts a ray from the camera through the pointer,
//! 6. highlights the sphere and nudges tagged markers that the ray hits,
//! 7. hands the scene to the renderer.
//!
//! Picking sees the positions written earlier in the same frame. Tracked
//! objects that do not exist (yet, or anymore) are skipped silently.

use std::collections::HashMap;

use glam::{EulerRot, Quat, Vec2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::camera::Camera;
use crate::color::Color;
use crate::mesh::Transform;
use crate::options::AnimationOptions;
use crate::picking::{Ray, raycast_all};
use crate::scene::{Material, Model, Name, Scene};

/// Peak height of the bounce above its base.
pub const BOUNCE_AMPLITUDE: f32 = 20.0;
/// Lowest height of the bounce.
pub const BOUNCE_OFFSET: f32 = 4.0;
/// Largest per-frame change of a jittered coordinate.
pub const JITTER: f32 = 0.25;
/// Distance a hovered marker moves along +z per frame.
pub const HOVER_STEP: f32 = 0.1;
/// Colour the sphere takes when the pointer hits it.
pub const HIGHLIGHT: Color = Color::hex(0xff0000);
/// Tag of objects that creep away while hovered.
pub const MARKER_TAG: &str = "galaxyBox";

/// Receives the scene once it is fully updated for the frame.
pub trait SceneRenderer {
    fn render(&mut self, scene: &Scene, camera: &Camera);
}

impl<F: FnMut(&Scene, &Camera)> SceneRenderer for F {
    fn render(&mut self, scene: &Scene, camera: &Camera) {
        self(scene, camera)
    }
}

/// Entities the frame loop animates by identity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TrackedObjects {
    pub sphere: Option<hecs::Entity>,
    pub cube: Option<hecs::Entity>,
    pub jitter_plane: Option<hecs::Entity>,
}

/// Optional bounds on the two effects that otherwise drift forever.
///
/// `vertex` caps how far a jittered coordinate may wander from where it was
/// before the first jitter. `hover` caps how far a marker may travel from
/// where it was first hovered. `None` keeps the unbounded behavior.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DriftLimits {
    pub vertex: Option<f32>,
    pub hover: Option<f32>,
}

impl DriftLimits {
    /// Limits used by `--limit-drift`.
    pub fn bounded() -> Self {
        Self {
            vertex: Some(2.0),
            hover: Some(10.0),
        }
    }

    pub fn is_active(&self) -> bool {
        self.vertex.is_some() || self.hover.is_some()
    }
}

/// Per-frame inputs supplied by the host.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameInput {
    /// Milliseconds since the loop started.
    pub elapsed_ms: f64,
    /// Pointer in normalized device coordinates.
    pub pointer: Vec2,
}

/// Owns the state the frame loop carries between frames.
pub struct SceneAnimator {
    tracked: TrackedObjects,
    phase: f64,
    rng: StdRng,
    limits: DriftLimits,
    rest_positions: Option<Vec<[f32; 3]>>,
    hover_origins: HashMap<hecs::Entity, f32>,
}

impl SceneAnimator {
    /// Animator with an entropy-seeded jitter generator.
    pub fn new(tracked: TrackedObjects) -> Self {
        Self::with_rng(tracked, StdRng::from_os_rng())
    }

    /// Animator whose jitter sequence is reproducible from `seed`.
    pub fn seeded(tracked: TrackedObjects, seed: u64) -> Self {
        Self::with_rng(tracked, StdRng::seed_from_u64(seed))
    }

    fn with_rng(tracked: TrackedObjects, rng: StdRng) -> Self {
        Self {
            tracked,
            phase: 0.0,
            rng,
            limits: DriftLimits::default(),
            rest_positions: None,
            hover_origins: HashMap::new(),
        }
    }

    pub fn with_limits(mut self, limits: DriftLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Accumulated bounce phase, in double precision so every frame still
    /// adds the full speed after millions of frames.
    pub fn phase(&self) -> f64 {
        self.phase
    }

    pub fn tracked(&self) -> TrackedObjects {
        self.tracked
    }

    /// Runs one frame of animation and picking, then renders.
    pub fn on_frame<R: SceneRenderer + ?Sized>(
        &mut self,
        input: FrameInput,
        scene: &mut Scene,
        camera: &Camera,
        options: &AnimationOptions,
        renderer: &mut R,
    ) {
        scene.spot_light.angle = options.spot_angle;
        scene.spot_light.penumbra = options.spot_penumbra;
        scene.spot_light.intensity = options.spot_intensity;

        self.phase += f64::from(options.sphere_speed);
        if let Some(mut transform) = self
            .tracked
            .sphere
            .and_then(|e| scene.world.get::<&mut Transform>(e).ok())
        {
            transform.position.x = options.sphere_x;
            transform.position.z = options.sphere_z;
            transform.position.y = BOUNCE_AMPLITUDE * self.phase.sin().abs() as f32 + BOUNCE_OFFSET;
        }

        if let Some(mut transform) = self
            .tracked
            .cube
            .and_then(|e| scene.world.get::<&mut Transform>(e).ok())
        {
            let angle = (input.elapsed_ms / 1000.0) as f32;
            transform.rotation = Quat::from_euler(EulerRot::XYZ, angle, angle, 0.0);
        }

        self.jitter_plane(&mut scene.world);

        let ray = Ray::from_ndc(input.pointer, camera);
        for hit in raycast_all(&scene.world, &ray) {
            if Some(hit.entity) == self.tracked.sphere {
                if let Ok(mut material) = scene.world.get::<&mut Material>(hit.entity) {
                    material.color = HIGHLIGHT;
                }
            }

            let is_marker = scene
                .world
                .get::<&Name>(hit.entity)
                .is_ok_and(|name| name.is(MARKER_TAG));
            if is_marker {
                if let Ok(mut transform) = scene.world.get::<&mut Transform>(hit.entity) {
                    let moved = transform.position.z + HOVER_STEP;
                    transform.position.z = match self.limits.hover {
                        Some(limit) => {
                            let origin = *self
                                .hover_origins
                                .entry(hit.entity)
                                .or_insert(transform.position.z);
                            moved.min(origin + limit)
                        }
                        None => moved,
                    };
                }
            }
        }

        renderer.render(scene, camera);
    }

    fn jitter_plane(&mut self, world: &mut hecs::World) {
        let Some(mut model) = self
            .tracked
            .jitter_plane
            .and_then(|e| world.get::<&mut Model>(e).ok())
        else {
            return;
        };
        let geometry = model.edit();

        let limit = self.limits.vertex;
        if limit.is_some() && self.rest_positions.is_none() {
            self.rest_positions = Some(geometry.vertices.iter().map(|v| v.position).collect());
        }
        let rest = self.rest_positions.as_deref();

        for (i, vertex) in geometry.vertices.iter_mut().enumerate() {
            for axis in 0..3 {
                let mut c =
                    vertex.position[axis] + self.rng.random::<f32>() * 2.0 * JITTER - JITTER;
                if let (Some(limit), Some(anchor)) = (limit, rest.and_then(|r| r.get(i))) {
                    c = c.clamp(anchor[axis] - limit, anchor[axis] + limit);
                }
                vertex.position[axis] = c;
            }
        }
    }
}
