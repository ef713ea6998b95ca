//! # sceneplay
//!
//! An interactive lit 3D scene: a bouncing sphere, a spinning cube, a
//! jittering wireframe plane and a handful of helpers under a spot light and
//! exponential fog. The pointer is turned into a ray every frame. Hitting the
//! sphere turns it red and hovering the galaxy box pushes it away.
//!
//! The per-frame logic lives in [`SceneAnimator::on_frame`] and runs against a
//! plain [`Scene`] without a window, so it can be driven from tests:
//!
//! ```
//! use sceneplay::{AnimationOptions, Camera, FrameInput, Scene, SceneAnimator, Vec3};
//!
//! let mut scene = Scene::new();
//! let tracked = sceneplay::demo::build_scene(&mut scene);
//! let camera = Camera::new().at(Vec3::new(-10.0, 30.0, 30.0)).looking_at(Vec3::ZERO);
//! let mut animator = SceneAnimator::seeded(tracked, 1);
//!
//! let mut frames = 0;
//! animator.on_frame(
//!     FrameInput::default(),
//!     &mut scene,
//!     &camera,
//!     &AnimationOptions::default(),
//!     &mut |_: &Scene, _: &Camera| frames += 1,
//! );
//! assert_eq!(frames, 1);
//! ```
//!
//! The binary wires this to a winit window and a wgpu renderer; see [`run`].

pub mod animate;
pub mod app;
pub mod camera;
pub mod color;
pub mod config;
pub mod demo;
pub mod draw2d;
pub mod font;
pub mod geometry;
pub mod gpu;
pub mod gui;
pub mod input;
pub mod loader;
pub mod logging;
pub mod mesh;
pub mod options;
pub mod orbit_camera;
pub mod picking;
pub mod render;
pub mod scene;

pub use animate::{DriftLimits, FrameInput, SceneAnimator, SceneRenderer, TrackedObjects};
pub use app::{ScreenRenderer, run};
pub use camera::Camera;
pub use color::Color;
pub use config::{AppConfig, Args};
pub use draw2d::Draw2d;
pub use geometry::{GeometryError, GeometryPipeline, RawGeometry, Topology};
pub use gpu::{GpuContext, GpuError};
pub use gui::OptionsPanel;
pub use input::Input;
pub use loader::{ModelLoader, ModelRequest};
pub use mesh::{Transform, Vertex3d};
pub use options::{AnimationOptions, OptionChange};
pub use orbit_camera::OrbitCamera;
pub use picking::{Collider, Ray, RayHit, raycast_all};
pub use render::ScenePass;
pub use scene::{AmbientLight, Fog, Material, Model, Name, Scene, Shading, SpotLight};

// Re-export glam math types for convenience
pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};

// Re-export commonly used winit types for convenience
pub use winit::event::MouseButton;
pub use winit::keyboard::KeyCode;

pub use hecs::{Entity, World};
