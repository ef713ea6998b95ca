//! Window lifecycle and the redraw loop.
//!
//! [`run`] opens the window, builds the demo scene and drives
//! [`SceneAnimator::on_frame`] once per redraw, handing the finished scene to a
//! [`ScreenRenderer`] that draws it and the options panel to the surface.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::animate::{DriftLimits, FrameInput, SceneAnimator, SceneRenderer};
use crate::camera::Camera;
use crate::config::AppConfig;
use crate::demo::{DemoContext, apply_option_change, initial_orbit, insert_model};
use crate::draw2d::Draw2d;
use crate::font::{FontAtlas, resolve_font_path};
use crate::gpu::GpuContext;
use crate::gui::OptionsPanel;
use crate::input::Input;
use crate::loader::{ModelLoader, ModelRequest};
use crate::orbit_camera::OrbitCamera;
use crate::render::ScenePass;
use crate::scene::Scene;

const FONT_SIZE: f32 = 14.0;

/// Opens the window and runs until it is closed.
pub fn run(config: AppConfig) -> anyhow::Result<()> {
    let event_loop = EventLoop::new().context("failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = SceneApp::Pending(config);
    event_loop.run_app(&mut app)?;

    match app {
        SceneApp::Failed(e) => Err(e),
        _ => Ok(()),
    }
}

enum SceneApp {
    Pending(AppConfig),
    Running(Box<Running>),
    Failed(anyhow::Error),
}

impl ApplicationHandler for SceneApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let SceneApp::Pending(config) = self else {
            return;
        };

        *self = match Running::new(event_loop, config) {
            Ok(running) => SceneApp::Running(Box::new(running)),
            Err(e) => {
                event_loop.exit();
                SceneApp::Failed(e.context("failed to start"))
            }
        };
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let SceneApp::Running(app) = self else {
            return;
        };

        app.input.handle_event(&event);

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => app.resize(size.width, size.height),
            WindowEvent::RedrawRequested => app.frame(),
            _ => {}
        }
    }
}

struct Running {
    window: Arc<Window>,
    gpu: GpuContext,
    pass: ScenePass,
    draw: Draw2d,
    ctx: DemoContext,
    orbit: OrbitCamera,
    animator: SceneAnimator,
    loader: ModelLoader,
    panel: OptionsPanel,
    input: Input,
    start_time: Instant,
}

impl Running {
    fn new(event_loop: &ActiveEventLoop, config: &AppConfig) -> anyhow::Result<Self> {
        let window_attrs = WindowAttributes::default()
            .with_title(&config.title)
            .with_inner_size(LogicalSize::new(config.width, config.height));
        let window = Arc::new(
            event_loop
                .create_window(window_attrs)
                .context("failed to create window")?,
        );

        let gpu = GpuContext::new(window.clone())?;
        log::info!("Window ready at {}x{}", gpu.width(), gpu.height());

        let draw = Draw2d::new(&gpu, load_font(&gpu, config.font_path.as_deref()));
        let pass = ScenePass::new(&gpu);

        let (ctx, tracked) = DemoContext::new(gpu.aspect());
        let limits = if config.limit_drift {
            DriftLimits::bounded()
        } else {
            DriftLimits::default()
        };
        if limits.is_active() {
            log::info!(
                "Drift limits on: vertices {:?}, markers {:?}",
                limits.vertex,
                limits.hover
            );
        }
        let animator = match config.seed {
            Some(seed) => SceneAnimator::seeded(tracked, seed),
            None => SceneAnimator::new(tracked),
        }
        .with_limits(limits);

        let loader = ModelLoader::spawn(ModelRequest::new(&config.model_path));

        let mut input = Input::new();
        input.set_viewport(gpu.width(), gpu.height());

        window.request_redraw();

        Ok(Self {
            window,
            gpu,
            pass,
            draw,
            ctx,
            orbit: initial_orbit(),
            animator,
            loader,
            panel: OptionsPanel::new(),
            input,
            start_time: Instant::now(),
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.gpu.resize(width, height);
        self.pass.resize(&self.gpu);
        self.ctx.camera.set_aspect(self.gpu.aspect());
        self.input.set_viewport(width, height);
        log::debug!("Resized to {width}x{height}");
    }

    fn frame(&mut self) {
        if let Some(result) = self.loader.poll() {
            match result {
                Ok(geometry) => {
                    let vertices = geometry.vertices.len();
                    insert_model(&mut self.ctx.scene, geometry);
                    log::info!("Model loaded ({vertices} vertices)");
                }
                Err(e) => log::error!("Failed to load model: {e}"),
            }
        }

        let tracked = self.animator.tracked();
        for change in self.panel.update(&self.input, &mut self.ctx.options) {
            apply_option_change(&mut self.ctx.scene, &tracked, change);
        }

        if !self.panel.wants_pointer(&self.input) {
            self.orbit.update(&self.input);
        }
        self.ctx.camera = self.orbit.camera(self.gpu.aspect());

        self.draw.clear();
        self.panel.draw(&mut self.draw, &self.ctx.options);

        let input = FrameInput {
            elapsed_ms: self.start_time.elapsed().as_secs_f64() * 1000.0,
            pointer: self.input.pointer_ndc(),
        };
        let mut renderer = ScreenRenderer {
            gpu: &self.gpu,
            pass: &mut self.pass,
            draw: &self.draw,
        };
        self.animator.on_frame(
            input,
            &mut self.ctx.scene,
            &self.ctx.camera,
            &self.ctx.options,
            &mut renderer,
        );

        self.input.begin_frame();
        self.window.request_redraw();
    }
}

fn load_font(gpu: &GpuContext, configured: Option<&Path>) -> Option<FontAtlas> {
    let Some(path) = resolve_font_path(configured) else {
        log::warn!("No font found, panel labels disabled");
        return None;
    };
    match FontAtlas::from_file(gpu, &path, FONT_SIZE) {
        Ok(font) => {
            log::info!("Using font {}", path.display());
            Some(font)
        }
        Err(e) => {
            log::warn!("{e}, panel labels disabled");
            None
        }
    }
}

/// Draws the scene and then the 2D overlay to the window surface.
pub struct ScreenRenderer<'a> {
    pub gpu: &'a GpuContext,
    pub pass: &'a mut ScenePass,
    pub draw: &'a Draw2d,
}

impl SceneRenderer for ScreenRenderer<'_> {
    fn render(&mut self, scene: &Scene, camera: &Camera) {
        let output = match self.gpu.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("Surface lost or outdated, reconfiguring");
                self.gpu.reconfigure();
                return;
            }
            Err(e) => {
                log::warn!("Skipping frame: {e}");
                return;
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        self.pass.draw(self.gpu, &mut encoder, &view, scene, camera);

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Overlay Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.draw.render(self.gpu, &mut render_pass);
        }

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }
}
