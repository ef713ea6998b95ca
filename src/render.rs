//! The 3D scene pass.
//!
//! Every entity with a [`Transform`], [`Model`] and [`Material`] is drawn each
//! frame. Solid triangles and line segments use two pipelines over the same
//! bind groups: scene-wide lighting in group 0 and per-object uniforms in
//! group 1, addressed by dynamic offset so one buffer serves the whole frame.
//!
//! GPU meshes are cached per entity and refreshed when the model revision
//! changes.

use std::collections::HashMap;

use glam::Mat4;

use crate::camera::Camera;
use crate::geometry::Topology;
use crate::gpu::GpuContext;
use crate::mesh::{GpuMesh, Transform, Vertex3d};
use crate::scene::{Material, Model, Scene, Shading};

/// Objects drawn per frame. Extra objects are skipped with a warning.
pub const MAX_OBJECTS: usize = 256;
/// Dynamic uniform offsets must be multiples of this.
const OBJECT_STRIDE: u64 = 256;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Scene-wide uniforms (group 0).
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub camera_pos: [f32; 4],
    pub ambient: [f32; 4],
    pub spot_position: [f32; 4],
    pub spot_direction: [f32; 4],
    /// Light colour premultiplied by intensity.
    pub spot_color: [f32; 4],
    /// x: cos(outer angle), y: cos(inner angle).
    pub spot_cone: [f32; 4],
    /// rgb: fog colour, a: exp² density (0 disables fog).
    pub fog: [f32; 4],
}

impl SceneUniforms {
    pub fn new(scene: &Scene, camera: &Camera) -> Self {
        let light = &scene.spot_light;
        let (outer, inner) = light.cone_cosines();
        let fog = scene
            .fog
            .map(|f| [f.color.r, f.color.g, f.color.b, f.density])
            .unwrap_or([0.0; 4]);

        Self {
            view_proj: camera.view_projection().to_cols_array_2d(),
            camera_pos: camera.position.extend(1.0).to_array(),
            ambient: scene.ambient.color.to_array(),
            spot_position: light.position.extend(1.0).to_array(),
            spot_direction: light.direction().extend(0.0).to_array(),
            spot_color: light.color.scaled(light.intensity).to_array(),
            spot_cone: [outer, inner, 0.0, 0.0],
            fog,
        }
    }
}

/// Per-object uniforms (group 1, dynamic offset).
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUniforms {
    pub model: [[f32; 4]; 4],
    pub normal_matrix: [[f32; 4]; 4],
    pub color: [f32; 4],
    /// x: lit (1) or flat (0), y: fogged (1) or not (0).
    pub params: [f32; 4],
}

impl ObjectUniforms {
    pub fn new(transform: &Transform, material: &Material) -> Self {
        let model = transform.matrix();
        let normal_matrix = model.inverse().transpose();
        let normal_matrix = if normal_matrix.is_finite() {
            normal_matrix
        } else {
            Mat4::IDENTITY
        };
        Self {
            model: model.to_cols_array_2d(),
            normal_matrix: normal_matrix.to_cols_array_2d(),
            color: material.color.to_array(),
            params: [
                if material.shading == Shading::Lit { 1.0 } else { 0.0 },
                if material.fog { 1.0 } else { 0.0 },
                0.0,
                0.0,
            ],
        }
    }
}

/// How an entity's mesh is submitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawKind {
    /// Filled triangles.
    Solid,
    /// Triangle edges as lines.
    Wireframe,
    /// Line-list geometry.
    Lines,
}

impl DrawKind {
    pub fn of(topology: Topology, material: &Material) -> Self {
        match (topology, material.wireframe) {
            (Topology::Lines, _) => Self::Lines,
            (Topology::Triangles, true) => Self::Wireframe,
            (Topology::Triangles, false) => Self::Solid,
        }
    }
}

/// One object to draw this frame.
#[derive(Clone, Copy, Debug)]
pub struct DrawItem {
    pub entity: hecs::Entity,
    pub kind: DrawKind,
    pub uniforms: ObjectUniforms,
}

/// Lists the drawable entities in world iteration order, capped at [`MAX_OBJECTS`].
pub fn collect_draws(world: &hecs::World) -> Vec<DrawItem> {
    let mut items: Vec<DrawItem> = world
        .query::<(&Transform, &Model, &Material)>()
        .iter()
        .map(|(entity, (transform, model, material))| DrawItem {
            entity,
            kind: DrawKind::of(model.geometry().topology, material),
            uniforms: ObjectUniforms::new(transform, material),
        })
        .collect();

    if items.len() > MAX_OBJECTS {
        log::warn!(
            "{} drawable objects, only the first {MAX_OBJECTS} are rendered",
            items.len()
        );
        items.truncate(MAX_OBJECTS);
    }
    items
}

/// Draws the 3D scene into a colour target with its own depth buffer.
pub struct ScenePass {
    triangle_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,
    scene_buffer: wgpu::Buffer,
    scene_bind_group: wgpu::BindGroup,
    object_buffer: wgpu::Buffer,
    object_bind_group: wgpu::BindGroup,
    depth_view: wgpu::TextureView,
    depth_size: (u32, u32),
    meshes: HashMap<hecs::Entity, GpuMesh>,
}

impl ScenePass {
    pub fn new(gpu: &GpuContext) -> Self {
        let device = &gpu.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Scene Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/scene.wgsl").into()),
        });

        let scene_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Scene Uniforms"),
            size: std::mem::size_of::<SceneUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let scene_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Scene Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let scene_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Scene Bind Group"),
            layout: &scene_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: scene_buffer.as_entire_binding(),
            }],
        });

        let object_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Object Uniforms"),
            size: OBJECT_STRIDE * MAX_OBJECTS as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let object_size = wgpu::BufferSize::new(std::mem::size_of::<ObjectUniforms>() as u64);

        let object_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Object Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: true,
                        min_binding_size: object_size,
                    },
                    count: None,
                }],
            });

        let object_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Object Bind Group"),
            layout: &object_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &object_buffer,
                    offset: 0,
                    size: object_size,
                }),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[&scene_bind_group_layout, &object_bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = |label: &str, topology: wgpu::PrimitiveTopology| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs"),
                    buffers: &[Vertex3d::LAYOUT],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: gpu.config.format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology,
                    // Planes are seen from both sides
                    cull_mode: None,
                    front_face: wgpu::FrontFace::Ccw,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        };

        let triangle_pipeline = pipeline("Scene Triangle Pipeline", wgpu::PrimitiveTopology::TriangleList);
        let line_pipeline = pipeline("Scene Line Pipeline", wgpu::PrimitiveTopology::LineList);

        Self {
            triangle_pipeline,
            line_pipeline,
            scene_buffer,
            scene_bind_group,
            object_buffer,
            object_bind_group,
            depth_view: Self::create_depth_view(gpu),
            depth_size: (gpu.width(), gpu.height()),
            meshes: HashMap::new(),
        }
    }

    fn create_depth_view(gpu: &GpuContext) -> wgpu::TextureView {
        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Texture"),
            size: wgpu::Extent3d {
                width: gpu.width(),
                height: gpu.height(),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    /// Recreates the depth buffer if the surface size changed.
    pub fn resize(&mut self, gpu: &GpuContext) {
        if self.depth_size != (gpu.width(), gpu.height()) {
            self.depth_view = Self::create_depth_view(gpu);
            self.depth_size = (gpu.width(), gpu.height());
        }
    }

    /// Uploads changed geometry and drops meshes of despawned entities.
    fn sync_meshes(&mut self, gpu: &GpuContext, world: &hecs::World) {
        self.meshes.retain(|entity, _| world.contains(*entity));

        for (entity, model) in world.query::<&Model>().iter() {
            match self.meshes.get_mut(&entity) {
                Some(mesh) => mesh.sync(&gpu.device, &gpu.queue, model.geometry(), model.revision()),
                None => {
                    let mesh = GpuMesh::new(&gpu.device, model.geometry(), model.revision());
                    self.meshes.insert(entity, mesh);
                }
            }
        }
    }

    /// Records the scene into `target`, clearing it to the scene background.
    pub fn draw(
        &mut self,
        gpu: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        scene: &Scene,
        camera: &Camera,
    ) {
        self.resize(gpu);
        self.sync_meshes(gpu, &scene.world);

        let globals = SceneUniforms::new(scene, camera);
        gpu.queue
            .write_buffer(&self.scene_buffer, 0, bytemuck::cast_slice(&[globals]));

        let items = collect_draws(&scene.world);
        for (i, item) in items.iter().enumerate() {
            gpu.queue.write_buffer(
                &self.object_buffer,
                i as u64 * OBJECT_STRIDE,
                bytemuck::cast_slice(&[item.uniforms]),
            );
        }

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(scene.background.to_wgpu()),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        render_pass.set_bind_group(0, &self.scene_bind_group, &[]);

        for (i, item) in items.iter().enumerate() {
            let Some(mesh) = self.meshes.get(&item.entity) else {
                continue;
            };
            let (pipeline, index_buffer, count) = match item.kind {
                DrawKind::Solid => (&self.triangle_pipeline, &mesh.index_buffer, mesh.index_count),
                DrawKind::Lines => (&self.line_pipeline, &mesh.index_buffer, mesh.index_count),
                DrawKind::Wireframe => match &mesh.edge_buffer {
                    Some(edges) => (&self.line_pipeline, edges, mesh.edge_count),
                    None => continue,
                },
            };
            if count == 0 {
                continue;
            }

            render_pass.set_pipeline(pipeline);
            render_pass.set_bind_group(1, &self.object_bind_group, &[(i as u64 * OBJECT_STRIDE) as u32]);
            render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            render_pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..count, 0, 0..1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::geometry::RawGeometry;
    use crate::scene::{Fog, SpotLight};
    use glam::Vec3;

    #[test]
    fn uniform_sizes_fit_the_layout() {
        assert_eq!(std::mem::size_of::<SceneUniforms>(), 176);
        assert_eq!(std::mem::size_of::<ObjectUniforms>(), 160);
        assert!(std::mem::size_of::<ObjectUniforms>() as u64 <= OBJECT_STRIDE);
    }

    #[test]
    fn scene_uniforms_carry_light_and_fog() {
        let mut scene = Scene::new();
        scene.spot_light = SpotLight {
            position: Vec3::new(0.0, 10.0, 0.0),
            target: Vec3::ZERO,
            color: Color::WHITE,
            intensity: 0.5,
            angle: 0.4,
            penumbra: 0.1,
        };
        scene.fog = Some(Fog {
            color: Color::WHITE,
            density: 0.005,
        });

        let u = SceneUniforms::new(&scene, &Camera::new());
        assert_eq!(u.spot_direction, [0.0, -1.0, 0.0, 0.0]);
        assert_eq!(u.spot_color, [0.5, 0.5, 0.5, 1.0]);
        assert!(u.spot_cone[1] > u.spot_cone[0]);
        assert_eq!(u.fog, [1.0, 1.0, 1.0, 0.005]);

        scene.fog = None;
        assert_eq!(SceneUniforms::new(&scene, &Camera::new()).fog[3], 0.0);
    }

    #[test]
    fn flat_unfogged_material_flags() {
        let material = Material::flat(Color::RED).without_fog();
        let u = ObjectUniforms::new(&Transform::new(), &material);
        assert_eq!(u.params, [0.0, 0.0, 0.0, 0.0]);
        assert_eq!(u.color, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(u.normal_matrix, Mat4::IDENTITY.to_cols_array_2d());
    }

    #[test]
    fn degenerate_scale_falls_back_to_identity_normals() {
        let t = Transform::new().scale(Vec3::new(1.0, 0.0, 1.0));
        let u = ObjectUniforms::new(&t, &Material::default());
        assert_eq!(u.normal_matrix, Mat4::IDENTITY.to_cols_array_2d());
    }

    #[test]
    fn draw_kind_follows_topology_and_wireframe() {
        let mut world = hecs::World::new();
        let solid = world.spawn((
            Transform::new(),
            Model::new(RawGeometry::cuboid(1.0, 1.0, 1.0)),
            Material::default(),
        ));
        let wire = world.spawn((
            Transform::new(),
            Model::new(RawGeometry::plane(1.0, 1.0, 2, 2)),
            Material::default().wireframe(true),
        ));
        let lines = world.spawn((
            Transform::new(),
            Model::new(RawGeometry::grid(10.0, 4)),
            Material::default().wireframe(true),
        ));
        world.spawn((Transform::new(), Material::default()));

        let items = collect_draws(&world);
        assert_eq!(items.len(), 3);
        let kind = |e| items.iter().find(|i| i.entity == e).map(|i| i.kind);
        assert_eq!(kind(solid), Some(DrawKind::Solid));
        assert_eq!(kind(wire), Some(DrawKind::Wireframe));
        assert_eq!(kind(lines), Some(DrawKind::Lines));
    }
}
