use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::device::{DEPTH_FORMAT, FrameResources};
use crate::error::ExportError;
use crate::object::{IconObject, LightingProfile};
use crate::render::state::AmbientScope;
use crate::render::{RenderCtx, camera};

/// The multi-axis rig: two fixed directional lights, matching classic
/// item-3D GUI lighting. Normalized at uniform build time.
const LIGHT_0: Vec3 = Vec3::new(0.2, 1.0, -0.7);
const LIGHT_1: Vec3 = Vec3::new(-0.2, 1.0, 0.7);

/// Ambient floor under the shaded profile.
const AMBIENT: f32 = 0.4;

/// Per-object uniform block. Layout mirrors `shaders/icon.wgsl`.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct IconUniform {
    object_matrix: [[f32; 4]; 4],
    light0: [f32; 4],
    light1: [f32; 4],
    params: [f32; 4], // x: ambient floor, y: mode (0 flat / 1 shaded)
}

/// Single-object rasterizer.
///
/// Owns the pipeline and growable mesh buffers; draws exactly one object per
/// call into the bound target and submits before returning. Runs only on the
/// render thread and never suspends; a draw failure is caught locally and
/// converted into a per-object outcome by the caller.
#[derive(Default)]
pub struct Rasterizer {
    pipeline_format: Option<wgpu::TextureFormat>,
    pipeline: Option<wgpu::RenderPipeline>,

    bind_group_layout: Option<wgpu::BindGroupLayout>,
    bind_group: Option<wgpu::BindGroup>,
    uniform_ubo: Option<wgpu::Buffer>,

    vbo: Option<wgpu::Buffer>,
    vbo_capacity: usize,
    ibo: Option<wgpu::Buffer>,
    ibo_capacity: usize,
}

impl Rasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Renders `object` into the target bound by `scope`.
    ///
    /// Clears color to fully transparent and depth to far, installs the
    /// object's lighting profile, draws, and submits. Pipeline state flows
    /// through `scope`, so restoration is guaranteed by its drop. Any wgpu
    /// validation error raised while recording becomes
    /// [`ExportError::Render`] for this object alone.
    pub fn render_one(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &FrameResources,
        scope: &mut AmbientScope<'_>,
        object: &IconObject,
    ) -> Result<(), ExportError> {
        let (Some(color_view), Some(depth_view)) = (target.color_view(), target.depth_view())
        else {
            return Err(ExportError::Render {
                object: object.id.clone(),
                reason: "render target already released".to_string(),
            });
        };

        scope.set_lighting(object.lighting);

        self.ensure_pipeline(ctx);
        self.ensure_bindings(ctx);
        self.ensure_mesh_capacity(ctx, object.mesh.vertices.len(), object.mesh.indices.len());

        let error_scope = ctx.device.push_error_scope(wgpu::ErrorFilter::Validation);

        self.write_uniform(ctx, scope);
        let index_count = self.write_mesh(ctx, object);

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("iconforge object encoder"),
            });

        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("iconforge object pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            if let (Some(pipeline), Some(bind_group), Some(vbo), Some(ibo)) = (
                self.pipeline.as_ref(),
                self.bind_group.as_ref(),
                self.vbo.as_ref(),
                self.ibo.as_ref(),
            ) {
                rpass.set_pipeline(pipeline);
                rpass.set_bind_group(0, bind_group, &[]);
                rpass.set_vertex_buffer(0, vbo.slice(..));
                rpass.set_index_buffer(ibo.slice(..), wgpu::IndexFormat::Uint16);
                rpass.draw_indexed(0..index_count, 0, 0..1);
            }
        }

        ctx.queue.submit(std::iter::once(encoder.finish()));

        if let Some(e) = pollster::block_on(error_scope.pop()) {
            return Err(ExportError::Render {
                object: object.id.clone(),
                reason: e.to_string(),
            });
        }

        Ok(())
    }

    fn write_uniform(&mut self, ctx: &RenderCtx<'_>, scope: &AmbientScope<'_>) {
        let Some(ubo) = self.uniform_ubo.as_ref() else {
            return;
        };
        let mode = match scope.lighting() {
            LightingProfile::Flat => 0.0,
            LightingProfile::Shaded => 1.0,
        };
        let u = IconUniform {
            object_matrix: camera::object_matrix(scope.projection(), ctx.edge).to_cols_array_2d(),
            light0: LIGHT_0.normalize().extend(0.0).to_array(),
            light1: LIGHT_1.normalize().extend(0.0).to_array(),
            params: [AMBIENT, mode, 0.0, 0.0],
        };
        ctx.queue.write_buffer(ubo, 0, bytemuck::bytes_of(&u));
    }

    /// Uploads the mesh and returns the index count to draw.
    fn write_mesh(&mut self, ctx: &RenderCtx<'_>, object: &IconObject) -> u32 {
        let (Some(vbo), Some(ibo)) = (self.vbo.as_ref(), self.ibo.as_ref()) else {
            return 0;
        };
        ctx.queue
            .write_buffer(vbo, 0, bytemuck::cast_slice(&object.mesh.vertices));

        // Buffer writes must be 4-byte sized; pad odd u16 index counts.
        let indices = &object.mesh.indices;
        if indices.len() % 2 == 0 {
            ctx.queue.write_buffer(ibo, 0, bytemuck::cast_slice(indices));
        } else {
            let mut padded = Vec::with_capacity(indices.len() + 1);
            padded.extend_from_slice(indices);
            padded.push(0);
            ctx.queue.write_buffer(ibo, 0, bytemuck::cast_slice(&padded));
        }
        indices.len() as u32
    }

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipeline_format == Some(ctx.target_format) && self.pipeline.is_some() {
            return;
        }

        let shader_src = include_str!("shaders/icon.wgsl");
        let shader = ctx
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("iconforge icon shader"),
                source: wgpu::ShaderSource::Wgsl(shader_src.into()),
            });

        let bind_group_layout =
            ctx.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("iconforge icon bgl"),
                    entries: &[wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: Some(uniform_min_binding_size()),
                        },
                        count: None,
                    }],
                });

        let pipeline_layout = ctx
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("iconforge icon pipeline layout"),
                bind_group_layouts: &[&bind_group_layout],
                immediate_size: 0,
            });

        let pipeline = ctx
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("iconforge icon pipeline"),
                layout: Some(&pipeline_layout),

                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &[crate::render::mesh::IconVertex::layout()],
                },

                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: ctx.target_format,
                        blend: Some(premul_alpha_blend()),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),

                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },

                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::LessEqual,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),

                multiview_mask: None,
                cache: None,
            });

        self.pipeline_format = Some(ctx.target_format);
        self.pipeline = Some(pipeline);
        self.bind_group_layout = Some(bind_group_layout);

        self.bind_group = None;
        self.uniform_ubo = None;
    }

    fn ensure_bindings(&mut self, ctx: &RenderCtx<'_>) {
        if self.bind_group.is_some() && self.uniform_ubo.is_some() {
            return;
        }
        let Some(bgl) = self.bind_group_layout.as_ref() else {
            return;
        };

        let uniform_ubo = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("iconforge icon ubo"),
            size: std::mem::size_of::<IconUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("iconforge icon bind group"),
            layout: bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_ubo.as_entire_binding(),
            }],
        });

        self.uniform_ubo = Some(uniform_ubo);
        self.bind_group = Some(bind_group);
    }

    fn ensure_mesh_capacity(&mut self, ctx: &RenderCtx<'_>, vertices: usize, indices: usize) {
        if vertices > self.vbo_capacity || self.vbo.is_none() {
            let new_cap = vertices.next_power_of_two().max(64);
            self.vbo = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("iconforge icon vbo"),
                size: (new_cap * std::mem::size_of::<crate::render::mesh::IconVertex>()) as u64,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
            self.vbo_capacity = new_cap;
        }

        // Sized in index pairs so uploads stay 4-byte aligned.
        let padded = indices + (indices % 2);
        if padded > self.ibo_capacity || self.ibo.is_none() {
            let new_cap = padded.next_power_of_two().max(128);
            self.ibo = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("iconforge icon ibo"),
                size: (new_cap * std::mem::size_of::<u16>()) as u64,
                usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
            self.ibo_capacity = new_cap;
        }
    }
}

fn premul_alpha_blend() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
    }
}

/// `IconUniform` is non-empty by construction; centralising this avoids an
/// `.unwrap()` at the pipeline-creation site.
fn uniform_min_binding_size() -> std::num::NonZeroU64 {
    std::num::NonZeroU64::new(std::mem::size_of::<IconUniform>() as u64)
        .expect("IconUniform has non-zero size by construction")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_block_is_shader_sized() {
        // mat4 + two vec4 lights + one vec4 params = 112 bytes.
        assert_eq!(std::mem::size_of::<IconUniform>(), 112);
    }

    #[test]
    fn light_rig_is_multi_axis() {
        let l0 = LIGHT_0.normalize();
        let l1 = LIGHT_1.normalize();
        // Distinct directions, both with a vertical component.
        assert!(l0.dot(l1) < 0.99);
        assert!(l0.y > 0.0 && l1.y > 0.0);
    }
}
