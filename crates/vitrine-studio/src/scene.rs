use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};

use vitrine_engine::render::{RenderCtx, RenderTarget};

const ORANGE: [f32; 4] = [1.0, 0.5, 0.0, 1.0];
const BACKDROP: [f32; 4] = [0.18, 0.2, 0.26, 1.0];

/// Demo scene: an orange square spinning in front of a backdrop square.
///
/// The backdrop is drawn after the square at a greater depth, so the square
/// only stays visible when the target's depth buffer works.
#[derive(Default)]
pub struct SpinningQuad {
    pipeline_key: Option<(wgpu::TextureFormat, Option<wgpu::TextureFormat>)>,
    pipeline: Option<wgpu::RenderPipeline>,

    bind_group_layout: Option<wgpu::BindGroupLayout>,
    bind_group: Option<wgpu::BindGroup>,
    viewport_ubo: Option<wgpu::Buffer>,
    instance_vbo: Option<wgpu::Buffer>,
}

impl SpinningQuad {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draws the scene rotated by `angle` radians.
    pub fn render(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>, angle: f32) {
        self.ensure_pipeline(ctx);
        self.ensure_buffers(ctx);

        let Some(viewport_ubo) = self.viewport_ubo.as_ref() else { return };
        let Some(instance_vbo) = self.instance_vbo.as_ref() else { return };

        let viewport = ViewportUniform {
            aspect: ctx.viewport.width() as f32 / ctx.viewport.height() as f32,
            _pad: [0.0; 3],
        };
        ctx.queue.write_buffer(viewport_ubo, 0, bytemuck::bytes_of(&viewport));
        ctx.queue.write_buffer(instance_vbo, 0, bytemuck::cast_slice(&quads(angle)));

        let Some(pipeline) = self.pipeline.as_ref() else { return };
        let Some(bind_group) = self.bind_group.as_ref() else { return };

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("vitrine studio scene pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: target.depth_stencil_view.map(|view| {
                wgpu::RenderPassDepthStencilAttachment {
                    view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, bind_group, &[]);
        rpass.set_vertex_buffer(0, instance_vbo.slice(..));
        rpass.draw(0..6, 0..QUAD_COUNT as u32);
    }

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>) {
        let key = (ctx.color_format, ctx.depth_stencil_format);
        if self.pipeline_key == Some(key) && self.pipeline.is_some() {
            return;
        }

        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("vitrine studio quad shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/quad.wgsl").into()),
        });

        let bind_group_layout = ctx
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("vitrine studio quad bgl"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: NonZeroU64::new(std::mem::size_of::<ViewportUniform>() as u64),
                    },
                    count: None,
                }],
            });

        let pipeline_layout = ctx
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("vitrine studio quad pipeline layout"),
                bind_group_layouts: &[&bind_group_layout],
                immediate_size: 0,
            });

        let depth_stencil = ctx.depth_stencil_format.map(|format| wgpu::DepthStencilState {
            format,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        });

        let pipeline = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("vitrine studio quad pipeline"),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[QuadInstance::layout()],
            },

            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.color_format,
                    blend: Some(wgpu::BlendState::REPLACE),
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

            depth_stencil,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        self.pipeline_key = Some(key);
        self.pipeline = Some(pipeline);
        self.bind_group_layout = Some(bind_group_layout);
        self.bind_group = None;
    }

    fn ensure_buffers(&mut self, ctx: &RenderCtx<'_>) {
        if self.viewport_ubo.is_none() {
            self.viewport_ubo = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("vitrine studio quad viewport ubo"),
                size: std::mem::size_of::<ViewportUniform>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
        }

        if self.instance_vbo.is_none() {
            self.instance_vbo = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("vitrine studio quad instance vbo"),
                size: (QUAD_COUNT * std::mem::size_of::<QuadInstance>()) as u64,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
        }

        if self.bind_group.is_some() {
            return;
        }
        let (Some(bgl), Some(ubo)) = (self.bind_group_layout.as_ref(), self.viewport_ubo.as_ref()) else {
            return;
        };
        self.bind_group = Some(ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("vitrine studio quad bind group"),
            layout: bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: ubo.as_entire_binding(),
            }],
        }));
    }
}

const QUAD_COUNT: usize = 2;

/// Square first, backdrop second.
fn quads(angle: f32) -> [QuadInstance; QUAD_COUNT] {
    [
        QuadInstance {
            rotation: [angle.cos(), angle.sin()],
            scale: 0.9,
            depth: 0.25,
            color: ORANGE,
        },
        QuadInstance {
            rotation: [1.0, 0.0],
            scale: 1.6,
            depth: 0.75,
            color: BACKDROP,
        },
    ]
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct ViewportUniform {
    aspect: f32,
    _pad: [f32; 3], // 16-byte alignment
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct QuadInstance {
    rotation: [f32; 2],
    scale: f32,
    depth: f32,
    color: [f32; 4],
}

impl QuadInstance {
    const ATTRS: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        0 => Float32x2, // rotation
        1 => Float32,   // scale
        2 => Float32,   // depth
        3 => Float32x4  // color
    ];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadInstance>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRS,
        }
    }
}
