use anyhow::{Context, Result, anyhow};
use bytemuck::{Pod, Zeroable};

use crate::coords::{Rect, Viewport};

use super::batch::QuadBatch;
use super::buffers::{BufferBudget, QuadBuffers};
use super::quad::{Quad, Vertex};

/// Frame clear color (linear RGBA).
pub const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 1.0,
    g: 0.5,
    b: 0.25,
    a: 1.0,
};

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct ViewportUniform {
    viewport: [f32; 2],
    _pad: [f32; 2], // 16-byte alignment
}

fn viewport_ubo_min_binding_size() -> Option<std::num::NonZeroU64> {
    std::num::NonZeroU64::new(std::mem::size_of::<ViewportUniform>() as u64)
}

/// Batched quad renderer.
///
/// Geometry is provided as logical pixels, converted to NDC in the vertex
/// shader using the viewport uniform. Quads accumulate on the CPU between
/// frames and are uploaded and drawn in a single indexed call per frame.
pub struct QuadRenderer {
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    viewport_ubo: wgpu::Buffer,
    buffers: QuadBuffers,
    batch: QuadBatch,
}

impl QuadRenderer {
    /// Builds the pipeline and allocates GPU storage at the initial budget.
    ///
    /// Any failure here is unrecoverable; the caller logs it and aborts
    /// startup.
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat) -> Result<Self> {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("vermilion quad shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/quad.wgsl").into()),
        });

        let min_binding_size = viewport_ubo_min_binding_size()
            .ok_or_else(|| anyhow!("viewport uniform has zero size"))?;

        let bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("vermilion quad bgl"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: Some(min_binding_size),
                    },
                    count: None,
                }],
            });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("vermilion quad pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            // Newer wgpu uses immediate constants; keep disabled for now.
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("vermilion quad pipeline"),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[Vertex::layout()],
            },

            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
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

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),

            // Newer wgpu field names:
            multiview_mask: None,
            cache: None,
        });

        let viewport_ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("vermilion quad viewport ubo"),
            size: std::mem::size_of::<ViewportUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("vermilion quad bind group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: viewport_ubo.as_entire_binding(),
            }],
        });

        let buffers = QuadBuffers::new(device, BufferBudget::default())
            .context("failed to allocate initial quad storage")?;

        Ok(Self {
            pipeline,
            bind_group,
            viewport_ubo,
            buffers,
            batch: QuadBatch::new(),
        })
    }

    /// Queues a quad for the current frame.
    pub fn draw(&mut self, quad: Quad) {
        self.batch.push(quad);
    }

    /// Queues a full-texture quad covering `rect`.
    pub fn draw_rect(&mut self, rect: Rect) {
        self.batch.push(Quad::new(rect));
    }

    /// Quads queued so far this frame.
    pub fn quad_count(&self) -> u32 {
        self.batch.quad_count()
    }

    /// Current GPU capacity in quads.
    pub fn capacity(&self) -> u32 {
        self.buffers.capacity()
    }

    /// Drops any quads queued for a frame that will not be drawn, so the
    /// next frame starts from an empty batch.
    pub fn discard_batch(&mut self) {
        self.batch.reset();
    }

    /// Uploads the accumulated batch and records the frame's render pass
    /// into `encoder`. The pass always runs, clearing the target even when
    /// no quads were queued. Returns the number of quads drawn; the batch
    /// is reset for the next frame either way.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        viewport: Viewport,
    ) -> Result<u32> {
        let quad_count = self.batch.quad_count();
        let index_count = self.batch.index_count();

        if quad_count > 0 {
            self.buffers.ensure_capacity(device, quad_count)?;
            self.buffers
                .upload(queue, encoder, self.batch.vertices(), self.batch.indices())?;

            let u = ViewportUniform {
                viewport: [viewport.width.max(1.0), viewport.height.max(1.0)],
                _pad: [0.0; 2],
            };
            queue.write_buffer(&self.viewport_ubo, 0, bytemuck::bytes_of(&u));
        }

        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("vermilion quad pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            if quad_count > 0 {
                let (vertex_buf, index_buf) = self.buffers.current()?;
                rpass.set_pipeline(&self.pipeline);
                rpass.set_bind_group(0, &self.bind_group, &[]);
                rpass.set_vertex_buffer(0, vertex_buf.slice(..));
                rpass.set_index_buffer(index_buf.slice(..), wgpu::IndexFormat::Uint32);
                rpass.draw_indexed(0..index_count, 0, 0..1);
            }
        }

        self.batch.reset();
        Ok(quad_count)
    }

    /// Releases GPU storage. The renderer must not be used afterwards.
    pub fn release(&mut self) -> Result<()> {
        self.buffers.release()
    }
}
