use std::borrow::Cow;

use anyhow::{Context, Result};

use super::channels::PassLayout;
use super::ctx::{RenderCtx, RenderTarget};
use super::glsl::{self, AssembledSource, ProgramSource};
use super::quad::{FullscreenQuad, QuadVertex, QUAD_TOPOLOGY};
use super::uniforms::{Globals, UniformBlock, UniformError, UniformValue};

/// A linked vertex + fragment program with its own uniform block.
///
/// Each program keeps a private copy of the uniforms; writes are buffered on
/// the CPU and uploaded once, right before the next draw.
pub struct ShaderProgram {
    label: String,
    pipeline: wgpu::RenderPipeline,
    target_format: wgpu::TextureFormat,
    uniforms: UniformBlock,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
}

impl ShaderProgram {
    /// Wraps, validates and compiles `source` for a color target of `target_format`.
    pub fn new(
        ctx: &RenderCtx<'_>,
        layout: &PassLayout,
        source: &ProgramSource,
        target_format: wgpu::TextureFormat,
        label: &str,
    ) -> Result<Self> {
        let vertex = glsl::assemble_vertex(&source.vertex);
        let fragment = glsl::assemble_fragment(&source.fragment);

        glsl::validate(&vertex)
            .with_context(|| format!("{label}: failed to compile {}", source.vertex.name))?;
        glsl::validate(&fragment)
            .with_context(|| format!("{label}: failed to compile {}", source.fragment_names()))?;

        let vs = create_module(ctx.device, &format!("{label} vs"), vertex);
        let fs = create_module(ctx.device, &format!("{label} fs"), fragment);

        let pipeline = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(layout.pipeline_layout()),

            vertex: wgpu::VertexState {
                module: &vs,
                entry_point: Some("main"),
                compilation_options: Default::default(),
                buffers: &[QuadVertex::layout()],
            },

            fragment: Some(wgpu::FragmentState {
                module: &fs,
                entry_point: Some("main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: target_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: QUAD_TOPOLOGY,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let uniform_buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{label} uniforms")),
            size: std::mem::size_of::<Globals>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{label} uniform bind group")),
            layout: layout.globals_layout(),
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        log::info!(
            "compiled {label}: {} + {} -> {:?}",
            source.vertex.name,
            source.fragment_names(),
            target_format
        );

        Ok(Self {
            label: label.to_string(),
            pipeline,
            target_format,
            uniforms: UniformBlock::default(),
            uniform_buffer,
            uniform_bind_group,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn target_format(&self) -> wgpu::TextureFormat {
        self.target_format
    }

    pub fn uniforms(&self) -> &Globals {
        self.uniforms.values()
    }

    /// Writes a uniform by its GLSL name.
    pub fn set_uniform(&mut self, name: &str, value: UniformValue) -> Result<(), UniformError> {
        self.uniforms.set(name, value)
    }

    pub fn set_resolution(&mut self, width: f32, height: f32) {
        self.uniforms.set_resolution(width, height);
    }

    pub fn set_time(&mut self, time: f32) {
        self.uniforms.set_time(time);
    }

    pub fn set_mouse(&mut self, mouse: [f32; 4]) {
        self.uniforms.set_mouse(mouse);
    }

    pub fn set_frame(&mut self, frame: i32) {
        self.uniforms.set_frame(frame);
    }

    pub fn set_aa(&mut self, aa: i32) {
        self.uniforms.set_aa(aa);
    }

    /// Selects a bottom-left `fragCoord` origin for passes drawn to the surface.
    pub fn set_flip_y(&mut self, flip: bool) {
        self.uniforms.set_flip_y(flip);
    }

    /// Records one full-screen draw into `target`, reading `channels`.
    pub fn draw(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        channels: &wgpu::BindGroup,
        quad: &FullscreenQuad,
    ) {
        if let Some(globals) = self.uniforms.take_dirty() {
            ctx.queue
                .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(globals));
        }

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(&self.label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
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
            multiview_mask: None,
        });

        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, &self.uniform_bind_group, &[]);
        rpass.set_bind_group(1, channels, &[]);
        quad.draw(&mut rpass);
    }
}

fn create_module(device: &wgpu::Device, label: &str, source: AssembledSource) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Owned(source.text),
            stage: source.stage.to_naga(),
            defines: Default::default(),
        },
    })
}
