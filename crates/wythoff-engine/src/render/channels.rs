//! Bind group layouts shared by every pass, and the channel slot table.
//!
//! Group 0 holds the uniform block, group 1 the textures read by a pass:
//!
//! | binding | GLSL name   | contents                          |
//! |---------|-------------|-----------------------------------|
//! | 0       | `iChannel0` | float framebuffer, nearest        |
//! | 1       | `iChannel1` | float framebuffer, nearest        |
//! | 2       | `iTexture`  | RGBA8 image, linear               |
//! | 3, 4    | samplers    | nearest / linear                  |
//!
//! Slots a pass leaves empty are filled with 1x1 placeholders.

use super::texture::Texture;
use super::uniforms::Globals;

/// Texture views bound to the channel slots of one pass.
#[derive(Default, Clone, Copy)]
pub struct ChannelViews<'a> {
    pub channel0: Option<&'a wgpu::TextureView>,
    pub channel1: Option<&'a wgpu::TextureView>,
    pub texture: Option<&'a wgpu::TextureView>,
}

/// Layouts, samplers and placeholders shared by all shader programs.
pub struct PassLayout {
    globals_layout: wgpu::BindGroupLayout,
    channel_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    nearest: wgpu::Sampler,
    linear: wgpu::Sampler,
    empty_channel: Texture,
    empty_texture: Texture,
}

impl PassLayout {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("wythoff globals bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<Globals>() as u64),
                },
                count: None,
            }],
        });

        let float_texture = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                // Rgba32Float is not filterable without an optional feature.
                sample_type: wgpu::TextureSampleType::Float { filterable: false },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };

        let channel_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("wythoff channel bgl"),
            entries: &[
                float_texture(0),
                float_texture(1),
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::NonFiltering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 4,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("wythoff pass pipeline layout"),
            bind_group_layouts: &[&globals_layout, &channel_layout],
            immediate_size: 0,
        });

        let nearest = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("wythoff nearest sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let linear = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("wythoff linear sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            globals_layout,
            channel_layout,
            pipeline_layout,
            nearest,
            linear,
            empty_channel: Texture::solid_float(device, queue, [0.0; 4], "empty channel"),
            empty_texture: Texture::solid_rgba8(device, queue, [255; 4], "empty texture"),
        }
    }

    pub(crate) fn globals_layout(&self) -> &wgpu::BindGroupLayout {
        &self.globals_layout
    }

    pub(crate) fn pipeline_layout(&self) -> &wgpu::PipelineLayout {
        &self.pipeline_layout
    }

    /// Builds the group-1 bind group for one pass.
    pub fn bind_channels(
        &self,
        device: &wgpu::Device,
        views: ChannelViews<'_>,
        label: &str,
    ) -> wgpu::BindGroup {
        let channel0 = views.channel0.unwrap_or(self.empty_channel.view());
        let channel1 = views.channel1.unwrap_or(self.empty_channel.view());
        let texture = views.texture.unwrap_or(self.empty_texture.view());

        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &self.channel_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(channel0),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(channel1),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(texture),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&self.nearest),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::Sampler(&self.linear),
                },
            ],
        })
    }
}
