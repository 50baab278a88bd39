use std::path::Path;

use anyhow::{Context, Result};
use image::RgbaImage;
use wgpu::util::{DeviceExt, TextureDataOrder};

/// A sampled 2D texture with its default view.
pub struct Texture {
    #[allow(dead_code)]
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl Texture {
    /// Uploads an RGBA8 image.
    ///
    /// Rows are flipped so that texture coordinate `v = 0` addresses the
    /// bottom of the image, the convention fragment programs are written for.
    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &RgbaImage,
        label: &str,
    ) -> Result<Self> {
        let (width, height) = image.dimensions();
        anyhow::ensure!(width > 0 && height > 0, "image {label} has zero extent");

        let max = device.limits().max_texture_dimension_2d;
        anyhow::ensure!(
            width <= max && height <= max,
            "image {label} is {width}x{height}, device limit is {max}"
        );

        let mut flipped = image.clone();
        image::imageops::flip_vertical_in_place(&mut flipped);

        Ok(Self::with_data(
            device,
            queue,
            label,
            width,
            height,
            wgpu::TextureFormat::Rgba8Unorm,
            flipped.as_raw(),
        ))
    }

    /// Decodes and uploads an image file.
    pub fn load(device: &wgpu::Device, queue: &wgpu::Queue, path: &Path) -> Result<Self> {
        let image = image::open(path)
            .with_context(|| format!("failed to open texture {}", path.display()))?
            .to_rgba8();
        let texture = Self::from_image(device, queue, &image, &path.display().to_string())?;
        log::info!(
            "loaded texture {} ({}x{})",
            path.display(),
            texture.width,
            texture.height
        );
        Ok(texture)
    }

    /// Loads `path`, or falls back to a 1x1 white texture with a warning.
    pub fn load_or_placeholder(device: &wgpu::Device, queue: &wgpu::Queue, path: &Path) -> Self {
        match Self::load(device, queue, path) {
            Ok(texture) => texture,
            Err(err) => {
                log::warn!("{err:#}; using placeholder texture");
                Self::solid_rgba8(device, queue, [255; 4], "placeholder texture")
            }
        }
    }

    /// 1x1 RGBA8 texture.
    pub fn solid_rgba8(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        rgba: [u8; 4],
        label: &str,
    ) -> Self {
        Self::with_data(device, queue, label, 1, 1, wgpu::TextureFormat::Rgba8Unorm, &rgba)
    }

    /// 1x1 RGBA32F texture, bindable wherever a framebuffer is expected.
    pub fn solid_float(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        rgba: [f32; 4],
        label: &str,
    ) -> Self {
        Self::with_data(
            device,
            queue,
            label,
            1,
            1,
            wgpu::TextureFormat::Rgba32Float,
            bytemuck::cast_slice(&rgba),
        )
    }

    fn with_data(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
        data: &[u8],
    ) -> Self {
        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            TextureDataOrder::LayerMajor,
            data,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            texture,
            view,
            width,
            height,
        }
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }
}
