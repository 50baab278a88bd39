//! Frame readback: copies a presented surface texture into a PNG.

use std::path::Path;

use anyhow::{bail, Context, Result};

pub use image::RgbaImage;

/// Row pitch for a buffer copy of `width` texels of `bytes_per_texel` each.
pub fn padded_bytes_per_row(width: u32, bytes_per_texel: u32) -> u32 {
    let unpadded = width * bytes_per_texel;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

/// Drops the per-row padding of a mapped copy buffer.
pub fn unpad_rows(data: &[u8], unpadded: usize, padded: usize, rows: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(unpadded * rows);
    for row in data.chunks(padded).take(rows) {
        out.extend_from_slice(&row[..unpadded.min(row.len())]);
    }
    out
}

/// Swaps the red and blue channels of tightly packed 4-byte texels in place.
pub fn swizzle_bgra(pixels: &mut [u8]) {
    for px in pixels.chunks_exact_mut(4) {
        px.swap(0, 2);
    }
}

fn is_bgra(format: wgpu::TextureFormat) -> Result<bool> {
    match format {
        wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Bgra8UnormSrgb => Ok(true),
        wgpu::TextureFormat::Rgba8Unorm | wgpu::TextureFormat::Rgba8UnormSrgb => Ok(false),
        other => bail!("cannot capture surface format {other:?}"),
    }
}

/// A pending copy of one texture into a mappable buffer.
///
/// Encode it into the same command encoder as the frame, submit, then call
/// [`Readback::finish`].
pub struct Readback {
    buffer: wgpu::Buffer,
    width: u32,
    height: u32,
    padded_row: u32,
    bgra: bool,
}

impl Readback {
    /// Records a copy of `texture` into a new staging buffer.
    pub fn encode(
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        texture: &wgpu::Texture,
    ) -> Result<Self> {
        let bgra = is_bgra(texture.format())?;
        let width = texture.width();
        let height = texture.height();
        let padded_row = padded_bytes_per_row(width, 4);

        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("wythoff capture buffer"),
            size: u64::from(padded_row) * u64::from(height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        encoder.copy_texture_to_buffer(
            texture.as_image_copy(),
            wgpu::TexelCopyBufferInfo {
                buffer: &buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );

        Ok(Self {
            buffer,
            width,
            height,
            padded_row,
            bgra,
        })
    }

    /// Maps the staging buffer (blocking) and returns the image, top row first.
    ///
    /// Must be called after the encoder holding the copy was submitted.
    pub fn finish(self, device: &wgpu::Device) -> Result<RgbaImage> {
        let slice = self.buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |res| {
            let _ = tx.send(res);
        });

        device
            .poll(wgpu::PollType::wait_indefinitely())
            .context("device poll failed while reading back the frame")?;

        rx.recv()
            .context("capture buffer mapping was dropped")?
            .context("failed to map capture buffer")?;

        let mut pixels = {
            let data = slice.get_mapped_range();
            unpad_rows(
                &data,
                (self.width * 4) as usize,
                self.padded_row as usize,
                self.height as usize,
            )
        };
        self.buffer.unmap();

        if self.bgra {
            swizzle_bgra(&mut pixels);
        }
        for px in pixels.chunks_exact_mut(4) {
            px[3] = 255;
        }

        RgbaImage::from_raw(self.width, self.height, pixels)
            .context("capture buffer size does not match the frame")
    }
}

/// Writes `image` to `path` as PNG.
pub fn save_png(image: &RgbaImage, path: &Path) -> Result<()> {
    image
        .save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_padded_to_copy_alignment() {
        assert_eq!(padded_bytes_per_row(64, 4), 256);
        assert_eq!(padded_bytes_per_row(65, 4), 512);
        assert_eq!(padded_bytes_per_row(800, 4), 3328);
        assert_eq!(padded_bytes_per_row(1, 4), 256);
    }

    #[test]
    fn unpad_keeps_only_visible_bytes() {
        let padded = [1, 2, 9, 9, 3, 4, 9, 9];
        assert_eq!(unpad_rows(&padded, 2, 4, 2), vec![1, 2, 3, 4]);
    }

    #[test]
    fn unpad_stops_at_row_count() {
        let padded = [1, 2, 9, 9, 3, 4, 9, 9, 5, 6, 9, 9];
        assert_eq!(unpad_rows(&padded, 2, 4, 2), vec![1, 2, 3, 4]);
    }

    #[test]
    fn swizzle_swaps_red_and_blue() {
        let mut px = vec![10, 20, 30, 40, 1, 2, 3, 4];
        swizzle_bgra(&mut px);
        assert_eq!(px, vec![30, 20, 10, 40, 3, 2, 1, 4]);
    }

    #[test]
    fn only_8bit_formats_are_capturable() {
        assert!(is_bgra(wgpu::TextureFormat::Bgra8Unorm).unwrap());
        assert!(!is_bgra(wgpu::TextureFormat::Rgba8UnormSrgb).unwrap());
        assert!(is_bgra(wgpu::TextureFormat::Rgba16Float).is_err());
    }
}
