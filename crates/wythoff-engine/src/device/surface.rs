use winit::dpi::PhysicalSize;

use super::SurfaceErrorAction;

/// Picks a surface format matching the sRGB preference, falling back to the
/// first advertised format.
pub(crate) fn choose_surface_format(
    formats: &[wgpu::TextureFormat],
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    let first = *formats.first()?;

    let preferred = if prefer_srgb {
        [
            wgpu::TextureFormat::Bgra8UnormSrgb,
            wgpu::TextureFormat::Rgba8UnormSrgb,
        ]
    } else {
        [
            wgpu::TextureFormat::Bgra8Unorm,
            wgpu::TextureFormat::Rgba8Unorm,
        ]
    };
    for f in preferred {
        if formats.contains(&f) {
            return Some(f);
        }
    }

    Some(
        formats
            .iter()
            .copied()
            .find(|f| f.is_srgb() == prefer_srgb)
            .unwrap_or(first),
    )
}

pub(crate) fn choose_alpha_mode(
    caps: &wgpu::SurfaceCapabilities,
    requested: Option<wgpu::CompositeAlphaMode>,
) -> wgpu::CompositeAlphaMode {
    requested
        .filter(|m| caps.alpha_modes.contains(m))
        .or_else(|| caps.alpha_modes.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}

/// Surface usages: always a render attachment, plus `COPY_SRC` for frame
/// capture when requested and supported.
pub(crate) fn choose_usage(
    supported: wgpu::TextureUsages,
    allow_capture: bool,
) -> wgpu::TextureUsages {
    let mut usage = wgpu::TextureUsages::RENDER_ATTACHMENT;
    if allow_capture {
        if supported.contains(wgpu::TextureUsages::COPY_SRC) {
            usage |= wgpu::TextureUsages::COPY_SRC;
        } else {
            log::warn!("surface does not support COPY_SRC; screenshots are disabled");
        }
    }
    usage
}

/// Clamps a requested size to at least one pixel per axis and at most the
/// device limit.
pub(crate) fn clamp_extent(size: PhysicalSize<u32>, max_dimension: u32) -> PhysicalSize<u32> {
    PhysicalSize::new(
        size.width.clamp(1, max_dimension.max(1)),
        size.height.clamp(1, max_dimension.max(1)),
    )
}

pub(crate) fn has_area(size: PhysicalSize<u32>) -> bool {
    size.width > 0 && size.height > 0
}

pub(crate) fn apply_resize(
    surface: &wgpu::Surface,
    device: &wgpu::Device,
    config: &mut wgpu::SurfaceConfiguration,
    size: &mut PhysicalSize<u32>,
    new_size: PhysicalSize<u32>,
) {
    // wgpu rejects 0x0 configurations (minimized windows); defer until restored.
    if !has_area(new_size) {
        *size = new_size;
        return;
    }

    let max_dimension = device.limits().max_texture_dimension_2d;
    let clamped = clamp_extent(new_size, max_dimension);
    if clamped != new_size {
        log::warn!(
            "requested surface size {}x{} exceeds device limit {max_dimension}; clamping",
            new_size.width,
            new_size.height
        );
    }

    *size = clamped;
    config.width = clamped.width;
    config.height = clamped.height;

    surface.configure(device, config);
}

pub(crate) fn map_surface_error(
    surface: &wgpu::Surface,
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    err: wgpu::SurfaceError,
) -> SurfaceErrorAction {
    match err {
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
            if size.width > 0 && size.height > 0 {
                surface.configure(device, config);
            }
            SurfaceErrorAction::Reconfigured
        }
        wgpu::SurfaceError::OutOfMemory => SurfaceErrorAction::Fatal,
        wgpu::SurfaceError::Timeout => SurfaceErrorAction::SkipFrame,
        wgpu::SurfaceError::Other => SurfaceErrorAction::SkipFrame,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::TextureFormat as F;

    #[test]
    fn linear_preference_skips_srgb_formats() {
        let formats = [F::Bgra8UnormSrgb, F::Bgra8Unorm];
        assert_eq!(choose_surface_format(&formats, false), Some(F::Bgra8Unorm));
    }

    #[test]
    fn srgb_preference_picks_srgb() {
        let formats = [F::Rgba8Unorm, F::Rgba8UnormSrgb];
        assert_eq!(choose_surface_format(&formats, true), Some(F::Rgba8UnormSrgb));
    }

    #[test]
    fn falls_back_to_first_format() {
        let formats = [F::Rgb10a2Unorm];
        assert_eq!(choose_surface_format(&formats, true), Some(F::Rgb10a2Unorm));
        assert_eq!(choose_surface_format(&[], false), None);
    }

    #[test]
    fn capture_usage_requires_support() {
        let all = wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC;
        assert!(choose_usage(all, true).contains(wgpu::TextureUsages::COPY_SRC));
        assert!(!choose_usage(all, false).contains(wgpu::TextureUsages::COPY_SRC));
        assert_eq!(
            choose_usage(wgpu::TextureUsages::RENDER_ATTACHMENT, true),
            wgpu::TextureUsages::RENDER_ATTACHMENT
        );
    }

    #[test]
    fn minimized_sizes_have_no_area() {
        assert!(!has_area(PhysicalSize::new(0, 0)));
        assert!(!has_area(PhysicalSize::new(800, 0)));
        assert!(has_area(PhysicalSize::new(1, 1)));
    }

    #[test]
    fn extent_is_clamped_to_limits() {
        let s = clamp_extent(PhysicalSize::new(0, 9000), 8192);
        assert_eq!(s, PhysicalSize::new(1, 8192));
    }
}
