/// Initialization parameters for the GPU layer.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Prefer an sRGB surface format when available.
    ///
    /// Shadertoy-style fragment programs write display-ready values, so the
    /// default asks for a linear (non-sRGB) format to avoid a second encode.
    pub prefer_srgb: bool,

    /// Present mode (swap behavior).
    ///
    /// `AutoNoVsync` falls back to FIFO where immediate presentation is missing.
    pub present_mode: wgpu::PresentMode,

    /// Optional alpha mode preference for the surface.
    ///
    /// If provided but unsupported on the current surface, a supported mode is selected.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    /// Request `COPY_SRC` on the surface so presented frames can be read back.
    ///
    /// Ignored (with a warning) when the surface does not advertise the usage.
    pub allow_capture: bool,

    /// Required wgpu features.
    pub required_features: wgpu::Features,

    /// Limits requested from the adapter/device.
    pub required_limits: wgpu::Limits,

    /// Desired maximum frame latency for the surface.
    ///
    /// This value is a hint; support depends on platform/backend.
    pub desired_maximum_frame_latency: u32,
}

impl GpuInit {
    /// Selects a present mode from a vsync toggle.
    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.present_mode = if vsync {
            wgpu::PresentMode::AutoVsync
        } else {
            wgpu::PresentMode::AutoNoVsync
        };
        self
    }
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            prefer_srgb: false,
            present_mode: wgpu::PresentMode::AutoNoVsync,
            alpha_mode: None,
            allow_capture: true,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            desired_maximum_frame_latency: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vsync_toggle_selects_present_mode() {
        let on = GpuInit::default().with_vsync(true);
        assert_eq!(on.present_mode, wgpu::PresentMode::AutoVsync);

        let off = GpuInit::default().with_vsync(false);
        assert_eq!(off.present_mode, wgpu::PresentMode::AutoNoVsync);
    }

    #[test]
    fn defaults_favor_linear_surface_and_capture() {
        let init = GpuInit::default();
        assert!(!init.prefer_srgb);
        assert!(init.allow_capture);
    }
}
