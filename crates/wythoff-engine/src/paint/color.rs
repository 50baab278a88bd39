/// Straight-alpha RGBA color in `[0, 1]`.
///
/// Values are passed to the GPU as-is; no color space conversion happens here.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    #[inline]
    pub const fn transparent() -> Self {
        Self { r: 0.0, g: 0.0, b: 0.0, a: 0.0 }
    }

    pub(crate) fn to_wgpu(self) -> wgpu::Color {
        wgpu::Color {
            r: self.r as f64,
            g: self.g as f64,
            b: self.b as f64,
            a: self.a as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transparent_is_zero() {
        assert_eq!(Color::transparent(), Color::default());
    }

    #[test]
    fn converts_to_wgpu_channels() {
        let c = Color {
            r: 1.0,
            g: 0.0,
            b: 0.25,
            a: 0.5,
        }
        .to_wgpu();
        assert_eq!((c.r, c.g, c.b, c.a), (1.0, 0.0, 0.25, 0.5));
    }
}
