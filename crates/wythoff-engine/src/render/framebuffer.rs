use winit::dpi::PhysicalSize;

/// Offscreen float render target, sampled by later passes.
pub struct Framebuffer {
    #[allow(dead_code)]
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    size: PhysicalSize<u32>,
}

impl Framebuffer {
    /// Full-precision float, like the `GL_RGBA32F` buffers feedback shaders
    /// store state in.
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;

    pub fn new(device: &wgpu::Device, size: PhysicalSize<u32>, label: &str) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: size.width.max(1),
                height: size.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self { texture, view, size }
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }
}

/// Two framebuffers alternating between write and read roles.
///
/// A pass that samples its own previous output writes `front` while reading
/// `back`; `flip` swaps the roles for the next frame.
pub struct PingPong {
    buffers: [Framebuffer; 2],
    front: usize,
}

impl PingPong {
    pub fn new(device: &wgpu::Device, size: PhysicalSize<u32>, label: &str) -> Self {
        Self {
            buffers: [
                Framebuffer::new(device, size, &format!("{label} #0")),
                Framebuffer::new(device, size, &format!("{label} #1")),
            ],
            front: 0,
        }
    }

    /// Index of the buffer written this frame.
    pub fn front_index(&self) -> usize {
        self.front
    }

    /// Buffer written this frame.
    pub fn front(&self) -> &Framebuffer {
        &self.buffers[self.front]
    }

    pub fn get(&self, index: usize) -> &Framebuffer {
        &self.buffers[index & 1]
    }

    pub fn flip(&mut self) {
        self.front ^= 1;
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.buffers[0].size()
    }
}
