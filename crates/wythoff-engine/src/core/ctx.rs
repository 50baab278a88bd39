use anyhow::Result;
use winit::dpi::PhysicalSize;
use winit::window::{Window, WindowId};

use crate::device::{Gpu, SurfaceErrorAction};
use crate::input::{InputFrame, InputState};
use crate::paint::Color;
use crate::render::{Readback, RenderCtx, RenderTarget, RgbaImage};
use crate::time::FrameTime;

/// Per-window handles and immutable window metadata.
pub struct WindowCtx<'a> {
    pub id: WindowId,
    pub window: &'a Window,
}

impl<'a> WindowCtx<'a> {
    /// Returns the drawable size in physical pixels.
    pub fn physical_size(&self) -> PhysicalSize<u32> {
        self.window.inner_size()
    }

    pub fn scale_factor(&self) -> f64 {
        self.window.scale_factor()
    }
}

/// Context passed to `core::App::on_init`.
pub struct InitCtx<'a, 'w> {
    pub window: WindowCtx<'a>,
    pub gpu: &'a Gpu<'w>,
}

impl<'a, 'w> InitCtx<'a, 'w> {
    /// Renderer-facing view of the GPU context at its current size.
    pub fn render_ctx(&self) -> RenderCtx<'_> {
        RenderCtx::new(
            self.gpu.device(),
            self.gpu.queue(),
            self.gpu.surface_format(),
            self.gpu.size(),
        )
    }
}

/// Outcome of [`FrameCtx::render`].
pub enum FrameStatus {
    /// The frame was submitted and presented. `capture` holds the read-back
    /// image when one was requested.
    Presented { capture: Option<Result<RgbaImage>> },
    /// The surface was unavailable (lost, outdated, timed out); try next frame.
    Skipped,
    /// The surface cannot recover.
    Fatal,
}

/// Per-frame context passed to `core::App::on_frame`.
///
/// Lifetimes:
/// - `'a` is the duration of the callback invocation
/// - `'w` is the window-borrow lifetime carried by `Gpu<'w>`
pub struct FrameCtx<'a, 'w> {
    pub window: WindowCtx<'a>,
    pub gpu: &'a mut Gpu<'w>,
    pub input: &'a InputState,
    pub input_frame: &'a InputFrame,
    pub time: FrameTime,
}

impl<'a, 'w> FrameCtx<'a, 'w> {
    /// Clears the surface with `clear`, calls `draw` with a ready [`RenderCtx`] and
    /// [`RenderTarget`], then presents the frame.
    ///
    /// With `capture` set the surface texture is copied out after `draw` and
    /// returned as an image. Capture fails when the surface was configured
    /// without `COPY_SRC`.
    pub fn render<F>(&mut self, clear: Color, capture: bool, draw: F) -> FrameStatus
    where
        F: FnOnce(&RenderCtx<'_>, &mut RenderTarget<'_>),
    {
        let mut frame = match self.gpu.begin_frame() {
            Ok(f) => f,
            Err(err) => {
                return match self.gpu.handle_surface_error(err) {
                    SurfaceErrorAction::Fatal => FrameStatus::Fatal,
                    _ => FrameStatus::Skipped,
                };
            }
        };

        // Clear pass; dropped before the encoder is moved into submit().
        {
            let _rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("wythoff clear"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear.to_wgpu()),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
        }

        let rctx = RenderCtx::new(
            self.gpu.device(),
            self.gpu.queue(),
            self.gpu.surface_format(),
            self.gpu.size(),
        );

        // RenderTarget borrows frame.encoder; dropped before submit() takes frame.
        {
            let mut target = RenderTarget::new(&mut frame.encoder, &frame.view);
            draw(&rctx, &mut target);
        }

        let readback = if capture {
            Some(if self.gpu.can_capture() {
                Readback::encode(
                    self.gpu.device(),
                    &mut frame.encoder,
                    &frame.surface_texture.texture,
                )
            } else {
                Err(anyhow::anyhow!("surface does not support COPY_SRC"))
            })
        } else {
            None
        };

        self.window.window.pre_present_notify();
        self.gpu.submit(frame);

        let capture = readback.map(|r| r.and_then(|r| r.finish(self.gpu.device())));
        FrameStatus::Presented { capture }
    }
}
