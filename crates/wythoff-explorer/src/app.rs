//! The explorer application: three full-screen passes fed with time, frame
//! and mouse state.
//!
//! Pass A renders into a ping-pong pair and reads its own previous frame,
//! pass B reads A, and pass C composites A, B and the font texture onto the
//! surface.

use anyhow::{bail, Result};
use winit::dpi::PhysicalSize;

use wythoff_engine::core::{App, AppControl, FrameCtx, FrameStatus, InitCtx};
use wythoff_engine::input::{InputEvent, Key, MouseButtonState};
use wythoff_engine::paint::Color;
use wythoff_engine::render::capture::{self, RgbaImage};
use wythoff_engine::render::{
    ChannelViews, Framebuffer, FullscreenQuad, PassLayout, PingPong, ProgramSource, RenderCtx,
    RenderTarget, ShaderProgram, Texture,
};
use wythoff_engine::time::FrameTime;

use crate::cli::ExplorerConfig;

const VERTEX_SOURCE: &str = "wythoff.vert";
const COMMON_SOURCE: &str = "common.frag";

/// `iMouse` tracking in the Shadertoy convention.
///
/// Pointer positions arrive with a top-left origin; shaders expect a
/// bottom-left one. While a button is held `xy` follows the pointer and `zw`
/// keep the press position. Releasing any button zeroes the vector.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct MouseTracker {
    value: [f32; 4],
    held: bool,
}

impl MouseTracker {
    fn press(x: f32, y: f32, height: f32) -> [f32; 4] {
        let yb = height - y;
        [x, yb, x, height - yb]
    }

    /// Applies one input event. Returns true when `iMouse` changed.
    fn apply(&mut self, event: &InputEvent, height: f32) -> bool {
        let next = match event {
            InputEvent::PointerButton(ev) => match ev.state {
                MouseButtonState::Pressed => {
                    self.held = true;
                    Self::press(ev.x, ev.y, height)
                }
                MouseButtonState::Released => {
                    self.held = false;
                    [0.0; 4]
                }
            },
            InputEvent::PointerMoved(ev) if self.held => {
                [ev.x, height - ev.y, self.value[2], self.value[3]]
            }
            // A release outside the focused window is never delivered.
            InputEvent::Focused(false) if self.held => {
                self.held = false;
                [0.0; 4]
            }
            _ => return false,
        };

        let changed = next != self.value;
        self.value = next;
        changed
    }
}

/// What a new surface size means for the offscreen targets.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum SizeAction {
    /// Zero-area surface. Targets and frame counter are kept and nothing is drawn.
    Minimized,
    Unchanged,
    Resize,
}

fn size_action(current: PhysicalSize<u32>, new: PhysicalSize<u32>) -> SizeAction {
    if new.width == 0 || new.height == 0 {
        SizeAction::Minimized
    } else if new == current {
        SizeAction::Unchanged
    } else {
        SizeAction::Resize
    }
}

/// Frame counter and the screenshot request waiting for a presented frame.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct FrameState {
    frame: i32,
    capture_pending: bool,
}

impl FrameState {
    fn apply_size(&mut self, current: PhysicalSize<u32>, new: PhysicalSize<u32>) -> SizeAction {
        let action = size_action(current, new);
        if action == SizeAction::Resize {
            self.frame = 0;
        }
        action
    }

    fn presented(&mut self) {
        self.frame = self.frame.wrapping_add(1);
        self.capture_pending = false;
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum Pass {
    A,
    B,
    C,
}

/// Slot of buffer A that `pass` samples as `iChannel0` while slot `front`
/// is being written. Pass A reads its previous frame; B and C read the
/// current one.
fn channel0_index(pass: Pass, front: usize) -> usize {
    match pass {
        Pass::A => front ^ 1,
        Pass::B | Pass::C => front,
    }
}

/// GPU resources of the three-pass chain.
struct PassChain {
    layout: PassLayout,
    quad: FullscreenQuad,
    font: Texture,

    buffer_a: PingPong,
    buffer_b: Framebuffer,

    program_a: ShaderProgram,
    program_b: ShaderProgram,
    program_c: ShaderProgram,

    // Indexed by `buffer_a.front_index()`.
    channels_a: [wgpu::BindGroup; 2],
    channels_b: [wgpu::BindGroup; 2],
    channels_c: [wgpu::BindGroup; 2],
}

impl PassChain {
    fn new(rctx: &RenderCtx<'_>, config: &ExplorerConfig) -> Result<Self> {
        let dir = config.shader_dir.as_path();
        let load = |pass: &str| ProgramSource::load(dir, VERTEX_SOURCE, &[COMMON_SOURCE, pass]);

        let layout = PassLayout::new(rctx.device, rctx.queue);
        let quad = FullscreenQuad::new(rctx.device);
        let font = Texture::load_or_placeholder(rctx.device, rctx.queue, &config.font);

        let program_a = ShaderProgram::new(
            rctx,
            &layout,
            &load("BufferA.frag")?,
            Framebuffer::FORMAT,
            "pass A",
        )?;
        let mut program_b = ShaderProgram::new(
            rctx,
            &layout,
            &load("BufferB.frag")?,
            Framebuffer::FORMAT,
            "pass B",
        )?;
        let mut program_c = ShaderProgram::new(
            rctx,
            &layout,
            &load("main.frag")?,
            rctx.surface_format,
            "pass C",
        )?;

        program_b.set_aa(config.aa);
        program_c.set_flip_y(true);

        let buffer_a = PingPong::new(rctx.device, rctx.size, "buffer A");
        let buffer_b = Framebuffer::new(rctx.device, rctx.size, "buffer B");
        let [channels_a, channels_b, channels_c] =
            bind_channels(rctx.device, &layout, &buffer_a, &buffer_b, &font);

        let mut chain = Self {
            layout,
            quad,
            font,
            buffer_a,
            buffer_b,
            program_a,
            program_b,
            program_c,
            channels_a,
            channels_b,
            channels_c,
        };
        chain.set_resolution(rctx.size);
        log::info!("offscreen targets {}x{}", rctx.size.width, rctx.size.height);
        Ok(chain)
    }

    fn size(&self) -> PhysicalSize<u32> {
        self.buffer_b.size()
    }

    /// Recreates the offscreen targets at `size`. Their contents start at zero.
    fn resize(&mut self, device: &wgpu::Device, size: PhysicalSize<u32>) {
        self.buffer_a = PingPong::new(device, size, "buffer A");
        self.buffer_b = Framebuffer::new(device, size, "buffer B");
        [self.channels_a, self.channels_b, self.channels_c] = bind_channels(
            device,
            &self.layout,
            &self.buffer_a,
            &self.buffer_b,
            &self.font,
        );
        self.set_resolution(size);
        log::info!("offscreen targets resized to {}x{}", size.width, size.height);
    }

    fn programs_mut(&mut self) -> [&mut ShaderProgram; 3] {
        [&mut self.program_a, &mut self.program_b, &mut self.program_c]
    }

    fn set_resolution(&mut self, size: PhysicalSize<u32>) {
        for program in self.programs_mut() {
            program.set_resolution(size.width as f32, size.height as f32);
        }
    }

    fn set_mouse(&mut self, mouse: [f32; 4]) {
        for program in self.programs_mut() {
            program.set_mouse(mouse);
        }
    }

    fn set_time(&mut self, time: f32) {
        for program in self.programs_mut() {
            program.set_time(time);
        }
    }

    /// Records A -> B -> C. `target` is the surface.
    fn draw(&mut self, rctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>) {
        let f = self.buffer_a.front_index();

        {
            let mut a = target.redirect(self.buffer_a.front().view());
            self.program_a
                .draw(rctx, &mut a, &self.channels_a[f], &self.quad);
        }
        {
            let mut b = target.redirect(self.buffer_b.view());
            self.program_b
                .draw(rctx, &mut b, &self.channels_b[f], &self.quad);
        }
        self.program_c
            .draw(rctx, target, &self.channels_c[f], &self.quad);
    }
}

/// Per-parity channel bind groups for passes A, B and C.
fn bind_channels(
    device: &wgpu::Device,
    layout: &PassLayout,
    buffer_a: &PingPong,
    buffer_b: &Framebuffer,
    font: &Texture,
) -> [[wgpu::BindGroup; 2]; 3] {
    let pass_a = move |f: usize| ChannelViews {
        channel0: Some(buffer_a.get(channel0_index(Pass::A, f)).view()),
        ..Default::default()
    };
    let pass_b = move |f: usize| ChannelViews {
        channel0: Some(buffer_a.get(channel0_index(Pass::B, f)).view()),
        ..Default::default()
    };
    let pass_c = move |f: usize| ChannelViews {
        channel0: Some(buffer_a.get(channel0_index(Pass::C, f)).view()),
        channel1: Some(buffer_b.view()),
        texture: Some(font.view()),
    };

    [
        bind_pair(device, layout, "pass A", [pass_a(0), pass_a(1)]),
        bind_pair(device, layout, "pass B", [pass_b(0), pass_b(1)]),
        bind_pair(device, layout, "pass C", [pass_c(0), pass_c(1)]),
    ]
}

fn bind_pair(
    device: &wgpu::Device,
    layout: &PassLayout,
    pass: &str,
    views: [ChannelViews<'_>; 2],
) -> [wgpu::BindGroup; 2] {
    let [even, odd] = views;
    [
        layout.bind_channels(device, even, &format!("{pass} channels #0")),
        layout.bind_channels(device, odd, &format!("{pass} channels #1")),
    ]
}

pub struct Wythoff {
    config: ExplorerConfig,
    chain: Option<PassChain>,
    mouse: MouseTracker,
    state: FrameState,
    last_report: f32,
    frames_since_report: u32,
}

impl Wythoff {
    pub fn new(config: ExplorerConfig) -> Self {
        Self {
            config,
            chain: None,
            mouse: MouseTracker::default(),
            state: FrameState::default(),
            last_report: 0.0,
            frames_since_report: 0,
        }
    }

    fn save_capture(&self, capture: Result<RgbaImage>) {
        let path = &self.config.screenshot;
        match capture.and_then(|image| capture::save_png(&image, path)) {
            Ok(()) => log::info!("saved screenshot to {}", path.display()),
            Err(e) => log::error!("screenshot failed: {e:#}"),
        }
    }

    fn report(&mut self, time: &FrameTime) {
        self.frames_since_report += 1;
        let span = time.elapsed - self.last_report;
        if span < 1.0 {
            return;
        }

        log::debug!(
            "t={:.2} frame={} fps={:.1} mouse={:?}",
            time.time,
            self.state.frame,
            self.frames_since_report as f32 / span,
            self.mouse.value
        );
        self.last_report = time.elapsed;
        self.frames_since_report = 0;
    }
}

impl App for Wythoff {
    fn on_init(&mut self, ctx: &mut InitCtx<'_, '_>) -> Result<()> {
        let chain = PassChain::new(&ctx.render_ctx(), &self.config)?;
        self.chain = Some(chain);
        Ok(())
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> Result<AppControl> {
        if ctx.input_frame.key_pressed(Key::Escape) {
            log::info!("escape pressed, exiting");
            return Ok(AppControl::Exit);
        }
        if ctx.input_frame.key_pressed(Key::Enter) {
            self.state.capture_pending = true;
        }

        let Some(chain) = self.chain.as_mut() else {
            return Ok(AppControl::Continue);
        };

        let size = ctx.gpu.size();
        let action = self.state.apply_size(chain.size(), size);
        if action == SizeAction::Resize {
            chain.resize(ctx.gpu.device(), size);
        }

        let height = chain.size().height as f32;
        let mut mouse_changed = false;
        for event in &ctx.input_frame.events {
            mouse_changed |= self.mouse.apply(event, height);
        }
        if mouse_changed {
            chain.set_mouse(self.mouse.value);
        }

        if action == SizeAction::Minimized {
            if self.state.capture_pending {
                log::debug!("window minimized, screenshot deferred");
            }
            return Ok(AppControl::Continue);
        }

        chain.set_time(ctx.time.time);
        chain.program_a.set_frame(self.state.frame);

        let status = ctx.render(
            Color::transparent(),
            self.state.capture_pending,
            |rctx, target| chain.draw(rctx, target),
        );

        match status {
            FrameStatus::Presented { capture } => {
                chain.buffer_a.flip();
                self.state.presented();
                if let Some(capture) = capture {
                    self.save_capture(capture);
                }
            }
            FrameStatus::Skipped if self.state.capture_pending => {
                log::debug!("frame skipped, screenshot deferred to the next frame");
            }
            FrameStatus::Skipped => log::trace!("frame skipped"),
            FrameStatus::Fatal => bail!("surface lost and could not be reconfigured"),
        }

        self.report(&ctx.time);
        Ok(AppControl::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use wythoff_engine::input::{Modifiers, MouseButton, PointerButtonEvent, PointerMoveEvent};
    use wythoff_engine::render::glsl;

    fn button(state: MouseButtonState, x: f32, y: f32) -> InputEvent {
        InputEvent::PointerButton(PointerButtonEvent {
            button: MouseButton::Left,
            state,
            x,
            y,
            modifiers: Modifiers::default(),
        })
    }

    fn moved(x: f32, y: f32) -> InputEvent {
        InputEvent::PointerMoved(PointerMoveEvent { x, y })
    }

    #[test]
    fn press_flips_to_bottom_left_origin() {
        let mut mouse = MouseTracker::default();
        assert!(mouse.apply(&button(MouseButtonState::Pressed, 100.0, 30.0), 480.0));
        assert_eq!(mouse.value, [100.0, 450.0, 100.0, 30.0]);
    }

    #[test]
    fn drag_moves_xy_and_keeps_press_position() {
        let mut mouse = MouseTracker::default();
        mouse.apply(&button(MouseButtonState::Pressed, 100.0, 30.0), 480.0);
        assert!(mouse.apply(&moved(120.0, 80.0), 480.0));
        assert_eq!(mouse.value, [120.0, 400.0, 100.0, 30.0]);
    }

    #[test]
    fn motion_without_button_is_ignored() {
        let mut mouse = MouseTracker::default();
        assert!(!mouse.apply(&moved(120.0, 80.0), 480.0));
        assert_eq!(mouse.value, [0.0; 4]);
    }

    #[test]
    fn release_zeroes() {
        let mut mouse = MouseTracker::default();
        mouse.apply(&button(MouseButtonState::Pressed, 10.0, 10.0), 480.0);
        assert!(mouse.apply(&button(MouseButtonState::Released, 12.0, 12.0), 480.0));
        assert_eq!(mouse.value, [0.0; 4]);
        assert!(!mouse.apply(&moved(50.0, 50.0), 480.0));
    }

    #[test]
    fn focus_loss_releases() {
        let mut mouse = MouseTracker::default();
        mouse.apply(&button(MouseButtonState::Pressed, 10.0, 10.0), 480.0);
        assert!(mouse.apply(&InputEvent::Focused(false), 480.0));
        assert_eq!(mouse.value, [0.0; 4]);
    }

    #[test]
    fn pass_a_reads_the_other_slot_for_both_parities() {
        assert_eq!(channel0_index(Pass::A, 0), 1);
        assert_eq!(channel0_index(Pass::A, 1), 0);
    }

    #[test]
    fn passes_b_and_c_read_the_slot_just_written() {
        for front in [0, 1] {
            assert_eq!(channel0_index(Pass::B, front), front);
            assert_eq!(channel0_index(Pass::C, front), front);
        }
    }

    #[test]
    fn pass_a_reads_its_previous_output_after_flip() {
        for written in [0, 1] {
            let front = written ^ 1;
            assert_eq!(channel0_index(Pass::A, front), written);
        }
    }

    fn size(width: u32, height: u32) -> PhysicalSize<u32> {
        PhysicalSize::new(width, height)
    }

    #[test]
    fn zero_area_sizes_are_minimized() {
        let current = size(640, 480);
        assert_eq!(size_action(current, size(0, 0)), SizeAction::Minimized);
        assert_eq!(size_action(current, size(640, 0)), SizeAction::Minimized);
        assert_eq!(size_action(current, size(0, 480)), SizeAction::Minimized);
        assert_eq!(size_action(current, current), SizeAction::Unchanged);
        assert_eq!(size_action(current, size(800, 480)), SizeAction::Resize);
    }

    #[test]
    fn frame_resets_only_on_real_resize() {
        let current = size(640, 480);
        let mut state = FrameState { frame: 42, capture_pending: false };

        state.apply_size(current, current);
        assert_eq!(state.frame, 42);

        state.apply_size(current, size(0, 0));
        assert_eq!(state.frame, 42);

        // Restoring to the previous size keeps the targets.
        state.apply_size(current, current);
        assert_eq!(state.frame, 42);

        state.apply_size(current, size(800, 600));
        assert_eq!(state.frame, 0);
    }

    #[test]
    fn capture_stays_pending_until_presented() {
        let mut state = FrameState { frame: 3, capture_pending: true };

        // Skipped or minimized frames leave the request in place.
        state.apply_size(size(640, 480), size(0, 0));
        assert!(state.capture_pending);

        state.presented();
        assert!(!state.capture_pending);
        assert_eq!(state.frame, 4);
    }

    #[test]
    fn frame_counter_wraps() {
        let mut state = FrameState { frame: i32::MAX, capture_pending: false };
        state.presented();
        assert_eq!(state.frame, i32::MIN);
    }

    #[test]
    fn bundled_shaders_validate() {
        let dir = Path::new(crate::cli::BUNDLED_SHADER_DIR);
        for pass in ["BufferA.frag", "BufferB.frag", "main.frag"] {
            let source = ProgramSource::load(dir, VERTEX_SOURCE, &[COMMON_SOURCE, pass]).unwrap();
            if let Err(e) = glsl::validate(&glsl::assemble_vertex(&source.vertex)) {
                panic!("{e}");
            }
            if let Err(e) = glsl::validate(&glsl::assemble_fragment(&source.fragment)) {
                panic!("{e}");
            }
        }
    }
}
