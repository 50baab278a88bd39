use anyhow::Result;
use winit::event::WindowEvent;

use super::ctx::{FrameCtx, InitCtx};

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract implemented by higher layers.
///
/// Errors returned from `on_init` or `on_frame` stop the event loop and are
/// handed back to the caller of [`crate::window::Runtime::run`].
pub trait App {
    /// Called once after the window and GPU context exist, before the window
    /// is shown. Create pipelines and textures here.
    fn on_init(&mut self, ctx: &mut InitCtx<'_, '_>) -> Result<()> {
        let _ = ctx;
        Ok(())
    }

    /// Called for raw window events, before the runtime handles them.
    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        let _ = event;
        AppControl::Continue
    }

    /// Called once per rendered frame.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> Result<AppControl>;
}
