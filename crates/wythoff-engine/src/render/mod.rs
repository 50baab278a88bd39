//! GPU rendering subsystem.
//!
//! Every pass is a full-screen quad drawn with a [`ShaderProgram`]. Programs
//! read up to three textures through the slots described in [`channels`] and
//! write either an offscreen [`Framebuffer`] or the window surface.
//!
//! Convention:
//! - Shaders see `fragCoord` in physical pixels with a bottom-left origin.
//! - Offscreen targets store rows in rasterizer order; the surface pass flips.

pub mod capture;
pub mod channels;
mod ctx;
pub mod framebuffer;
pub mod glsl;
mod program;
mod quad;
pub mod texture;
pub mod uniforms;

pub use capture::{Readback, RgbaImage};
pub use channels::{ChannelViews, PassLayout};
pub use ctx::{RenderCtx, RenderTarget};
pub use framebuffer::{Framebuffer, PingPong};
pub use glsl::{ProgramSource, ShaderError, SourceFile};
pub use program::ShaderProgram;
pub use quad::FullscreenQuad;
pub use texture::Texture;
pub use uniforms::{Globals, UniformError, UniformValue};
