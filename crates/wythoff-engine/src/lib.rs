//! Wythoff engine crate.
//!
//! Platform + GPU runtime for multi-pass full-screen shader programs: the
//! window loop, the wgpu device, GLSL program assembly, offscreen targets and
//! frame capture.

pub mod core;
pub mod device;
pub mod input;
pub mod time;
pub mod window;

pub mod logging;
pub mod paint;
pub mod render;
