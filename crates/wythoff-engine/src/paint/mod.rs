//! Color values used for clears.

mod color;

pub use color::Color;
