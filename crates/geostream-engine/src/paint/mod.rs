//! Color representation shared by clear passes and uniform blocks.

pub mod color;

pub use color::Color;
