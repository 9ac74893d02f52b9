//! Geostream engine crate.
//!
//! Dynamic GPU buffers with pluggable sizing policies, the meshes and programs
//! built on them, and the window/GPU runtime the demos run in.

pub mod buffer;
pub mod core;
pub mod device;
pub mod logging;
pub mod paint;
pub mod render;
pub mod time;
pub mod window;
