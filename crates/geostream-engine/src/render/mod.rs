//! GPU rendering subsystem.
//!
//! Draw helpers are built from a [`Mesh`] (attribute streams kept in sync with
//! the GPU by `buffer::DynamicBuffer`) and a [`Program`] (WGSL + pipeline).
//! Each helper owns its GPU resources; dropping it frees them.
//!
//! Convention:
//! - geometry is uploaded in clip space; programs may apply `WindowBlock`
//! - no depth testing; draws composite in submission order

mod ctx;
mod mesh;
mod program;
mod target;
mod texture;
mod uniform;

pub use ctx::{RenderCtx, RenderTarget};
pub use mesh::{DrawCall, DrawCount, Mesh, MeshBuilder, StreamLayout};
pub use program::{Program, ProgramDesc};
pub use target::OffscreenTarget;
pub use texture::{
    checkerboard_pixels, gradient_pixels, sampled_bind_group, sampled_layout, Texture,
};
pub use uniform::{UniformBlock, WindowBlock};
