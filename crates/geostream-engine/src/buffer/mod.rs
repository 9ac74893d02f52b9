//! Dynamic geometry buffers.
//!
//! A [`DynamicBuffer`] keeps one CPU-side attribute stream (positions, colors,
//! UVs or indices) in sync with a GPU allocation whose size may change from
//! frame to frame. Whether a size change reallocates ("orphans") the buffer is
//! decided by its [`SizePolicy`]:
//!
//! - `ExactFit` for index streams and any stream that sets a draw count
//! - `GrowOnly` / `Geometric` for plain attribute streams
//!
//! The GPU side is reached only through [`BufferAllocator`], so the policy can
//! be exercised without a device.

mod allocator;
mod dynamic;
mod gpu;
mod policy;

#[cfg(test)]
pub(crate) mod testing;

pub use allocator::BufferAllocator;
pub use dynamic::{DynamicBuffer, Upload};
pub use gpu::WgpuAllocator;
pub use policy::SizePolicy;
