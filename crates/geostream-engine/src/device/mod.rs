//! GPU device + surface management.
//!
//! Creates the wgpu instance/adapter/device/queue for a window, configures its
//! surface, and hands out one encoder + view per frame.

mod frame;
mod gpu;
mod init;
mod surface;

pub use frame::GpuFrame;
pub use gpu::Gpu;
pub use init::GpuInit;
pub use surface::SurfaceErrorAction;
