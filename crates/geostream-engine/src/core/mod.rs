//! Core engine-facing contracts.
//!
//! The stable interface between the runtime (platform loop) and the code that
//! draws: an [`App`] receives window events and one [`FrameCtx`] per frame.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::{FrameCtx, WindowCtx};
