use winit::event::WindowEvent;
use winit::window::WindowId;

use super::ctx::FrameCtx;

/// Whether the runtime should keep running after a callback.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Implemented by whatever the runtime drives (the demos, tests, tools).
///
/// Callbacks run on the event-loop thread, one at a time. All buffer uploads
/// and draws for a frame happen inside `on_frame`.
pub trait App {
    /// Sees every window event before the runtime reacts to it.
    fn on_window_event(&mut self, window_id: WindowId, event: &WindowEvent) -> AppControl {
        let _ = (window_id, event);
        AppControl::Continue
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;
}
