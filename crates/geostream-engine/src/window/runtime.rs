use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{App, AppControl, FrameCtx, WindowCtx};
use crate::device::{Gpu, GpuInit};
use crate::time::FrameClock;

/// Settings for the runtime's window.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    /// Requested inner size in logical pixels.
    pub initial_size: LogicalSize<f64>,
    pub resizable: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "geostream".to_string(),
            initial_size: LogicalSize::new(800.0, 600.0),
            resizable: true,
        }
    }
}

/// Requests an app can make from inside `on_frame`.
///
/// They are queued and carried out once the callback has returned.
#[derive(Debug, Default)]
pub struct RuntimeCtx {
    requests: Vec<Request>,
}

impl RuntimeCtx {
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.requests.push(Request::SetTitle(title.into()));
    }

    pub fn exit(&mut self) {
        self.requests.push(Request::Exit);
    }
}

#[derive(Debug)]
enum Request {
    SetTitle(String),
    Exit,
}

/// Single-window event loop host.
pub struct Runtime;

impl Runtime {
    /// Opens the window, then drives `app` until it asks to exit or the window
    /// is closed. Window or GPU setup failures are returned.
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<()>
    where
        A: App + 'static,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut host = Host {
            config,
            gpu_init,
            app,
            slot: None,
            failure: None,
        };

        event_loop
            .run_app(&mut host)
            .context("winit event loop terminated with error")?;

        match host.failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

// `Gpu` borrows the window for its surface, so both live in one allocation.
#[self_referencing]
struct WindowSlot {
    clock: FrameClock,
    window: Window,
    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

struct Host<A> {
    config: RuntimeConfig,
    gpu_init: GpuInit,
    app: A,
    slot: Option<WindowSlot>,
    failure: Option<anyhow::Error>,
}

impl<A: App> Host<A> {
    fn open(&self, event_loop: &ActiveEventLoop) -> Result<WindowSlot> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size)
            .with_resizable(self.config.resizable);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;
        log::info!("window {:?} opened", window.id());

        let gpu_init = self.gpu_init.clone();
        WindowSlotTryBuilder {
            clock: FrameClock::new(),
            window,
            gpu_builder: |window| pollster::block_on(Gpu::new(window, gpu_init)),
        }
        .try_build()
        .context("GPU initialization failed")
    }

    fn shut_down(&mut self, event_loop: &ActiveEventLoop) {
        if self.slot.take().is_some() {
            log::info!("window closed");
        }
        event_loop.exit();
    }

    fn resize(&mut self, size: Option<PhysicalSize<u32>>) {
        let Some(slot) = self.slot.as_mut() else { return };
        let size = size.unwrap_or_else(|| slot.with_window(|w| w.inner_size()));
        slot.with_gpu_mut(|gpu| gpu.resize(size));
        slot.with_window(|w| w.request_redraw());
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop, id: WindowId) {
        let Some(slot) = self.slot.as_mut() else { return };

        let mut runtime = RuntimeCtx::default();
        let app = &mut self.app;
        let control = slot.with_mut(|fields| {
            // A minimized window has a 0x0 surface.
            let size = fields.gpu.size();
            if size.width == 0 || size.height == 0 {
                return AppControl::Continue;
            }

            let mut ctx = FrameCtx {
                window: WindowCtx {
                    id,
                    window: fields.window,
                },
                gpu: fields.gpu,
                time: fields.clock.tick(),
                runtime: &mut runtime,
            };
            app.on_frame(&mut ctx)
        });

        if control == AppControl::Exit {
            runtime.exit();
        }

        for request in runtime.requests {
            match request {
                Request::SetTitle(title) => {
                    if let Some(slot) = &self.slot {
                        slot.with_window(|w| w.set_title(&title));
                    }
                }
                Request::Exit => {
                    self.shut_down(event_loop);
                    return;
                }
            }
        }
    }
}

impl<A: App> ApplicationHandler for Host<A> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.slot.is_some() {
            return;
        }

        match self.open(event_loop) {
            Ok(slot) => {
                slot.with_window(|w| w.request_redraw());
                self.slot = Some(slot);
            }
            Err(err) => {
                log::error!("{err:#}");
                self.failure = Some(err);
                event_loop.exit();
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        // Every demo animates, so a new frame is requested as soon as the
        // queue drains.
        event_loop.set_control_flow(ControlFlow::Wait);
        if let Some(slot) = &self.slot {
            slot.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        if self.slot.is_none() {
            return;
        }

        if self.app.on_window_event(id, &event) == AppControl::Exit {
            self.shut_down(event_loop);
            return;
        }

        match event {
            WindowEvent::CloseRequested => self.shut_down(event_loop),
            WindowEvent::Resized(size) => self.resize(Some(size)),
            WindowEvent::ScaleFactorChanged { .. } => self.resize(None),
            WindowEvent::RedrawRequested => self.redraw(event_loop, id),
            _ => {}
        }
    }
}
