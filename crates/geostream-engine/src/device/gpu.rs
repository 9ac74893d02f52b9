use anyhow::{ensure, Context, Result};
use winit::dpi::PhysicalSize;
use winit::window::Window;

use super::surface::SurfaceState;
use super::{GpuFrame, GpuInit, SurfaceErrorAction};
use crate::render::RenderCtx;

/// Device, queue and configured surface for one window.
///
/// `'w` is the window borrow held by the surface.
pub struct Gpu<'w> {
    surface: SurfaceState<'w>,
    device: wgpu::Device,
    queue: wgpu::Queue,
}

impl<'w> Gpu<'w> {
    /// Picks an adapter compatible with `window`, opens a device and
    /// configures the surface. Block on it with `pollster`.
    pub async fn new(window: &'w Window, init: GpuInit) -> Result<Self> {
        let size = window.inner_size();
        ensure!(size.width > 0 && size.height > 0, "window has zero size");

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .context("failed to create wgpu surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let info = adapter.get_info();
        log::info!("using adapter {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("geostream device"),
                required_features: init.required_features,
                required_limits: init.required_limits.clone(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        let surface = SurfaceState::configure(surface, &adapter, &device, size, &init)?;

        Ok(Self {
            surface,
            device,
            queue,
        })
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface.format()
    }

    /// Drawable size in physical pixels; may be 0x0 while minimized.
    pub fn size(&self) -> PhysicalSize<u32> {
        self.surface.size()
    }

    pub fn render_ctx(&self) -> RenderCtx<'_> {
        let size = self.size();
        RenderCtx::new(
            &self.device,
            &self.queue,
            self.surface_format(),
            size.width,
            size.height,
        )
    }

    pub fn resize(&mut self, size: PhysicalSize<u32>) {
        self.surface.resize(&self.device, size);
    }

    /// Acquires the next surface texture with a fresh encoder.
    pub fn begin_frame(&self) -> Result<GpuFrame, wgpu::SurfaceError> {
        let surface_texture = self.surface.acquire()?;
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("geostream frame encoder"),
            });

        Ok(GpuFrame {
            surface_texture,
            view,
            encoder,
        })
    }

    /// Submits the frame's commands and presents it.
    pub fn submit(&self, frame: GpuFrame) {
        let GpuFrame {
            surface_texture,
            view,
            encoder,
        } = frame;
        self.queue.submit([encoder.finish()]);
        // The view must not outlive the texture it presents.
        drop(view);
        surface_texture.present();
    }

    pub fn handle_surface_error(&self, err: wgpu::SurfaceError) -> SurfaceErrorAction {
        self.surface.recover(&self.device, err)
    }
}
