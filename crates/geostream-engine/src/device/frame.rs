/// A single acquired surface frame.
///
/// Holding the surface texture blocks acquisition of the next frame, so the
/// frame is submitted (and dropped) within the same callback.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}
