use std::marker::PhantomData;

use bytemuck::Pod;
use wgpu::util::DeviceExt;

/// A uniform buffer holding one `T`, with its own bind group at binding 0.
///
/// `T` must follow WGSL uniform layout rules (16-byte aligned members such as
/// `vec4<f32>` / `mat4x4<f32>`, explicit padding elsewhere).
pub struct UniformBlock<T> {
    buffer: wgpu::Buffer,
    layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
    _marker: PhantomData<T>,
}

impl<T: Pod> UniformBlock<T> {
    pub fn new(device: &wgpu::Device, label: &str, visibility: wgpu::ShaderStages, value: &T) -> Self {
        let size = std::mem::size_of::<T>() as u64;
        debug_assert!(size > 0 && size % 16 == 0, "uniform `{label}` is {size} bytes");

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::bytes_of(value),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(label),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(size),
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });

        Self {
            buffer,
            layout,
            bind_group,
            _marker: PhantomData,
        }
    }

    /// Overwrites the block. Takes effect for draws submitted after this call.
    pub fn write(&self, queue: &wgpu::Queue, value: &T) {
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(value));
    }

    pub fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

/// Projection/view pair shared by every program as bind group 0.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct WindowBlock {
    pub projection: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
}

impl WindowBlock {
    pub const IDENTITY: [[f32; 4]; 4] = [
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ];

    /// Aspect-correcting projection: the shorter axis spans [-1, 1].
    pub fn for_aspect(aspect: f32) -> Self {
        let mut projection = Self::IDENTITY;
        if aspect >= 1.0 {
            projection[0][0] = 1.0 / aspect;
        } else if aspect > 0.0 {
            projection[1][1] = aspect;
        }
        Self {
            projection,
            view: Self::IDENTITY,
        }
    }
}

impl Default for WindowBlock {
    fn default() -> Self {
        Self {
            projection: Self::IDENTITY,
            view: Self::IDENTITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_block_matches_wgsl_layout() {
        assert_eq!(std::mem::size_of::<WindowBlock>(), 128);
    }

    #[test]
    fn wide_aspect_compresses_x() {
        let w = WindowBlock::for_aspect(2.0);
        assert_eq!(w.projection[0][0], 0.5);
        assert_eq!(w.projection[1][1], 1.0);
        assert_eq!(w.view, WindowBlock::IDENTITY);
    }

    #[test]
    fn tall_aspect_compresses_y() {
        let w = WindowBlock::for_aspect(0.5);
        assert_eq!(w.projection[0][0], 1.0);
        assert_eq!(w.projection[1][1], 0.5);
    }

    #[test]
    fn degenerate_aspect_is_identity() {
        assert_eq!(WindowBlock::for_aspect(0.0), WindowBlock::default());
    }
}
