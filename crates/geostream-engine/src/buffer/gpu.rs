use anyhow::{ensure, Result};

use super::BufferAllocator;

/// [`BufferAllocator`] backed by a wgpu device and queue.
///
/// Allocations are padded to `wgpu::COPY_BUFFER_ALIGNMENT` so that
/// `queue.write_buffer` can be used for streams whose byte size is not a
/// multiple of four (e.g. a single `Unorm8x2` element).
#[derive(Copy, Clone)]
pub struct WgpuAllocator<'a> {
    device: &'a wgpu::Device,
    queue: &'a wgpu::Queue,
}

impl<'a> WgpuAllocator<'a> {
    #[inline]
    pub fn new(device: &'a wgpu::Device, queue: &'a wgpu::Queue) -> Self {
        Self { device, queue }
    }
}

impl BufferAllocator for WgpuAllocator<'_> {
    type Handle = wgpu::Buffer;

    fn allocate(&self, label: &str, usage: wgpu::BufferUsages, size: u64) -> Result<wgpu::Buffer> {
        let max = self.device.limits().max_buffer_size;
        ensure!(
            size <= max,
            "buffer `{label}` needs {size} bytes, device limit is {max}"
        );

        Ok(self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: padded_size(size),
            usage: usage | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }))
    }

    fn write(&self, handle: &wgpu::Buffer, offset: u64, bytes: &[u8]) -> Result<()> {
        if bytes.is_empty() {
            return Ok(());
        }
        ensure!(
            offset % wgpu::COPY_BUFFER_ALIGNMENT == 0,
            "write offset {offset} is not aligned to {}",
            wgpu::COPY_BUFFER_ALIGNMENT
        );
        ensure!(
            offset + padded_size(bytes.len() as u64) <= handle.size(),
            "write of {} bytes at {offset} overflows a {}-byte buffer",
            bytes.len(),
            handle.size()
        );

        if bytes.len() as u64 % wgpu::COPY_BUFFER_ALIGNMENT == 0 {
            self.queue.write_buffer(handle, offset, bytes);
        } else {
            let mut padded = bytes.to_vec();
            padded.resize(padded_size(bytes.len() as u64) as usize, 0);
            self.queue.write_buffer(handle, offset, &padded);
        }
        Ok(())
    }

    fn capacity(&self, handle: &wgpu::Buffer) -> u64 {
        handle.size()
    }

    fn release(&self, handle: wgpu::Buffer) {
        handle.destroy();
    }
}

/// Rounds `size` up to the copy alignment, never below one alignment unit.
fn padded_size(size: u64) -> u64 {
    let align = wgpu::COPY_BUFFER_ALIGNMENT;
    size.max(1).div_ceil(align) * align
}

#[cfg(test)]
mod tests {
    use super::padded_size;

    #[test]
    fn padded_size_rounds_to_copy_alignment() {
        assert_eq!(padded_size(0), 4);
        assert_eq!(padded_size(1), 4);
        assert_eq!(padded_size(4), 4);
        assert_eq!(padded_size(6), 8);
        assert_eq!(padded_size(32), 32);
    }
}
