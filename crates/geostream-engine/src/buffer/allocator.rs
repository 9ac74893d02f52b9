use anyhow::Result;

/// GPU buffer boundary consumed by [`DynamicBuffer`](super::DynamicBuffer).
///
/// Implementations own no bookkeeping of their own; the handle is the only
/// state, and dropping it must free the GPU allocation.
pub trait BufferAllocator {
    /// Backend buffer object.
    type Handle;

    /// Allocates a buffer able to hold at least `size` bytes.
    fn allocate(&self, label: &str, usage: wgpu::BufferUsages, size: u64) -> Result<Self::Handle>;

    /// Writes `bytes` at `offset`. The range must lie within the allocation.
    fn write(&self, handle: &Self::Handle, offset: u64, bytes: &[u8]) -> Result<()>;

    /// Size of the backing allocation in bytes.
    ///
    /// May exceed the size requested from `allocate` when the backend pads
    /// allocations.
    fn capacity(&self, handle: &Self::Handle) -> u64;

    /// Frees the allocation immediately instead of waiting for the handle to drop.
    fn release(&self, handle: Self::Handle);
}
