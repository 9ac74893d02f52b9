use anyhow::{ensure, Context, Result};
use bytemuck::Pod;

use super::{BufferAllocator, SizePolicy};

/// What an [`DynamicBuffer::update`] did with the backing allocation.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Upload {
    /// Data was written into the existing allocation.
    Reused,
    /// The previous allocation (if any) was released and replaced.
    Orphaned { previous: u64, capacity: u64 },
}

impl Upload {
    #[inline]
    pub fn orphaned(self) -> bool {
        matches!(self, Upload::Orphaned { .. })
    }
}

/// GPU-resident copy of one attribute stream whose length may change per frame.
///
/// Capacity is tracked in bytes as requested by the policy, independent of any
/// padding the allocator applies. After every successful `update` the first
/// `byte_len()` bytes of the allocation hold exactly the last data written.
pub struct DynamicBuffer<H> {
    label: String,
    usage: wgpu::BufferUsages,
    policy: SizePolicy,
    element_size: u64,

    handle: Option<H>,
    capacity: u64,
    len: usize,
}

impl<H> DynamicBuffer<H> {
    /// Creates an unallocated stream; the first `update` allocates.
    pub fn new(
        label: impl Into<String>,
        usage: wgpu::BufferUsages,
        policy: SizePolicy,
        element_size: u64,
    ) -> Self {
        debug_assert!(element_size > 0, "zero-sized stream elements");
        Self {
            label: label.into(),
            usage,
            policy,
            element_size,
            handle: None,
            capacity: 0,
            len: 0,
        }
    }

    /// Uploads `data`, orphaning the allocation first if the policy requires it.
    ///
    /// `T` must have the element size this stream was created with.
    pub fn update<A, T>(&mut self, alloc: &A, data: &[T]) -> Result<Upload>
    where
        A: BufferAllocator<Handle = H>,
        T: Pod,
    {
        let width = std::mem::size_of::<T>() as u64;
        ensure!(
            width == self.element_size,
            "stream `{}` holds {}-byte elements, got {width}-byte elements",
            self.label,
            self.element_size
        );

        let bytes: &[u8] = bytemuck::cast_slice(data);
        let required = bytes.len() as u64;

        let upload = if self.handle.is_none() || self.policy.needs_orphan(self.capacity, required) {
            self.orphan(alloc, required)?
        } else {
            Upload::Reused
        };

        let handle = self
            .handle
            .as_ref()
            .with_context(|| format!("stream `{}` has no allocation", self.label))?;
        debug_assert!(alloc.capacity(handle) >= required);

        alloc
            .write(handle, 0, bytes)
            .with_context(|| format!("failed to write stream `{}`", self.label))?;

        self.len = data.len();
        Ok(upload)
    }

    fn orphan<A>(&mut self, alloc: &A, required: u64) -> Result<Upload>
    where
        A: BufferAllocator<Handle = H>,
    {
        let previous = self.capacity;
        let capacity = self.policy.orphan_capacity(required);

        if let Some(old) = self.handle.take() {
            alloc.release(old);
        }
        self.capacity = 0;
        self.len = 0;

        let handle = alloc
            .allocate(&self.label, self.usage, capacity)
            .with_context(|| format!("failed to allocate stream `{}`", self.label))?;

        log::debug!(
            "orphaned `{}`: {previous} -> {capacity} bytes ({:?})",
            self.label,
            self.policy
        );

        self.handle = Some(handle);
        self.capacity = capacity;
        Ok(Upload::Orphaned { previous, capacity })
    }

    /// Frees the allocation. The next `update` allocates again.
    pub fn release<A>(&mut self, alloc: &A)
    where
        A: BufferAllocator<Handle = H>,
    {
        if let Some(handle) = self.handle.take() {
            alloc.release(handle);
        }
        self.capacity = 0;
        self.len = 0;
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn policy(&self) -> SizePolicy {
        self.policy
    }

    pub fn element_size(&self) -> u64 {
        self.element_size
    }

    /// Byte capacity of the current allocation (0 when unallocated).
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Number of elements written by the last `update`.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of bytes written by the last `update`.
    pub fn byte_len(&self) -> u64 {
        self.len as u64 * self.element_size
    }

    pub fn handle(&self) -> Option<&H> {
        self.handle.as_ref()
    }
}
