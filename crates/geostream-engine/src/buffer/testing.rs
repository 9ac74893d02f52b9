//! In-memory [`BufferAllocator`] for tests that must run without a GPU.

use std::cell::RefCell;

use anyhow::{bail, ensure, Result};
use bytemuck::Pod;

use super::BufferAllocator;

/// Records allocations in host memory. Handles are indices into a slot table;
/// released slots become `None`.
#[derive(Default)]
pub(crate) struct RecordingAllocator {
    slots: RefCell<Vec<Option<Vec<u8>>>>,
    limit: Option<u64>,
}

impl RecordingAllocator {
    /// Allocator that refuses allocations larger than `limit` bytes.
    pub(crate) fn with_limit(limit: u64) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    /// Total number of successful allocations.
    pub(crate) fn allocations(&self) -> usize {
        self.slots.borrow().len()
    }

    /// Allocations not yet released.
    pub(crate) fn live(&self) -> usize {
        self.slots.borrow().iter().filter(|s| s.is_some()).count()
    }

    pub(crate) fn size_of(&self, handle: &usize) -> u64 {
        self.slots.borrow()[*handle]
            .as_ref()
            .map_or(0, |bytes| bytes.len() as u64)
    }

    /// Reads the first `count` elements of a live allocation.
    pub(crate) fn read<T: Pod>(&self, handle: &usize, count: usize) -> Vec<T> {
        let slots = self.slots.borrow();
        let bytes = slots[*handle].as_ref().expect("read from released buffer");
        let n = count * std::mem::size_of::<T>();
        let mut out = vec![T::zeroed(); count];
        bytemuck::cast_slice_mut::<T, u8>(&mut out).copy_from_slice(&bytes[..n]);
        out
    }
}

impl BufferAllocator for RecordingAllocator {
    type Handle = usize;

    fn allocate(&self, label: &str, _usage: wgpu::BufferUsages, size: u64) -> Result<usize> {
        if let Some(limit) = self.limit {
            if size > limit {
                bail!("buffer `{label}` needs {size} bytes, limit is {limit}");
            }
        }
        let mut slots = self.slots.borrow_mut();
        slots.push(Some(vec![0; size as usize]));
        Ok(slots.len() - 1)
    }

    fn write(&self, handle: &usize, offset: u64, bytes: &[u8]) -> Result<()> {
        let mut slots = self.slots.borrow_mut();
        let Some(Some(dst)) = slots.get_mut(*handle) else {
            bail!("write to released buffer {handle}");
        };
        let start = offset as usize;
        ensure!(start + bytes.len() <= dst.len(), "write out of bounds");
        dst[start..start + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    fn capacity(&self, handle: &usize) -> u64 {
        self.size_of(handle)
    }

    fn release(&self, handle: usize) {
        if let Some(slot) = self.slots.borrow_mut().get_mut(handle) {
            *slot = None;
        }
    }
}
