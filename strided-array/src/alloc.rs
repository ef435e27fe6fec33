//! Storage allocation seam.

use std::alloc::Layout as AllocLayout;
use std::fmt;
use std::ptr::NonNull;
use std::sync::Arc;

use crate::{ArrayError, Result};

/// Memory provider for array data and mask storage.
///
/// # Safety
///
/// Implementors must ensure that:
/// - `allocate` returns a valid pointer aligned to `layout.align()` on success
/// - `deallocate` is called with the same `AllocLayout` used in `allocate`
/// - The returned memory is not aliased
pub unsafe trait Allocator: Send + Sync + fmt::Debug {
    /// Allocates memory with the given layout. Returns `None` on failure.
    fn allocate(&self, layout: AllocLayout) -> Option<NonNull<u8>>;

    /// Deallocates memory previously returned by `allocate`.
    ///
    /// # Safety
    ///
    /// - `ptr` must have been returned by a previous call to `allocate`
    /// - `layout` must be the same as the one used for allocation
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: AllocLayout);
}

/// The process global allocator.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemAllocator;

unsafe impl Allocator for SystemAllocator {
    #[inline]
    fn allocate(&self, layout: AllocLayout) -> Option<NonNull<u8>> {
        if layout.size() == 0 {
            return Some(dangling(layout.align()));
        }
        NonNull::new(unsafe { std::alloc::alloc(layout) })
    }

    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: AllocLayout) {
        if layout.size() != 0 {
            std::alloc::dealloc(ptr.as_ptr(), layout);
        }
    }
}

/// Aligned non-null pointer for zero-size allocations.
#[inline]
fn dangling(align: usize) -> NonNull<u8> {
    NonNull::new(align as *mut u8).unwrap_or(NonNull::dangling())
}

// ============================================================================
// Buffer
// ============================================================================

/// Zero-initialised storage returned to its allocator on drop.
pub(crate) struct Buffer {
    ptr: NonNull<u8>,
    layout: AllocLayout,
    allocator: Arc<dyn Allocator>,
}

impl Buffer {
    pub(crate) fn zeroed(allocator: &Arc<dyn Allocator>, bytes: usize, align: usize) -> Result<Self> {
        let layout = AllocLayout::from_size_align(bytes, align.max(1).next_power_of_two())
            .map_err(|_| ArrayError::Construction(format!("array of {bytes} bytes is too big")))?;
        let ptr = allocator
            .allocate(layout)
            .ok_or(ArrayError::OutOfMemory { bytes })?;
        if bytes != 0 {
            unsafe { std::ptr::write_bytes(ptr.as_ptr(), 0, bytes) };
        }
        tracing::trace!(bytes, align = layout.align(), "allocated buffer");
        Ok(Self {
            ptr,
            layout,
            allocator: Arc::clone(allocator),
        })
    }

    #[inline]
    pub(crate) fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.layout.size()
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        unsafe { self.allocator.deallocate(self.ptr, self.layout) };
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("ptr", &self.ptr)
            .field("bytes", &self.layout.size())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeroed_buffer() {
        let alloc: Arc<dyn Allocator> = Arc::new(SystemAllocator);
        let buf = Buffer::zeroed(&alloc, 64, 8).unwrap();
        assert_eq!(buf.len(), 64);
        assert_eq!(buf.as_ptr() as usize % 8, 0);
        let bytes = unsafe { std::slice::from_raw_parts(buf.as_ptr(), 64) };
        assert!(bytes.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_zero_size_buffer() {
        let alloc: Arc<dyn Allocator> = Arc::new(SystemAllocator);
        let buf = Buffer::zeroed(&alloc, 0, 16).unwrap();
        assert_eq!(buf.len(), 0);
        assert_eq!(buf.as_ptr() as usize % 16, 0);
    }
}
