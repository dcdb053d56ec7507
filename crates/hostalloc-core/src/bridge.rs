//! Pass-through bridge from foreign allocation calls to a host allocator.
//!
//! Each operation is one synchronous forward to the host. The bridge keeps no
//! per-call state, takes no locks, and validates nothing; null results,
//! aborts, and invalid-pointer behavior are whatever the host defines.

use std::alloc::Layout;
use std::ffi::{CStr, c_void};
use std::ptr::NonNull;

use crate::config::{ALLOCATION_LABEL, Tagging};
use crate::error::AllocError;
use crate::host::HostAllocator;

/// Forwards allocate/reallocate/free to `H`, tagging allocations with a label.
#[derive(Debug)]
pub struct Bridge<H> {
    host: H,
    label: &'static CStr,
}

impl<H: HostAllocator> Bridge<H> {
    /// Bridge over `host` using the label compiled into this build.
    #[must_use]
    pub const fn new(host: H) -> Self {
        Self {
            host,
            label: ALLOCATION_LABEL,
        }
    }

    /// Bridge over `host` with an explicit tagging, independent of the build flag.
    #[must_use]
    pub const fn with_tagging(host: H, tagging: Tagging) -> Self {
        Self {
            host,
            label: tagging.label(),
        }
    }

    #[must_use]
    pub const fn host(&self) -> &H {
        &self.host
    }

    /// Label attached to every allocation made through this bridge.
    #[must_use]
    pub const fn label(&self) -> &'static CStr {
        self.label
    }

    /// Request `size` bytes of uninitialized memory from the host.
    ///
    /// Returns the host's result unchanged, including null on exhaustion.
    #[inline]
    #[must_use]
    pub fn allocate(&self, size: usize) -> *mut c_void {
        // SAFETY: the label is 'static, which satisfies every host's label contract.
        unsafe { self.host.alloc_static(size, self.label) }
    }

    /// Resize the block at `ptr` to `size` bytes via the host.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or a live block obtained from this bridge's host.
    /// On a non-null return the old address is invalidated.
    #[inline]
    pub unsafe fn reallocate(&self, ptr: *mut c_void, size: usize) -> *mut c_void {
        // SAFETY: forwarded caller contract.
        unsafe { self.host.realloc_static(ptr, size) }
    }

    /// Release the block at `ptr` back to the host.
    ///
    /// # Safety
    ///
    /// `ptr` must be a live block obtained from this bridge's host and must not
    /// be used afterwards.
    #[inline]
    pub unsafe fn free(&self, ptr: *mut c_void) {
        // SAFETY: forwarded caller contract.
        unsafe { self.host.free_static(ptr) }
    }

    /// Checked allocation for Rust callers: null becomes [`AllocError::OutOfMemory`].
    pub fn try_allocate(&self, size: usize) -> Result<NonNull<u8>, AllocError> {
        NonNull::new(self.allocate(size).cast::<u8>())
            .ok_or(AllocError::OutOfMemory { requested: size })
    }

    /// Allocate a block satisfying `layout`.
    ///
    /// A host block that misses the requested alignment is released before
    /// [`AllocError::Misaligned`] is returned, so no memory escapes.
    pub fn allocate_layout(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        let block = self.try_allocate(layout.size())?;
        let addr = block.as_ptr() as usize;
        if addr % layout.align() != 0 {
            // SAFETY: block was just obtained from this host and never exposed.
            unsafe { self.free(block.as_ptr().cast()) };
            return Err(AllocError::Misaligned {
                addr,
                align: layout.align(),
            });
        }
        Ok(block)
    }
}
