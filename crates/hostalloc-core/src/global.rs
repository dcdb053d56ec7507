//! `GlobalAlloc` adapter that routes Rust heap traffic through a [`Bridge`].
//!
//! ```ignore
//! use hostalloc_core::{HostGlobalAlloc, SystemHost};
//!
//! #[global_allocator]
//! static ALLOC: HostGlobalAlloc<SystemHost> = HostGlobalAlloc::new(SystemHost);
//! ```
//!
//! Layouts within [`HostAllocator::GUARANTEED_ALIGN`] map 1:1 onto host
//! blocks. Stricter layouts are carved out of a larger host block; the host
//! address is stored in the word just below the returned pointer.

use std::alloc::{GlobalAlloc, Layout};
use std::ffi::c_void;
use std::ptr;

use crate::bridge::Bridge;
use crate::host::HostAllocator;

const HEADER: usize = size_of::<usize>();

/// Global allocator backed by a host allocator.
#[derive(Debug)]
pub struct HostGlobalAlloc<H> {
    bridge: Bridge<H>,
}

impl<H: HostAllocator> HostGlobalAlloc<H> {
    #[must_use]
    pub const fn new(host: H) -> Self {
        Self {
            bridge: Bridge::new(host),
        }
    }

    #[must_use]
    pub const fn from_bridge(bridge: Bridge<H>) -> Self {
        Self { bridge }
    }

    #[must_use]
    pub const fn bridge(&self) -> &Bridge<H> {
        &self.bridge
    }

    #[inline]
    const fn host_aligned(layout: Layout) -> bool {
        layout.align() <= H::GUARANTEED_ALIGN
    }

    unsafe fn alloc_over_aligned(&self, layout: Layout) -> *mut u8 {
        let Some(total) = layout
            .size()
            .checked_add(layout.align())
            .and_then(|n| n.checked_add(HEADER))
        else {
            return ptr::null_mut();
        };
        let raw = self.bridge.allocate(total).cast::<u8>();
        if raw.is_null() {
            return raw;
        }
        let start = raw as usize + HEADER;
        let offset = start.next_multiple_of(layout.align()) - raw as usize;
        // SAFETY: offset <= HEADER + align - 1, so the aligned block and the
        // header word before it both lie inside the `total`-byte host block.
        unsafe {
            let aligned = raw.add(offset);
            aligned.sub(HEADER).cast::<*mut u8>().write_unaligned(raw);
            aligned
        }
    }

    unsafe fn host_block(ptr: *mut u8) -> *mut c_void {
        // SAFETY: ptr came from alloc_over_aligned, which stored the host
        // address in the preceding word.
        unsafe { ptr.sub(HEADER).cast::<*mut u8>().read_unaligned().cast() }
    }
}

// SAFETY: host-aligned layouts get host blocks checked against the layout;
// stricter layouts get an aligned sub-block of a host block large enough for
// size, alignment slack, and the header. Dealloc recovers the host address
// from the layout's alignment, which GlobalAlloc guarantees matches alloc.
unsafe impl<H: HostAllocator> GlobalAlloc for HostGlobalAlloc<H> {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        if !Self::host_aligned(layout) {
            // SAFETY: forwarded GlobalAlloc contract.
            return unsafe { self.alloc_over_aligned(layout) };
        }
        match self.bridge.allocate_layout(layout) {
            Ok(block) => block.as_ptr(),
            Err(_) => ptr::null_mut(),
        }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        let block = if Self::host_aligned(layout) {
            ptr.cast()
        } else {
            // SAFETY: over-aligned blocks always carry the header.
            unsafe { Self::host_block(ptr) }
        };
        // SAFETY: block is the live host block behind ptr.
        unsafe { self.bridge.free(block) }
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        if Self::host_aligned(layout) {
            // SAFETY: ptr is a live host block; the host keeps its alignment.
            return unsafe { self.bridge.reallocate(ptr.cast(), new_size) }.cast();
        }

        // SAFETY: GlobalAlloc contract guarantees the new layout is valid.
        let new_layout = unsafe { Layout::from_size_align_unchecked(new_size, layout.align()) };
        // SAFETY: new_layout has non-zero size per the realloc contract.
        let new_ptr = unsafe { self.alloc(new_layout) };
        if !new_ptr.is_null() {
            // SAFETY: both blocks are live and at least min(old, new) bytes long.
            unsafe {
                ptr::copy_nonoverlapping(ptr, new_ptr, layout.size().min(new_size));
                self.dealloc(ptr, layout);
            }
        }
        new_ptr
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::SystemHost;

    #[test]
    fn alloc_respects_guaranteed_alignment() {
        let a = HostGlobalAlloc::new(SystemHost);
        let layout = Layout::from_size_align(40, SystemHost::GUARANTEED_ALIGN).expect("layout");
        // SAFETY: layout is non-zero; block freed with the same layout.
        unsafe {
            let p = a.alloc(layout);
            assert!(!p.is_null());
            assert_eq!(p as usize % layout.align(), 0);
            a.dealloc(p, layout);
        }
    }

    #[test]
    fn realloc_within_guaranteed_alignment_preserves_bytes() {
        let a = HostGlobalAlloc::new(SystemHost);
        let layout = Layout::from_size_align(8, 8).expect("layout");
        // SAFETY: block is live between alloc and dealloc; sizes respected.
        unsafe {
            let p = a.alloc(layout);
            assert!(!p.is_null());
            ptr::copy_nonoverlapping(b"hostallo".as_ptr(), p, 8);
            let q = a.realloc(p, layout, 256);
            assert!(!q.is_null());
            assert_eq!(std::slice::from_raw_parts(q, 8), b"hostallo");
            a.dealloc(q, Layout::from_size_align(256, 8).expect("layout"));
        }
    }

    #[test]
    fn over_aligned_blocks_are_aligned_and_survive_realloc() {
        let a = HostGlobalAlloc::new(SystemHost);
        for align in [64_usize, 128, 4096] {
            let layout = Layout::from_size_align(align / 2, align).expect("layout");
            // SAFETY: blocks used within their sizes; each freed once with its layout.
            unsafe {
                let p = a.alloc(layout);
                assert!(!p.is_null());
                assert_eq!(p as usize % align, 0, "align {align}");
                ptr::write_bytes(p, 0x3C, layout.size());

                let q = a.realloc(p, layout, align * 2);
                assert!(!q.is_null());
                assert_eq!(q as usize % align, 0, "align {align} after realloc");
                assert!(
                    std::slice::from_raw_parts(q, layout.size())
                        .iter()
                        .all(|&b| b == 0x3C)
                );
                a.dealloc(q, Layout::from_size_align(align * 2, align).expect("layout"));
            }
        }
    }

    #[test]
    fn over_aligned_huge_request_is_null() {
        let a = HostGlobalAlloc::new(SystemHost);
        let layout = Layout::from_size_align(isize::MAX as usize - 63, 64).expect("layout");
        // SAFETY: layout is non-zero; a null result owns nothing.
        let p = unsafe { a.alloc(layout) };
        assert!(p.is_null());
    }
}
