//! ABI layer for the host allocator: `hostalloc_alloc`, `hostalloc_realloc`, `hostalloc_free`.
//!
//! Each symbol is a single forward to [`BRIDGE`]. Nothing is validated,
//! logged, or retried; null results and invalid-pointer behavior are the
//! host's.

use std::ffi::c_void;

use hostalloc_core::{ACTIVE_HOST, ActiveHost, Bridge};

use crate::macros::export_bridge_fn;

/// The bridge behind every exported symbol. Host and label are fixed at compile time.
pub static BRIDGE: Bridge<ActiveHost> = Bridge::new(ACTIVE_HOST);

export_bridge_fn! {
    /// Allocate `bytes` bytes of uninitialized memory from the host allocator.
    ///
    /// With the `debug-memory` feature the block is tagged `"rust"` in the
    /// host's memory tracking; otherwise it carries the empty label.
    fn hostalloc_alloc(bytes: usize) -> *mut c_void => allocate;
}

export_bridge_fn! {
    /// Resize the block at `ptr` to `bytes` bytes.
    ///
    /// A null `ptr` allocates. The returned address may differ from `ptr`, in
    /// which case `ptr` is no longer valid.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or a live block from `hostalloc_alloc`/`hostalloc_realloc`.
    fn hostalloc_realloc(ptr: *mut c_void, bytes: usize) -> *mut c_void => reallocate;
}

export_bridge_fn! {
    /// Release the block at `ptr` to the host allocator.
    ///
    /// # Safety
    ///
    /// `ptr` must be a live block from `hostalloc_alloc`/`hostalloc_realloc`,
    /// freed at most once.
    fn hostalloc_free(ptr: *mut c_void) => free;
}
