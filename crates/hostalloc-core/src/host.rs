//! The host allocator seam.
//!
//! A [`HostAllocator`] is the engine-side memory subsystem the bridge forwards
//! to. Two implementations ship with the crate:
//! - [`SystemHost`]: the process C allocator (`malloc`/`realloc`/`free`).
//! - [`LinkedHost`] (feature `engine-link`): the engine's static allocator,
//!   reached through the `hostalloc_engine_*` C symbols at link time.
//!
//! [`ActiveHost`] names whichever of the two this build selected.

use std::ffi::{CStr, c_void};

/// A pre-existing allocator that owns every block the bridge hands out.
///
/// # Safety
///
/// Implementors must behave like a C allocator: `alloc_static` returns null or
/// a block of at least `bytes` bytes aligned to [`Self::GUARANTEED_ALIGN`];
/// `realloc_static` preserves the first `min(old, new)` bytes and treats a
/// null `ptr` as an allocation; `free_static` releases a block obtained from
/// the same allocator. The implementation must be safe to call from any thread
/// the consumer calls the bridge from.
pub unsafe trait HostAllocator {
    /// Alignment every non-null block returned by this host satisfies.
    const GUARANTEED_ALIGN: usize = align_of::<usize>();

    /// Stable identifier for build reports.
    const KIND: HostKind;

    /// Allocate `bytes` bytes tagged with `label`.
    ///
    /// # Safety
    ///
    /// `label` must stay valid for the duration of the call; hosts that keep
    /// the label beyond that require a `'static` string, which the bridge
    /// always passes.
    unsafe fn alloc_static(&self, bytes: usize, label: &CStr) -> *mut c_void;

    /// Resize the block at `ptr` to `bytes` bytes.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or a live block from this host.
    unsafe fn realloc_static(&self, ptr: *mut c_void, bytes: usize) -> *mut c_void;

    /// Release the block at `ptr`.
    ///
    /// # Safety
    ///
    /// `ptr` must be a live block from this host (or null, if the host
    /// accepts null). It must not be used afterwards.
    unsafe fn free_static(&self, ptr: *mut c_void);
}

/// Which host implementation a build forwards to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostKind {
    /// The process C allocator.
    System,
    /// The engine allocator resolved at link time.
    Engine,
    /// A test or tooling host outside this crate.
    Custom,
}

impl HostKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Engine => "engine",
            Self::Custom => "custom",
        }
    }
}

/// Forwards to the process C allocator. Labels are accepted and ignored.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemHost;

// SAFETY: malloc/realloc/free satisfy the C allocator contract and are
// thread-safe; malloc returns blocks aligned for max_align_t.
unsafe impl HostAllocator for SystemHost {
    const GUARANTEED_ALIGN: usize = align_of::<libc::max_align_t>();
    const KIND: HostKind = HostKind::System;

    #[inline]
    unsafe fn alloc_static(&self, bytes: usize, _label: &CStr) -> *mut c_void {
        // SAFETY: direct call to the libc allocator.
        unsafe { libc::malloc(bytes) }
    }

    #[inline]
    unsafe fn realloc_static(&self, ptr: *mut c_void, bytes: usize) -> *mut c_void {
        // SAFETY: caller guarantees ptr is null or a live malloc block.
        unsafe { libc::realloc(ptr, bytes) }
    }

    #[inline]
    unsafe fn free_static(&self, ptr: *mut c_void) {
        // SAFETY: caller guarantees ptr is null or a live malloc block.
        unsafe { libc::free(ptr) }
    }
}

#[cfg(feature = "engine-link")]
unsafe extern "C" {
    fn hostalloc_engine_alloc_static(bytes: usize, label: *const std::ffi::c_char)
    -> *mut c_void;
    fn hostalloc_engine_realloc_static(ptr: *mut c_void, bytes: usize) -> *mut c_void;
    fn hostalloc_engine_free_static(ptr: *mut c_void);
}

/// Forwards to the engine's static allocator through link-time symbols.
#[cfg(feature = "engine-link")]
#[derive(Debug, Default, Clone, Copy)]
pub struct LinkedHost;

// SAFETY: the engine's static allocator is a thread-safe C allocator; the
// engine side of the link is responsible for honouring that contract.
#[cfg(feature = "engine-link")]
unsafe impl HostAllocator for LinkedHost {
    const KIND: HostKind = HostKind::Engine;

    #[inline]
    unsafe fn alloc_static(&self, bytes: usize, label: &CStr) -> *mut c_void {
        // SAFETY: direct call to the engine allocator symbol; label is a
        // NUL-terminated string that outlives the call.
        unsafe { hostalloc_engine_alloc_static(bytes, label.as_ptr()) }
    }

    #[inline]
    unsafe fn realloc_static(&self, ptr: *mut c_void, bytes: usize) -> *mut c_void {
        // SAFETY: direct call to the engine allocator symbol.
        unsafe { hostalloc_engine_realloc_static(ptr, bytes) }
    }

    #[inline]
    unsafe fn free_static(&self, ptr: *mut c_void) {
        // SAFETY: direct call to the engine allocator symbol.
        unsafe { hostalloc_engine_free_static(ptr) }
    }
}

/// The host this build forwards to.
#[cfg(feature = "engine-link")]
pub type ActiveHost = LinkedHost;

#[cfg(feature = "engine-link")]
pub const ACTIVE_HOST: ActiveHost = LinkedHost;

/// The host this build forwards to.
#[cfg(not(feature = "engine-link"))]
pub type ActiveHost = SystemHost;

#[cfg(not(feature = "engine-link"))]
pub const ACTIVE_HOST: ActiveHost = SystemHost;
