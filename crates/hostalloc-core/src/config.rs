//! Allocation tagging configuration.
//!
//! Tagging is fixed at compile time by the `debug-memory` cargo feature:
//! - enabled: every allocation is tagged with the `"rust"` label so the host's
//!   memory tracking can attribute it.
//! - disabled (default): allocations carry the empty label.
//!
//! Nothing here is read at run time; [`Tagging::from_str_loose`] exists for
//! tooling that constructs bridges with an explicit tagging.

use std::ffi::CStr;

use crate::host::{ActiveHost, HostAllocator, HostKind};

/// Label attached to allocations when debug tagging is on.
pub const DEBUG_LABEL: &CStr = c"rust";

/// Label attached to allocations when debug tagging is off.
pub const UNTAGGED_LABEL: &CStr = c"";

/// Label selected by this build.
#[cfg(feature = "debug-memory")]
pub const ALLOCATION_LABEL: &CStr = DEBUG_LABEL;

/// Label selected by this build.
#[cfg(not(feature = "debug-memory"))]
pub const ALLOCATION_LABEL: &CStr = UNTAGGED_LABEL;

/// How allocations are tagged for the host's memory tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tagging {
    /// Tag with [`DEBUG_LABEL`].
    Debug,
    /// Tag with [`UNTAGGED_LABEL`].
    Untagged,
}

impl Tagging {
    /// The tagging compiled into this build.
    #[must_use]
    pub const fn active() -> Self {
        if cfg!(feature = "debug-memory") {
            Self::Debug
        } else {
            Self::Untagged
        }
    }

    /// Parse from string (case-insensitive). Unknown values mean [`Tagging::active`].
    #[must_use]
    pub fn from_str_loose(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "debug" | "rust" | "on" | "tagged" => Self::Debug,
            "none" | "off" | "release" | "untagged" => Self::Untagged,
            _ => Self::active(),
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static CStr {
        match self {
            Self::Debug => DEBUG_LABEL,
            Self::Untagged => UNTAGGED_LABEL,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Untagged => "none",
        }
    }
}

/// Snapshot of the compile-time configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildInfo {
    pub tagging: Tagging,
    pub label: &'static CStr,
    pub host: HostKind,
    pub host_align: usize,
}

/// Describe the configuration this crate was compiled with.
#[must_use]
pub const fn build_info() -> BuildInfo {
    BuildInfo {
        tagging: Tagging::active(),
        label: ALLOCATION_LABEL,
        host: <ActiveHost as HostAllocator>::KIND,
        host_align: <ActiveHost as HostAllocator>::GUARANTEED_ALIGN,
    }
}
