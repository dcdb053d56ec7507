//! # hostalloc-core
//!
//! Pass-through bridge from foreign allocation calls to a host engine's static
//! allocator.
//!
//! ```text
//! foreign runtime -> hostalloc-abi entry point -> Bridge<ActiveHost> -> host allocator
//! ```
//!
//! The bridge adds no validation, no tracking, and no recovery. The only
//! choice it makes is the label attached to allocations, selected at compile
//! time by the `debug-memory` feature (see [`config`]).
//!
//! [`HostGlobalAlloc`] closes the loop on the Rust side: installed as the
//! `#[global_allocator]`, it sends every Rust heap allocation to the same host.

pub mod bridge;
pub mod config;
pub mod error;
pub mod global;
pub mod host;

pub use bridge::Bridge;
pub use config::{ALLOCATION_LABEL, BuildInfo, Tagging, build_info};
pub use error::AllocError;
pub use global::HostGlobalAlloc;
#[cfg(feature = "engine-link")]
pub use host::LinkedHost;
pub use host::{ACTIVE_HOST, ActiveHost, HostAllocator, HostKind, SystemHost};
