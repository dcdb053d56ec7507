// Every exported symbol takes raw pointers from C callers and hands them to
// the host unchanged; the safety contract lives on the C side of the boundary.
#![allow(clippy::missing_safety_doc)]
//! # hostalloc-abi
//!
//! extern "C" boundary exposing the host allocator to a foreign runtime's
//! allocator hooks. Builds as `cdylib`, `staticlib`, and `rlib`.
//!
//! ```text
//! foreign runtime -> hostalloc_alloc / hostalloc_realloc / hostalloc_free -> Bridge -> host
//! ```
//!
//! The C declarations ship in `include/hostalloc.h`.

mod macros;

pub mod alloc_abi;

pub use alloc_abi::{BRIDGE, hostalloc_alloc, hostalloc_free, hostalloc_realloc};
