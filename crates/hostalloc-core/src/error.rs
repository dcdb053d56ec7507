use thiserror::Error;

/// Failures surfaced by the checked Rust-side allocation paths.
///
/// The extern entry points never produce these; they hand the host's result
/// back unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AllocError {
    #[error("host allocator returned null for {requested} bytes")]
    OutOfMemory { requested: usize },
    #[error("host block at {addr:#x} is not aligned to {align}")]
    Misaligned { addr: usize, align: usize },
}
