//! Host allocator with memory tracking, standing in for an engine's debug
//! memory report.
//!
//! Blocks come from the C allocator; every live block is recorded with its
//! size and the label it was allocated under. Realloc keeps the original
//! label, as engine allocators do. Bookkeeping lives behind a
//! `parking_lot::Mutex` and uses the Rust global allocator, never this host.

#![allow(unsafe_code)]

use std::collections::{BTreeMap, HashMap};
use std::ffi::{CStr, c_void};

use hostalloc_core::{HostAllocator, HostKind};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
struct BlockRecord {
    size: usize,
    label: String,
}

#[derive(Debug, Default)]
struct Ledger {
    live: HashMap<usize, BlockRecord>,
    allocations: u64,
    reallocations: u64,
    frees: u64,
    peak_bytes: usize,
    live_bytes: usize,
    /// Frees or reallocs of addresses this host never handed out.
    foreign_pointers: u64,
}

impl Ledger {
    fn insert(&mut self, addr: usize, record: BlockRecord) {
        self.live_bytes += record.size;
        if let Some(stale) = self.live.insert(addr, record) {
            self.live_bytes -= stale.size;
        }
        self.peak_bytes = self.peak_bytes.max(self.live_bytes);
    }

    fn remove(&mut self, addr: usize) -> Option<BlockRecord> {
        let record = self.live.remove(&addr)?;
        self.live_bytes -= record.size;
        Some(record)
    }
}

/// A tracking host allocator for tests and tooling.
#[derive(Debug, Default)]
pub struct TrackingHost {
    ledger: Mutex<Ledger>,
}

impl TrackingHost {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of blocks currently live.
    #[must_use]
    pub fn live_blocks(&self) -> usize {
        self.ledger.lock().live.len()
    }

    /// Size recorded for the live block at `ptr`.
    #[must_use]
    pub fn block_size(&self, ptr: *const c_void) -> Option<usize> {
        self.ledger.lock().live.get(&(ptr as usize)).map(|r| r.size)
    }

    /// Label recorded for the live block at `ptr`.
    #[must_use]
    pub fn block_label(&self, ptr: *const c_void) -> Option<String> {
        self.ledger
            .lock()
            .live
            .get(&(ptr as usize))
            .map(|r| r.label.clone())
    }

    /// Snapshot of the memory report.
    #[must_use]
    pub fn report(&self) -> MemoryReport {
        let ledger = self.ledger.lock();
        let mut by_label: BTreeMap<String, LabelUsage> = BTreeMap::new();
        let mut leaks: Vec<LiveBlock> = Vec::with_capacity(ledger.live.len());
        for (&addr, record) in &ledger.live {
            let usage = by_label.entry(record.label.clone()).or_default();
            usage.live_blocks += 1;
            usage.live_bytes += record.size;
            leaks.push(LiveBlock {
                addr,
                size: record.size,
                label: record.label.clone(),
            });
        }
        leaks.sort_by_key(|b| b.addr);
        MemoryReport {
            allocations: ledger.allocations,
            reallocations: ledger.reallocations,
            frees: ledger.frees,
            live_bytes: ledger.live_bytes,
            peak_bytes: ledger.peak_bytes,
            foreign_pointers: ledger.foreign_pointers,
            by_label,
            leaks,
        }
    }
}

// SAFETY: blocks come straight from libc malloc/realloc/free; the ledger only
// observes addresses and is guarded by a mutex.
unsafe impl HostAllocator for TrackingHost {
    const GUARANTEED_ALIGN: usize = align_of::<libc::max_align_t>();
    const KIND: HostKind = HostKind::Custom;

    unsafe fn alloc_static(&self, bytes: usize, label: &CStr) -> *mut c_void {
        // SAFETY: direct call to the libc allocator.
        let ptr = unsafe { libc::malloc(bytes) };
        let mut ledger = self.ledger.lock();
        ledger.allocations += 1;
        if !ptr.is_null() {
            ledger.insert(
                ptr as usize,
                BlockRecord {
                    size: bytes,
                    label: label.to_string_lossy().into_owned(),
                },
            );
        }
        ptr
    }

    unsafe fn realloc_static(&self, ptr: *mut c_void, bytes: usize) -> *mut c_void {
        // The old address may be reused by another thread as soon as realloc
        // releases it, so the ledger stays locked across the call.
        let mut ledger = self.ledger.lock();
        // SAFETY: caller guarantees ptr is null or a live block from this host.
        let new_ptr = unsafe { libc::realloc(ptr, bytes) };
        ledger.reallocations += 1;
        if new_ptr.is_null() {
            // Failed resize leaves the old block live; realloc(p, 0) may also land here.
            if bytes == 0 && !ptr.is_null() {
                ledger.remove(ptr as usize);
            }
            return new_ptr;
        }
        let label = if ptr.is_null() {
            String::new()
        } else {
            match ledger.remove(ptr as usize) {
                Some(old) => old.label,
                None => {
                    ledger.foreign_pointers += 1;
                    String::new()
                }
            }
        };
        ledger.insert(new_ptr as usize, BlockRecord { size: bytes, label });
        new_ptr
    }

    unsafe fn free_static(&self, ptr: *mut c_void) {
        {
            let mut ledger = self.ledger.lock();
            ledger.frees += 1;
            if !ptr.is_null() && ledger.remove(ptr as usize).is_none() {
                ledger.foreign_pointers += 1;
            }
        }
        // SAFETY: caller guarantees ptr is null or a live block from this host.
        unsafe { libc::free(ptr) }
    }
}

/// Live usage attributed to one label.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelUsage {
    pub live_blocks: usize,
    pub live_bytes: usize,
}

/// A block that is still live when the report is taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveBlock {
    pub addr: usize,
    pub size: usize,
    pub label: String,
}

/// The host's memory report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryReport {
    pub allocations: u64,
    pub reallocations: u64,
    pub frees: u64,
    pub live_bytes: usize,
    pub peak_bytes: usize,
    pub foreign_pointers: u64,
    pub by_label: BTreeMap<String, LabelUsage>,
    pub leaks: Vec<LiveBlock>,
}

impl MemoryReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.leaks.is_empty() && self.foreign_pointers == 0
    }

    /// Live usage under `label` (zero when the label never appears).
    #[must_use]
    pub fn usage(&self, label: &str) -> LabelUsage {
        self.by_label.get(label).copied().unwrap_or_default()
    }
}
