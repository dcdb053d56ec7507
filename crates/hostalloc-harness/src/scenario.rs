//! Named bridge scenarios run against a fresh [`TrackingHost`].
//!
//! Every scenario must end with a clean memory report; a live block left
//! behind fails the scenario even when its own checks passed.

#![allow(unsafe_code)]

use std::ffi::c_void;
use std::time::Instant;

use hostalloc_core::{Bridge, Tagging};

use crate::error::HarnessError;
use crate::structured_log::{LogEmitter, LogEntry, LogLevel, Outcome};
use crate::tracking_host::{MemoryReport, TrackingHost};

const PATTERN: [u8; 16] = [
    0xDE, 0xAD, 0xBE, 0xEF, 0x01, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD, 0xEF, 0xFE, 0xDC, 0xBA, 0x98,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scenario {
    /// Allocate 16 bytes, write a pattern, grow to 64, check the pattern, free.
    GrowPreservesPrefix,
    /// Allocate 16 bytes, write a pattern, shrink to 4, check the first 4, free.
    ShrinkPreservesPrefix,
    /// Reallocate from null and use the result as a fresh block.
    ReallocNullAllocates,
    /// Fill many blocks with distinct bytes and check none bleed into another.
    DisjointBlocks,
    /// Check the host report attributes live bytes to the bridge label.
    LabelAttribution,
}

impl Scenario {
    pub const ALL: [Self; 5] = [
        Self::GrowPreservesPrefix,
        Self::ShrinkPreservesPrefix,
        Self::ReallocNullAllocates,
        Self::DisjointBlocks,
        Self::LabelAttribution,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::GrowPreservesPrefix => "grow-preserves-prefix",
            Self::ShrinkPreservesPrefix => "shrink-preserves-prefix",
            Self::ReallocNullAllocates => "realloc-null-allocates",
            Self::DisjointBlocks => "disjoint-blocks",
            Self::LabelAttribution => "label-attribution",
        }
    }

    /// The exported entry point the scenario leans on.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::GrowPreservesPrefix | Self::ShrinkPreservesPrefix | Self::ReallocNullAllocates => {
                "hostalloc_realloc"
            }
            Self::DisjointBlocks | Self::LabelAttribution => "hostalloc_alloc",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, HarnessError> {
        Self::ALL
            .into_iter()
            .find(|s| s.name() == name)
            .ok_or_else(|| HarnessError::UnknownScenario(name.to_string()))
    }

    fn body(self) -> fn(&Bridge<TrackingHost>) -> Result<(), String> {
        match self {
            Self::GrowPreservesPrefix => grow_preserves_prefix,
            Self::ShrinkPreservesPrefix => shrink_preserves_prefix,
            Self::ReallocNullAllocates => realloc_null_allocates,
            Self::DisjointBlocks => disjoint_blocks,
            Self::LabelAttribution => label_attribution,
        }
    }
}

/// Result of one scenario run.
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    pub scenario: Scenario,
    pub tagging: Tagging,
    pub outcome: Outcome,
    pub reason: Option<String>,
    pub latency_ns: u64,
    pub report: MemoryReport,
}

impl ScenarioResult {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.outcome == Outcome::Pass
    }

    /// Turn a failed run into the matching [`HarnessError`].
    pub fn into_result(self) -> Result<MemoryReport, HarnessError> {
        if self.passed() {
            return Ok(self.report);
        }
        if !self.report.leaks.is_empty() {
            return Err(HarnessError::Leak {
                scenario: self.scenario.name().to_string(),
                blocks: self.report.leaks.len(),
                bytes: self.report.live_bytes,
            });
        }
        Err(HarnessError::CheckFailed {
            scenario: self.scenario.name().to_string(),
            reason: self.reason.unwrap_or_default(),
        })
    }

    /// The log entry summarizing this run.
    #[must_use]
    pub fn log_entry(&self) -> LogEntry {
        let level = if self.passed() {
            LogLevel::Info
        } else {
            LogLevel::Error
        };
        let entry = LogEntry::new(String::new(), level, "scenario_end")
            .with_symbol(self.scenario.symbol())
            .with_scenario(self.scenario.name())
            .with_label(self.tagging.label().to_string_lossy())
            .with_outcome(self.outcome)
            .with_bytes(self.report.peak_bytes)
            .with_latency_ns(self.latency_ns);
        let mut details = serde_json::json!({
            "allocations": self.report.allocations,
            "reallocations": self.report.reallocations,
            "frees": self.report.frees,
            "leaked_blocks": self.report.leaks.len(),
        });
        if let Some(reason) = &self.reason {
            details["reason"] = serde_json::Value::String(reason.clone());
        }
        entry.with_details(details)
    }
}

/// Run `scenario` through a bridge with `tagging` over a fresh tracking host.
#[must_use]
pub fn run_scenario(scenario: Scenario, tagging: Tagging) -> ScenarioResult {
    let bridge = Bridge::with_tagging(TrackingHost::new(), tagging);
    let started = Instant::now();
    let checked = scenario.body()(&bridge);
    let latency_ns = u64::try_from(started.elapsed().as_nanos()).unwrap_or(u64::MAX);
    let report = bridge.host().report();

    let reason = match checked {
        Err(reason) => Some(reason),
        Ok(()) if !report.is_clean() => Some(format!(
            "{} live block(s) and {} foreign pointer(s) after scenario",
            report.leaks.len(),
            report.foreign_pointers
        )),
        Ok(()) => None,
    };
    ScenarioResult {
        scenario,
        tagging,
        outcome: if reason.is_none() {
            Outcome::Pass
        } else {
            Outcome::Fail
        },
        reason,
        latency_ns,
        report,
    }
}

/// Run `scenarios` in order, logging a start and end entry for each.
pub fn run_logged(
    scenarios: &[Scenario],
    tagging: Tagging,
    emitter: &mut LogEmitter,
) -> Result<Vec<ScenarioResult>, HarnessError> {
    let mut results = Vec::with_capacity(scenarios.len());
    for &scenario in scenarios {
        emitter.emit_entry(
            LogEntry::new(String::new(), LogLevel::Debug, "scenario_start")
                .with_symbol(scenario.symbol())
                .with_scenario(scenario.name())
                .with_label(tagging.label().to_string_lossy()),
        )?;
        let result = run_scenario(scenario, tagging);
        emitter.emit_entry(result.log_entry())?;
        results.push(result);
    }
    emitter.flush()?;
    Ok(results)
}

/// # Safety
///
/// `ptr` must be a live block of at least `expected.len()` bytes.
unsafe fn check_bytes(ptr: *const u8, expected: &[u8], what: &str) -> Result<(), String> {
    // SAFETY: forwarded caller contract.
    let actual = unsafe { std::slice::from_raw_parts(ptr, expected.len()) };
    if actual == expected {
        Ok(())
    } else {
        Err(format!("{what}: expected {expected:02x?}, found {actual:02x?}"))
    }
}

fn non_null(ptr: *mut c_void, what: &str) -> Result<*mut u8, String> {
    if ptr.is_null() {
        Err(format!("{what} returned null"))
    } else {
        Ok(ptr.cast())
    }
}

fn grow_preserves_prefix(bridge: &Bridge<TrackingHost>) -> Result<(), String> {
    let p = non_null(bridge.allocate(16), "allocate(16)")?;
    // SAFETY: p is a live 16-byte block; q replaces it with 64 bytes.
    unsafe {
        std::ptr::copy_nonoverlapping(PATTERN.as_ptr(), p, PATTERN.len());
        let q = match non_null(bridge.reallocate(p.cast(), 64), "reallocate(64)") {
            Ok(q) => q,
            Err(e) => {
                bridge.free(p.cast());
                return Err(e);
            }
        };
        let checked = check_bytes(q, &PATTERN, "prefix after grow");
        bridge.free(q.cast());
        checked
    }
}

fn shrink_preserves_prefix(bridge: &Bridge<TrackingHost>) -> Result<(), String> {
    let p = non_null(bridge.allocate(16), "allocate(16)")?;
    // SAFETY: p is a live 16-byte block; q replaces it with 4 bytes.
    unsafe {
        std::ptr::copy_nonoverlapping(PATTERN.as_ptr(), p, PATTERN.len());
        let q = match non_null(bridge.reallocate(p.cast(), 4), "reallocate(4)") {
            Ok(q) => q,
            Err(e) => {
                bridge.free(p.cast());
                return Err(e);
            }
        };
        let checked = check_bytes(q, &PATTERN[..4], "prefix after shrink");
        bridge.free(q.cast());
        checked
    }
}

fn realloc_null_allocates(bridge: &Bridge<TrackingHost>) -> Result<(), String> {
    // SAFETY: realloc of null is an allocation; the block is used within 32 bytes.
    unsafe {
        let p = non_null(
            bridge.reallocate(std::ptr::null_mut(), 32),
            "reallocate(null, 32)",
        )?;
        let size = bridge.host().block_size(p.cast::<c_void>());
        std::ptr::write_bytes(p, 0x42, 32);
        let checked = check_bytes(p, &[0x42; 32], "fresh block");
        bridge.free(p.cast());
        if size != Some(32) {
            return Err(format!("host recorded size {size:?}, expected Some(32)"));
        }
        checked
    }
}

fn disjoint_blocks(bridge: &Bridge<TrackingHost>) -> Result<(), String> {
    const COUNT: usize = 48;
    let mut blocks: Vec<(*mut u8, usize)> = Vec::with_capacity(COUNT);
    let mut outcome = Ok(());
    for i in 0..COUNT {
        let size = 1 + i * 5;
        match non_null(bridge.allocate(size), "allocate") {
            Ok(p) => {
                // SAFETY: fresh block of `size` bytes.
                unsafe { std::ptr::write_bytes(p, i as u8, size) };
                blocks.push((p, size));
            }
            Err(e) => {
                outcome = Err(e);
                break;
            }
        }
    }
    if outcome.is_ok() {
        for (i, &(p, size)) in blocks.iter().enumerate() {
            // SAFETY: block is live with `size` bytes.
            let checked = unsafe { check_bytes(p, &vec![i as u8; size], &format!("block {i}")) };
            if let Err(e) = checked {
                outcome = Err(e);
                break;
            }
        }
    }
    for (p, _) in blocks {
        // SAFETY: each block is live and freed once.
        unsafe { bridge.free(p.cast()) };
    }
    outcome
}

fn label_attribution(bridge: &Bridge<TrackingHost>) -> Result<(), String> {
    let label = bridge.label().to_string_lossy().into_owned();
    let a = non_null(bridge.allocate(100), "allocate(100)")?;
    let b = match non_null(bridge.allocate(28), "allocate(28)") {
        Ok(b) => b,
        Err(e) => {
            // SAFETY: a is live.
            unsafe { bridge.free(a.cast()) };
            return Err(e);
        }
    };
    let report = bridge.host().report();
    // SAFETY: a and b are live and freed once.
    unsafe {
        bridge.free(a.cast());
        bridge.free(b.cast());
    }
    let usage = report.usage(&label);
    if usage.live_blocks != 2 || usage.live_bytes != 128 {
        return Err(format!(
            "label '{label}' holds {} block(s)/{} byte(s), expected 2/128",
            usage.live_blocks, usage.live_bytes
        ));
    }
    if report.by_label.len() != 1 {
        return Err(format!(
            "allocations spread over labels {:?}",
            report.by_label.keys().collect::<Vec<_>>()
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for scenario in Scenario::ALL {
            assert_eq!(Scenario::from_name(scenario.name()).unwrap(), scenario);
        }
        assert!(matches!(
            Scenario::from_name("nope"),
            Err(HarnessError::UnknownScenario(name)) if name == "nope"
        ));
    }

    #[test]
    fn every_scenario_passes_under_both_taggings() {
        for tagging in [Tagging::Debug, Tagging::Untagged] {
            for scenario in Scenario::ALL {
                let result = run_scenario(scenario, tagging);
                assert!(
                    result.passed(),
                    "{} ({tagging:?}): {:?}",
                    scenario.name(),
                    result.reason
                );
                assert!(result.report.is_clean());
            }
        }
    }

    #[test]
    fn log_entry_carries_label_and_outcome() {
        let result = run_scenario(Scenario::GrowPreservesPrefix, Tagging::Debug);
        let entry = result.log_entry();
        assert_eq!(entry.label.as_deref(), Some("rust"));
        assert_eq!(entry.outcome, Some(Outcome::Pass));
        assert_eq!(entry.scenario.as_deref(), Some("grow-preserves-prefix"));
        assert_eq!(entry.symbol.as_deref(), Some("hostalloc_realloc"));
        assert_eq!(entry.bytes, Some(64));
    }
}
