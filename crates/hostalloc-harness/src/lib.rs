//! Test tooling for hostalloc.
//!
//! This crate provides:
//! - A tracking host allocator that stands in for an engine's memory report
//! - Named bridge scenarios with leak checks
//! - Structured JSONL logging for scenario runs
//! - The `harness` CLI

pub mod error;
pub mod scenario;
pub mod structured_log;
pub mod tracking_host;

pub use error::HarnessError;
pub use scenario::{Scenario, ScenarioResult, run_logged, run_scenario};
pub use tracking_host::{MemoryReport, TrackingHost};
