//! Integration test: scenario runs produce valid JSONL and clean reports.
//!
//! Run: cargo test -p hostalloc-harness --test scenario_log_test

use std::collections::HashSet;
use std::path::PathBuf;

use hostalloc_core::Tagging;
use hostalloc_harness::structured_log::{LogEmitter, Outcome, validate_log_file};
use hostalloc_harness::{Scenario, run_logged};

fn temp_log_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "hostalloc-{name}-{}-{}.jsonl",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

#[test]
fn full_run_writes_start_and_end_per_scenario() {
    let path = temp_log_path("full-run");
    let mut emitter = LogEmitter::to_file(&path, "it").expect("create log");
    let results = run_logged(&Scenario::ALL, Tagging::Debug, &mut emitter).expect("run");
    drop(emitter);

    assert_eq!(results.len(), Scenario::ALL.len());
    assert!(results.iter().all(|r| r.passed()));

    let entries = validate_log_file(&path)
        .expect("read log")
        .expect("log lines satisfy schema");
    assert_eq!(entries.len(), Scenario::ALL.len() * 2);

    let ends: Vec<_> = entries
        .iter()
        .filter(|e| e.event == "scenario_end")
        .collect();
    assert_eq!(ends.len(), Scenario::ALL.len());
    for (entry, scenario) in ends.iter().zip(Scenario::ALL) {
        assert_eq!(entry.scenario.as_deref(), Some(scenario.name()));
        assert_eq!(entry.symbol.as_deref(), Some(scenario.symbol()));
        assert_eq!(entry.outcome, Some(Outcome::Pass));
        assert_eq!(entry.label.as_deref(), Some("rust"));
        assert!(entry.trace_id.starts_with("hostalloc::it::"));
    }

    let trace_ids: HashSet<&str> = entries.iter().map(|e| e.trace_id.as_str()).collect();
    assert_eq!(trace_ids.len(), entries.len(), "trace ids must be unique");

    let _ = std::fs::remove_file(&path);
}

#[test]
fn untagged_run_logs_empty_label() {
    let path = temp_log_path("untagged");
    let mut emitter = LogEmitter::to_file(&path, "it").expect("create log");
    run_logged(&[Scenario::LabelAttribution], Tagging::Untagged, &mut emitter).expect("run");
    drop(emitter);

    let entries = validate_log_file(&path)
        .expect("read log")
        .expect("valid log");
    assert!(entries.iter().all(|e| e.label.as_deref() == Some("")));
    let _ = std::fs::remove_file(&path);
}
