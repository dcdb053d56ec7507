//! CLI entrypoint for the hostalloc harness.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use hostalloc_core::{Tagging, build_info};
use hostalloc_harness::structured_log::{LogEmitter, LogLevel};
use hostalloc_harness::{Scenario, run_logged};

/// Scenario and build tooling for hostalloc.
#[derive(Debug, Parser)]
#[command(name = "hostalloc-harness")]
#[command(about = "Scenario runner and build report for the hostalloc bridge")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run bridge scenarios against a tracking host.
    Run {
        /// Scenario name, or "all".
        #[arg(long, default_value = "all")]
        scenario: String,
        /// Tagging to use (debug|none). Defaults to the compiled-in tagging.
        #[arg(long)]
        tagging: Option<String>,
        /// Structured JSONL log path (if omitted, logs go to stdout).
        #[arg(long)]
        log: Option<PathBuf>,
        /// Run identifier embedded in trace ids.
        #[arg(long, default_value = "run")]
        trace_id: String,
    },
    /// Print the compiled-in configuration as JSON.
    BuildInfo,
    /// List scenario names.
    Scenarios,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            scenario,
            tagging,
            log,
            trace_id,
        } => {
            let scenarios = if scenario == "all" {
                Scenario::ALL.to_vec()
            } else {
                vec![Scenario::from_name(&scenario)?]
            };
            let tagging = tagging
                .as_deref()
                .map_or_else(Tagging::active, Tagging::from_str_loose);

            let mut emitter = match &log {
                Some(path) => LogEmitter::to_file(path, &trace_id)?,
                None => LogEmitter::to_stdout(&trace_id),
            };
            emitter.emit(LogLevel::Info, "run_start")?;
            let results = run_logged(&scenarios, tagging, &mut emitter)?;

            let failed = results.iter().filter(|r| !r.passed()).count();
            let level = if failed == 0 {
                LogLevel::Info
            } else {
                LogLevel::Error
            };
            emitter.emit(level, "run_end")?;
            emitter.flush()?;
            for result in &results {
                eprintln!(
                    "[{}] {} ({} allocs, {} reallocs, {} frees)",
                    if result.passed() { "PASS" } else { "FAIL" },
                    result.scenario.name(),
                    result.report.allocations,
                    result.report.reallocations,
                    result.report.frees,
                );
            }
            eprintln!(
                "{} scenario(s), {failed} failed, tagging={}",
                results.len(),
                tagging.as_str()
            );
            if let Some(first_failure) = results.into_iter().find(|r| !r.passed()) {
                first_failure.into_result()?;
            }
        }
        Command::BuildInfo => {
            let info = build_info();
            let json = serde_json::json!({
                "tagging": info.tagging.as_str(),
                "label": info.label.to_string_lossy(),
                "host": info.host.as_str(),
                "host_align": info.host_align,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        Command::Scenarios => {
            for scenario in Scenario::ALL {
                println!("{}", scenario.name());
            }
        }
    }

    Ok(())
}
