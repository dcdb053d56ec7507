//! Structured logging contract for hostalloc harness runs.
//!
//! Provides:
//! - [`LogEntry`]: canonical JSONL log record with required + optional fields.
//! - [`LogEmitter`]: writes JSONL lines to a file or stdout.
//! - [`validate_log_line`]: validates a single JSONL line against the schema.
//! - [`validate_log_file`]: validates an entire JSONL file.

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

// ---------------------------------------------------------------------------
// Log entry
// ---------------------------------------------------------------------------

/// Severity level for log entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/// Scenario outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Pass,
    Fail,
    Skip,
}

/// Canonical structured log entry.
///
/// Required fields: `timestamp`, `trace_id`, `level`, `event`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    // Required
    pub timestamp: String,
    pub trace_id: String,
    pub level: LogLevel,
    pub event: String,

    // Optional
    /// Exported symbol or bridge operation the event concerns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    /// Allocation label in effect (`"rust"` or `""`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ns: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl LogEntry {
    /// Create a new log entry with required fields only.
    #[must_use]
    pub fn new(trace_id: impl Into<String>, level: LogLevel, event: impl Into<String>) -> Self {
        Self {
            timestamp: now_utc(),
            trace_id: trace_id.into(),
            level,
            event: event.into(),
            symbol: None,
            label: None,
            scenario: None,
            outcome: None,
            bytes: None,
            latency_ns: None,
            details: None,
        }
    }

    #[must_use]
    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn with_scenario(mut self, scenario: impl Into<String>) -> Self {
        self.scenario = Some(scenario.into());
        self
    }

    #[must_use]
    pub fn with_outcome(mut self, outcome: Outcome) -> Self {
        self.outcome = Some(outcome);
        self
    }

    #[must_use]
    pub fn with_bytes(mut self, bytes: usize) -> Self {
        self.bytes = Some(bytes);
        self
    }

    #[must_use]
    pub fn with_latency_ns(mut self, ns: u64) -> Self {
        self.latency_ns = Some(ns);
        self
    }

    /// Set free-form details.
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Serialize to a single JSONL line (no trailing newline).
    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// ---------------------------------------------------------------------------
// Emitter
// ---------------------------------------------------------------------------

/// Writes log entries as JSONL, one per line.
pub struct LogEmitter {
    writer: Box<dyn Write>,
    seq: u64,
    run_id: String,
}

impl LogEmitter {
    /// Create an emitter that writes to a file.
    pub fn to_file(path: &Path, run_id: &str) -> std::io::Result<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self::to_writer(
            Box::new(std::io::BufWriter::new(file)),
            run_id,
        ))
    }

    /// Create an emitter that writes to stdout.
    #[must_use]
    pub fn to_stdout(run_id: &str) -> Self {
        Self::to_writer(Box::new(std::io::stdout()), run_id)
    }

    #[must_use]
    pub fn to_writer(writer: Box<dyn Write>, run_id: &str) -> Self {
        Self {
            writer,
            seq: 0,
            run_id: run_id.to_string(),
        }
    }

    /// Generate the next trace ID.
    fn next_trace_id(&mut self) -> String {
        self.seq += 1;
        format!("hostalloc::{}::{:03}", self.run_id, self.seq)
    }

    /// Emit a log entry with an auto-generated trace_id.
    pub fn emit(&mut self, level: LogLevel, event: &str) -> std::io::Result<LogEntry> {
        let trace_id = self.next_trace_id();
        let entry = LogEntry::new(trace_id, level, event);
        let line = serde_json::to_string(&entry).map_err(std::io::Error::other)?;
        writeln!(self.writer, "{line}")?;
        Ok(entry)
    }

    /// Emit a fully-populated log entry. An empty trace_id is filled in.
    pub fn emit_entry(&mut self, mut entry: LogEntry) -> std::io::Result<()> {
        if entry.trace_id.is_empty() {
            entry.trace_id = self.next_trace_id();
        }
        let line = serde_json::to_string(&entry).map_err(std::io::Error::other)?;
        writeln!(self.writer, "{line}")
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// A schema violation on one line of a JSONL log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogValidationError {
    pub line_number: usize,
    pub field: String,
    pub message: String,
}

/// Validate a single JSONL line against the log schema.
pub fn validate_log_line(
    line: &str,
    line_number: usize,
) -> Result<LogEntry, Vec<LogValidationError>> {
    let mut errors = Vec::new();

    let value: serde_json::Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => {
            errors.push(LogValidationError {
                line_number,
                field: "<json>".to_string(),
                message: format!("invalid JSON: {e}"),
            });
            return Err(errors);
        }
    };

    let Some(obj) = value.as_object() else {
        errors.push(LogValidationError {
            line_number,
            field: "<root>".to_string(),
            message: "expected JSON object".to_string(),
        });
        return Err(errors);
    };

    for field in ["timestamp", "trace_id", "level", "event"] {
        if !obj.contains_key(field) {
            errors.push(LogValidationError {
                line_number,
                field: field.to_string(),
                message: "required field missing".to_string(),
            });
        }
    }

    if let Some(level) = obj.get("level").and_then(|v| v.as_str())
        && !["trace", "debug", "info", "warn", "error"].contains(&level)
    {
        errors.push(LogValidationError {
            line_number,
            field: "level".to_string(),
            message: format!("invalid level: '{level}'"),
        });
    }

    if let Some(outcome) = obj.get("outcome").and_then(|v| v.as_str())
        && !["pass", "fail", "skip"].contains(&outcome)
    {
        errors.push(LogValidationError {
            line_number,
            field: "outcome".to_string(),
            message: format!("invalid outcome: '{outcome}'"),
        });
    }

    if let Some(label) = obj.get("label").and_then(|v| v.as_str())
        && !["rust", ""].contains(&label)
    {
        errors.push(LogValidationError {
            line_number,
            field: "label".to_string(),
            message: format!("unexpected allocation label: '{label}'"),
        });
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    serde_json::from_value(value).map_err(|e| {
        vec![LogValidationError {
            line_number,
            field: "<schema>".to_string(),
            message: e.to_string(),
        }]
    })
}

/// Validate every non-empty line of a JSONL file.
///
/// Returns the parsed entries, or every violation found.
pub fn validate_log_file(
    path: &Path,
) -> std::io::Result<Result<Vec<LogEntry>, Vec<LogValidationError>>> {
    let content = std::fs::read_to_string(path)?;
    let mut entries = Vec::new();
    let mut errors = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match validate_log_line(line, idx + 1) {
            Ok(entry) => entries.push(entry),
            Err(mut errs) => errors.append(&mut errs),
        }
    }
    Ok(if errors.is_empty() {
        Ok(entries)
    } else {
        Err(errors)
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn now_utc() -> String {
    let duration = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    let secs = duration.as_secs();
    let (year, month, day) = civil_from_days((secs / 86_400) as i64);
    format!(
        "{year:04}-{month:02}-{day:02}T{:02}:{:02}:{:02}.{:03}Z",
        (secs % 86_400) / 3600,
        (secs % 3600) / 60,
        secs % 60,
        duration.subsec_millis(),
    )
}

/// Days since 1970-01-01 to a proleptic Gregorian (year, month, day).
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}
