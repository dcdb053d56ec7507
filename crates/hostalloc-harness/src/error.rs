use thiserror::Error;

/// Errors from the harness library and CLI.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("unknown scenario '{0}'")]
    UnknownScenario(String),
    #[error("scenario '{scenario}' failed: {reason}")]
    CheckFailed { scenario: String, reason: String },
    #[error("scenario '{scenario}' leaked {blocks} block(s), {bytes} byte(s)")]
    Leak {
        scenario: String,
        blocks: usize,
        bytes: usize,
    },
}
