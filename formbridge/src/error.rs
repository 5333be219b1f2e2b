//! Error types for the bridge.

use std::{path::PathBuf, time::Duration};

use thiserror::Error;

/// Errors surfaced to the parent process or the command line.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Reading or writing a stream or file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A message or payload that is not the JSON the bridge expects.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// The configuration file could not be read or parsed.
    #[error("invalid config {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    /// A validation was requested but no engine is configured.
    #[error("no validation engine configured")]
    NoValidator,

    /// The engine rejected the submission; one message per failed field.
    #[error("{}", .0.join("\n"))]
    Validation(Vec<String>),

    /// The engine failed for a reason other than rejecting the submission.
    #[error("validation engine failed: {0}")]
    Engine(String),

    /// The engine did not finish in time and was killed.
    #[error("validation engine timed out after {0:?}")]
    Timeout(Duration),
}

impl BridgeError {
    /// Shorthand for [`BridgeError::MalformedInput`].
    pub fn malformed(message: impl ToString) -> Self {
        Self::MalformedInput(message.to_string())
    }
}

/// Result alias for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;
