//! Errors raised inside the validator's checks.
//!
//! None of these cross a check's boundary: every check converts them into a failure progress message and a `false`
//! result. They exist so the checks (and their tests) can tell the failure categories apart.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Infrastructure errors that occur while preparing or running the interpreter.
#[derive(Debug, Error)]
pub enum ValidatorError {
    #[error("failed to prepare scratch directory: {0}")]
    Workspace(#[source] io::Error),

    #[error("failed to write {path}: {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to launch interpreter '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed while waiting for interpreter: {0}")]
    Wait(#[source] io::Error),

    #[error("interpreter produced no report ({0})")]
    MissingReport(String),

    #[error("malformed probe report: {0}")]
    Protocol(#[from] serde_json::Error),
}

/// Result type for validator internals.
pub type ValidatorResult<T> = Result<T, ValidatorError>;
