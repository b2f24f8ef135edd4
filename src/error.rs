//! Error types for sb
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad args, malformed header, unknown task)
//! - 3: Conflict (baseline diverged from the on-disk state)
//! - 4: Operation failed (I/O, lock, serialization)

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the sb CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const CONFLICT: i32 = 3;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for sb operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Not a task board: {0} (run `sb init` first)")]
    BoardNotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Missing required header field: {0}")]
    MissingHeaderField(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Unsupported status: {0}")]
    UnsupportedStatus(String),

    #[error("No baseline snapshot at {0} (run `sb snapshot` first)")]
    BaselineMissing(PathBuf),

    // Conflicts (exit code 3)
    #[error("Conflict on {id}: baseline recorded '{expected}' but the tree has '{found}' ({pending} pending change(s) aborted)")]
    Conflict {
        id: String,
        expected: String,
        found: String,
        pending: usize,
    },

    // Operation failures (exit code 4)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Lock acquisition failed: {0}")]
    LockFailed(PathBuf),

    #[error("Glob pattern error: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            // User errors
            Error::BoardNotFound(_)
            | Error::InvalidConfig(_)
            | Error::InvalidArgument(_)
            | Error::MissingHeaderField(_)
            | Error::TaskNotFound(_)
            | Error::UnsupportedStatus(_)
            | Error::BaselineMissing(_) => exit_codes::USER_ERROR,

            // Conflicts
            Error::Conflict { .. } => exit_codes::CONFLICT,

            // Operation failures
            Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_)
            | Error::LockFailed(_)
            | Error::Pattern(_)
            | Error::OperationFailed(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Structured detail payload for JSON error output, where one exists
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::Conflict {
                id,
                expected,
                found,
                pending,
            } => Some(serde_json::json!({
                "id": id,
                "expected": expected,
                "found": found,
                "pending": pending,
            })),
            _ => None,
        }
    }
}

/// Result type alias for sb operations
pub type Result<T> = std::result::Result<T, Error>;
