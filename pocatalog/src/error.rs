//! All error types for the pocatalog crate.
//!
//! These are returned from all fallible operations (loading, parsing, saving,
//! merging, running the gettext tools, background tasks).

use std::{fmt, path::PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Structural grammar error; the file is rejected.
    #[error("broken PO file (line {line}): {message}")]
    Parse { line: usize, message: String },

    #[error("charset error: {0}")]
    Charset(String),

    #[error("couldn't load the file, it is probably damaged: {0}")]
    InvalidCatalog(String),

    #[error("`{program}` failed: {message}")]
    Tool { program: String, message: String },

    #[error("{kind}")]
    Extraction {
        kind: ExtractionError,
        file: Option<PathBuf>,
    },

    /// Failure of a background task, ready for user display.
    #[error("{summary}")]
    Task { summary: String, details: String },

    #[error("operation cancelled")]
    Cancelled,

    #[error("file `{}` is read-only and cannot be saved", .0.display())]
    ReadOnly(PathBuf),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Reasons why extracting strings from source code can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionError {
    NoSourcesFound,
    PermissionDenied,
    Unspecified,
}

impl fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionError::NoSourcesFound => write!(f, "Source code not available."),
            ExtractionError::PermissionDenied => write!(f, "Permission denied."),
            ExtractionError::Unspecified => write!(f, "Failed to extract strings from source code."),
        }
    }
}

impl Error {
    /// Creates a structural parse error for the given 1-based line.
    pub fn parse_error(line: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            line,
            message: message.into(),
        }
    }

    /// Creates a new external tool failure.
    pub fn tool_error(program: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Tool {
            program: program.into(),
            message: message.into(),
        }
    }

    /// Creates a new background task failure with a summary and explanatory details.
    pub fn task_error(summary: impl Into<String>, details: impl Into<String>) -> Self {
        Error::Task {
            summary: summary.into(),
            details: details.into(),
        }
    }

    /// Creates a new extraction error, optionally naming the culprit file.
    pub fn extraction_error(kind: ExtractionError, file: Option<PathBuf>) -> Self {
        Error::Extraction { kind, file }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}
