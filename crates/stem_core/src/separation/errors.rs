//! Error types for the separation runner.
//!
//! `SeparationError` is what fallible runner internals return.
//! At the runner boundary every error is folded into a `RunFailure`,
//! the single terminal reason reported to the UI.

use std::fmt;
use std::io;

use thiserror::Error;

/// Error raised while launching or streaming the separation tool.
#[derive(Error, Debug)]
pub enum SeparationError {
    /// The tool could not be started (missing binary, permissions, ...).
    #[error("Failed to launch '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },

    /// A stdout/stderr pipe was not available after spawning.
    #[error("Tool output stream unavailable: {0}")]
    OutputUnavailable(&'static str),

    /// Reading the tool output or waiting for exit failed.
    #[error("I/O error while running separation tool: {0}")]
    Io(#[from] io::Error),
}

impl SeparationError {
    /// Create a launch error.
    pub fn launch(program: impl Into<String>, source: io::Error) -> Self {
        Self::Launch {
            program: program.into(),
            source,
        }
    }
}

/// Result type for separation operations.
pub type SeparationResult<T> = Result<T, SeparationError>;

/// Why a run ended unsuccessfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunFailure {
    /// The tool exited with a non-zero code.
    ExitCode(i32),
    /// The tool was killed by a signal and has no exit code.
    Terminated,
    /// The tool could not be started.
    Launch(String),
    /// Streaming output or waiting for exit failed.
    Io(String),
}

impl From<SeparationError> for RunFailure {
    fn from(err: SeparationError) -> Self {
        match err {
            SeparationError::Launch { .. } => RunFailure::Launch(err.to_string()),
            other => RunFailure::Io(other.to_string()),
        }
    }
}

impl fmt::Display for RunFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunFailure::ExitCode(code) => {
                write!(f, "Separation tool returned non-zero exit status {}", code)
            }
            RunFailure::Terminated => write!(f, "Separation tool was terminated by a signal"),
            RunFailure::Launch(message) | RunFailure::Io(message) => write!(f, "{}", message),
        }
    }
}

/// A failed run: the reason plus the last lines the tool printed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeparationFailure {
    pub reason: RunFailure,
    pub tail: Vec<String>,
}

impl SeparationFailure {
    pub fn new(reason: RunFailure, tail: Vec<String>) -> Self {
        Self { reason, tail }
    }
}

impl fmt::Display for SeparationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.reason.fmt(f)
    }
}
