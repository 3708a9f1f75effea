//! Runner error types.

use std::fmt;

/// Errors that end the runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunnerError {
    /// Configuration could not be loaded or is invalid.
    Config { reason: String },
    /// The lifecycle failed to start.
    Startup { reason: String },
    /// The configured one-shot send failed.
    Send { reason: String },
    /// Waiting for the shutdown signal failed.
    Signal { reason: String },
    /// One or more hooks failed to stop.
    Shutdown { reason: String },
}

impl fmt::Display for RunnerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { reason } => write!(f, "configuration error: {reason}"),
            Self::Startup { reason } => write!(f, "startup failed: {reason}"),
            Self::Send { reason } => write!(f, "send failed: {reason}"),
            Self::Signal { reason } => {
                write!(f, "failed to wait for shutdown signal: {reason}")
            }
            Self::Shutdown { reason } => write!(f, "shutdown failed: {reason}"),
        }
    }
}

impl std::error::Error for RunnerError {}
