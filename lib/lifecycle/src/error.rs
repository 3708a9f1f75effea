//! Error types for the lifecycle crate.
//!
//! - `HookError`: Returned by a single hook
//! - `LifecycleError`: Returned by the sequencer, naming the hook and phase

use crate::hook::Phase;
use std::fmt;

/// Failure reported by a lifecycle hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookError {
    /// Why the hook failed.
    pub reason: String,
}

impl HookError {
    /// Creates a hook error from anything displayable.
    #[must_use]
    pub fn new(reason: impl fmt::Display) -> Self {
        Self {
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for HookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)
    }
}

impl std::error::Error for HookError {}

/// Errors from lifecycle sequencing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    /// A hook returned an error.
    HookFailed {
        hook: String,
        phase: Phase,
        reason: String,
    },
    /// A hook did not finish before its deadline.
    Timeout {
        hook: String,
        phase: Phase,
        timeout_ms: u64,
    },
    /// `start` was called more than once.
    AlreadyStarted,
    /// `stop` was called on a lifecycle that is not running.
    NotRunning,
}

impl fmt::Display for LifecycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HookFailed {
                hook,
                phase,
                reason,
            } => {
                write!(f, "{phase} hook '{hook}' failed: {reason}")
            }
            Self::Timeout {
                hook,
                phase,
                timeout_ms,
            } => {
                write!(f, "{phase} hook '{hook}' timed out after {timeout_ms}ms")
            }
            Self::AlreadyStarted => write!(f, "lifecycle already started"),
            Self::NotRunning => write!(f, "lifecycle is not running"),
        }
    }
}

impl std::error::Error for LifecycleError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hook_failed_display() {
        let err = LifecycleError::HookFailed {
            hook: "sms".to_string(),
            phase: Phase::Start,
            reason: "bad credentials".to_string(),
        };
        assert_eq!(err.to_string(), "start hook 'sms' failed: bad credentials");
    }

    #[test]
    fn timeout_display() {
        let err = LifecycleError::Timeout {
            hook: "sms".to_string(),
            phase: Phase::Stop,
            timeout_ms: 50,
        };
        assert!(err.to_string().contains("stop hook 'sms'"));
        assert!(err.to_string().contains("50ms"));
    }

    #[test]
    fn hook_error_from_display() {
        let err = HookError::new(format_args!("code {}", 20003));
        assert_eq!(err.reason, "code 20003");
    }
}
