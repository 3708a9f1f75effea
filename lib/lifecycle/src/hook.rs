//! Lifecycle hook trait and the context passed to hooks.

use crate::error::HookError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::time::Instant;

/// The phase a hook is being invoked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Startup, before the component is considered ready.
    Start,
    /// Orderly shutdown.
    Stop,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => f.write_str("start"),
            Self::Stop => f.write_str("stop"),
        }
    }
}

/// Context handed to a hook invocation.
#[derive(Debug, Clone, Copy)]
pub struct HookContext {
    phase: Phase,
    deadline: Instant,
}

impl HookContext {
    /// Creates a context for `phase` that expires at `deadline`.
    #[must_use]
    pub fn new(phase: Phase, deadline: Instant) -> Self {
        Self { phase, deadline }
    }

    /// Returns the phase being run.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Returns the instant after which the sequencer abandons the hook.
    ///
    /// Hooks doing their own I/O can bound it with this deadline.
    #[must_use]
    pub fn deadline(&self) -> Instant {
        self.deadline
    }
}

/// A start/stop callback pair registered with a [`Lifecycle`](crate::Lifecycle).
///
/// `on_start` is invoked before the component is considered ready;
/// `on_stop` is invoked during orderly shutdown, only for hooks whose
/// `on_start` succeeded.
#[async_trait]
pub trait LifecycleHook: Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Called once when the lifecycle starts.
    ///
    /// # Errors
    ///
    /// An error aborts startup and rolls back hooks already started.
    async fn on_start(&self, ctx: &HookContext) -> Result<(), HookError>;

    /// Called once when the lifecycle stops.
    ///
    /// # Errors
    ///
    /// Errors are reported but do not prevent other hooks from stopping.
    async fn on_stop(&self, ctx: &HookContext) -> Result<(), HookError>;
}
