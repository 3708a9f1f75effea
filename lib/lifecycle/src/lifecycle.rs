//! The lifecycle sequencer.
//!
//! Hooks start in registration order and stop in reverse order. If a hook
//! fails to start, every hook that already started is stopped before the
//! error is returned. Each hook invocation is bounded by the phase timeout.

use crate::error::{HookError, LifecycleError};
use crate::hook::{HookContext, LifecycleHook, Phase};
use serde::Deserialize;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Timeouts applied to hook invocations.
#[derive(Debug, Clone, Deserialize)]
pub struct LifecycleConfig {
    /// Per-hook start timeout, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub start_timeout_secs: u64,

    /// Per-hook stop timeout, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub stop_timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    15
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            start_timeout_secs: default_timeout_secs(),
            stop_timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Idle,
    Starting,
    Running { started: usize },
    Stopping,
    Stopped,
}

/// Registrar and sequencer for [`LifecycleHook`]s.
pub struct Lifecycle {
    hooks: Mutex<Vec<Arc<dyn LifecycleHook>>>,
    state: Mutex<RunState>,
    start_timeout: Duration,
    stop_timeout: Duration,
}

impl Lifecycle {
    /// Creates a lifecycle with the default timeouts.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&LifecycleConfig::default())
    }

    /// Creates a lifecycle with the given timeouts.
    #[must_use]
    pub fn with_config(config: &LifecycleConfig) -> Self {
        Self::with_timeouts(
            Duration::from_secs(config.start_timeout_secs),
            Duration::from_secs(config.stop_timeout_secs),
        )
    }

    /// Creates a lifecycle with explicit per-hook timeouts.
    #[must_use]
    pub fn with_timeouts(start_timeout: Duration, stop_timeout: Duration) -> Self {
        Self {
            hooks: Mutex::new(Vec::new()),
            state: Mutex::new(RunState::Idle),
            start_timeout,
            stop_timeout,
        }
    }

    /// Registers a hook.
    ///
    /// Hooks appended after [`start`](Self::start) has been called are never
    /// started.
    pub fn append(&self, hook: Arc<dyn LifecycleHook>) {
        debug!(hook = hook.name(), "registered lifecycle hook");
        self.hooks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(hook);
    }

    /// Returns the number of registered hooks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hooks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns true if no hooks are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs every hook's `on_start` in registration order.
    ///
    /// # Errors
    ///
    /// Returns the first hook failure or timeout, after stopping the hooks
    /// that had already started. Returns `AlreadyStarted` on a second call.
    pub async fn start(&self) -> courier_core::Result<(), LifecycleError> {
        self.transition(RunState::Idle, RunState::Starting)
            .ok_or(LifecycleError::AlreadyStarted)?;

        let hooks = self.snapshot();
        info!(hooks = hooks.len(), "starting lifecycle");

        for (index, hook) in hooks.iter().enumerate() {
            if let Err(e) = self.invoke(hook.as_ref(), Phase::Start).await {
                warn!(hook = hook.name(), error = %e, "start failed, rolling back");
                // Rollback errors are logged by stop_all; the start failure wins.
                let _ = self.stop_all(&hooks[..index]).await;
                self.set_state(RunState::Stopped);
                return Err(e.into());
            }
        }

        self.set_state(RunState::Running {
            started: hooks.len(),
        });
        info!("lifecycle started");
        Ok(())
    }

    /// Runs `on_stop` for every started hook, in reverse order.
    ///
    /// Every hook is given the chance to stop even if an earlier one fails.
    ///
    /// # Errors
    ///
    /// Returns the first stop failure, or `NotRunning` if the lifecycle was
    /// never started or is already stopped.
    pub async fn stop(&self) -> courier_core::Result<(), LifecycleError> {
        let started = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            match *state {
                RunState::Running { started } => {
                    *state = RunState::Stopping;
                    started
                }
                _ => return Err(LifecycleError::NotRunning.into()),
            }
        };

        let hooks = self.snapshot();
        info!(hooks = started, "stopping lifecycle");
        let result = self.stop_all(&hooks[..started]).await;
        self.set_state(RunState::Stopped);
        info!("lifecycle stopped");
        result?;
        Ok(())
    }

    async fn stop_all(&self, hooks: &[Arc<dyn LifecycleHook>]) -> Result<(), LifecycleError> {
        let mut first_error = None;
        for hook in hooks.iter().rev() {
            if let Err(e) = self.invoke(hook.as_ref(), Phase::Stop).await {
                warn!(hook = hook.name(), error = %e, "stop failed");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    async fn invoke(&self, hook: &dyn LifecycleHook, phase: Phase) -> Result<(), LifecycleError> {
        let timeout = match phase {
            Phase::Start => self.start_timeout,
            Phase::Stop => self.stop_timeout,
        };
        let ctx = HookContext::new(phase, Instant::now() + timeout);
        debug!(hook = hook.name(), %phase, "invoking lifecycle hook");

        let call = async {
            match phase {
                Phase::Start => hook.on_start(&ctx).await,
                Phase::Stop => hook.on_stop(&ctx).await,
            }
        };

        match tokio::time::timeout_at(ctx.deadline(), call).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(HookError { reason })) => Err(LifecycleError::HookFailed {
                hook: hook.name().to_string(),
                phase,
                reason,
            }),
            Err(_) => Err(LifecycleError::Timeout {
                hook: hook.name().to_string(),
                phase,
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }

    fn snapshot(&self) -> Vec<Arc<dyn LifecycleHook>> {
        self.hooks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn transition(&self, from: RunState, to: RunState) -> Option<()> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state != from {
            return None;
        }
        *state = to;
        Some(())
    }

    fn set_state(&self, to: RunState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = to;
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}
