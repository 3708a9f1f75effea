//! Runner configuration.
//!
//! Loaded from the same environment source as the connectors' settings:
//!
//! - `COURIER_SCOPE`: connector scope (default `sms`)
//! - `COURIER_LIFECYCLE__START_TIMEOUT_SECS` / `COURIER_LIFECYCLE__STOP_TIMEOUT_SECS`
//! - `COURIER_SEND__FROM`, `COURIER_SEND__TO`, `COURIER_SEND__BODY`: if all
//!   are set, one message is sent after startup and the runner exits

use courier_config::ConfigStore;
use courier_lifecycle::LifecycleConfig;
use serde::Deserialize;

/// Runner configuration composed from library configs.
#[derive(Debug, Deserialize)]
pub struct RunnerConfig {
    /// Scope the connector registers its settings under.
    #[serde(default = "default_scope")]
    pub scope: String,

    /// Lifecycle timeouts.
    #[serde(default)]
    pub lifecycle: LifecycleConfig,

    /// One-shot send, if configured.
    #[serde(default)]
    pub send: Option<SendConfig>,
}

/// A message to send once the lifecycle has started.
#[derive(Debug, Clone, Deserialize)]
pub struct SendConfig {
    pub from: String,
    pub to: String,
    pub body: String,
}

fn default_scope() -> String {
    "sms".to_string()
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            scope: default_scope(),
            lifecycle: LifecycleConfig::default(),
            send: None,
        }
    }
}

impl RunnerConfig {
    /// Deserializes the runner's sections from the store's loaded source.
    ///
    /// # Errors
    ///
    /// Returns an error if a present value has the wrong shape.
    pub fn from_store(store: &ConfigStore) -> Result<Self, config::ConfigError> {
        match store.source() {
            Some(source) => source.clone().try_deserialize(),
            None => Ok(Self::default()),
        }
    }
}
