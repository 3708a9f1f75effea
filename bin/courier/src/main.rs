//! Runs a Twilio connector under a managed lifecycle.
//!
//! Starts the lifecycle, optionally sends one configured message, then waits
//! for Ctrl-C (or exits after the send) and stops the lifecycle.

mod config;
mod error;

use crate::config::RunnerConfig;
use crate::error::RunnerError;
use courier_config::{ConfigProvider, ConfigStore};
use courier_core::Scope;
use courier_lifecycle::Lifecycle;
use courier_twilio::{Params, SendMessageRequest};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "courier exited with an error");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> courier_core::Result<(), RunnerError> {
    let store = Arc::new(ConfigStore::from_env().map_err(|e| RunnerError::Config {
        reason: e.to_string(),
    })?);
    let runner = RunnerConfig::from_store(&store).map_err(|e| RunnerError::Config {
        reason: e.to_string(),
    })?;
    let scope: Scope = runner.scope.parse().map_err(|e: courier_core::ParseScopeError| {
        RunnerError::Config {
            reason: e.to_string(),
        }
    })?;
    info!(%scope, "loaded configuration");

    let params = Params {
        lifecycle: Arc::new(Lifecycle::with_config(&runner.lifecycle)),
        config: Arc::clone(&store) as Arc<dyn ConfigProvider>,
    };
    let connector = courier_twilio::module(scope, &params);

    params
        .lifecycle
        .start()
        .await
        .map_err(|e| RunnerError::Startup {
            reason: e.to_string(),
        })?;

    let outcome = match runner.send {
        Some(send) => {
            let request = SendMessageRequest::new(send.from, send.to, send.body);
            connector
                .send_message(&request)
                .await
                .map(|message| info!(sid = %message.sid, "sent configured message"))
                .map_err(|e| RunnerError::Send {
                    reason: e.to_string(),
                })
        }
        None => {
            info!("running; press Ctrl-C to stop");
            tokio::signal::ctrl_c()
                .await
                .map_err(|e| RunnerError::Signal {
                    reason: e.to_string(),
                })
        }
    };

    // Stop even if the send failed; the first error is the one reported.
    let stopped = params
        .lifecycle
        .stop()
        .await
        .map_err(|e| RunnerError::Shutdown {
            reason: e.to_string(),
        });

    outcome?;
    stopped?;
    Ok(())
}
