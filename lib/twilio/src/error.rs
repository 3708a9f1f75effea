//! Error types for the Twilio connector.
//!
//! - `ClientError`: Failures reported by the messaging client, passed through
//!   to callers unchanged
//! - `ConnectorError`: Lifecycle misuse plus a wrapper around `ClientError`

use std::fmt;

/// Errors from the messaging client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Credentials were rejected while building the client.
    InvalidCredentials { reason: String },
    /// The request never produced a response.
    Transport { reason: String },
    /// The provider answered with an error status.
    Api {
        status: u16,
        code: Option<i64>,
        message: String,
    },
    /// The provider's response could not be decoded.
    Decode { reason: String },
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCredentials { reason } => {
                write!(f, "invalid credentials: {reason}")
            }
            Self::Transport { reason } => write!(f, "transport error: {reason}"),
            Self::Api {
                status,
                code: Some(code),
                message,
            } => {
                write!(f, "provider returned {status} (code {code}): {message}")
            }
            Self::Api {
                status, message, ..
            } => {
                write!(f, "provider returned {status}: {message}")
            }
            Self::Decode { reason } => {
                write!(f, "failed to decode provider response: {reason}")
            }
        }
    }
}

impl std::error::Error for ClientError {}

/// Errors from connector operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectorError {
    /// The connector has not been started.
    NotStarted { scope: String },
    /// `start` was called on a connector that is already running.
    AlreadyStarted { scope: String },
    /// The connector has been stopped and cannot be used or restarted.
    Stopped { scope: String },
    /// The client could not be built from the resolved configuration.
    ClientConstruction { scope: String, error: ClientError },
    /// The provider call failed.
    Provider(ClientError),
}

impl fmt::Display for ConnectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted { scope } => {
                write!(f, "connector '{scope}' has not been started")
            }
            Self::AlreadyStarted { scope } => {
                write!(f, "connector '{scope}' is already started")
            }
            Self::Stopped { scope } => write!(f, "connector '{scope}' is stopped"),
            Self::ClientConstruction { scope, error } => {
                write!(f, "failed to build client for connector '{scope}': {error}")
            }
            Self::Provider(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ConnectorError {}

impl From<ClientError> for ConnectorError {
    fn from(e: ClientError) -> Self {
        Self::Provider(e)
    }
}
