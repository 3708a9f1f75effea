//! Error types for the config crate.

use std::fmt;

/// Errors from loading configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A configuration source could not be loaded.
    LoadFailed { reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoadFailed { reason } => {
                write!(f, "failed to load configuration: {reason}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<config::ConfigError> for ConfigError {
    fn from(e: config::ConfigError) -> Self {
        Self::LoadFailed {
            reason: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_failed_display() {
        let err = ConfigError::LoadFailed {
            reason: "bad value".to_string(),
        };
        assert!(err.to_string().contains("failed to load configuration"));
        assert!(err.to_string().contains("bad value"));
    }
}
