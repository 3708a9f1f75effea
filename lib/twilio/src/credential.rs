//! Provider credentials.
//!
//! The secret half of a credential is never included in `Debug` output, so
//! credentials can be logged or embedded in error context safely.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder printed in place of secrets.
const REDACTED: &str = "[redacted]";

/// Username and password pair used for HTTP basic authentication.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Creates basic auth credentials.
    #[must_use]
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Returns the public identifier.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the secret.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &REDACTED)
            .finish()
    }
}
