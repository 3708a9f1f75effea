//! Configuration scopes.
//!
//! A scope is the namespace a connector instance registers its configuration
//! under. Two connectors with different scopes never share a key. Every way
//! of building a scope goes through the same validation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Separator between a scope and the setting name in a configuration key.
pub const KEY_SEPARATOR: char = '.';

/// Error returned when parsing a scope from a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseScopeError {
    /// The rejected input.
    pub input: String,
    /// The reason the input was rejected.
    pub reason: &'static str,
}

impl fmt::Display for ParseScopeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid scope '{}': {}", self.input, self.reason)
    }
}

impl std::error::Error for ParseScopeError {}

/// Namespace for a connector instance's configuration keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Scope(String);

impl Scope {
    /// Creates a scope.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is empty or contains `.`.
    pub fn new(name: impl Into<String>) -> Result<Self, ParseScopeError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ParseScopeError {
                input: name,
                reason: "scope must not be empty",
            });
        }
        // A separator inside the scope would make its keys collide with a
        // nested scope's keys.
        if name.contains(KEY_SEPARATOR) {
            return Err(ParseScopeError {
                input: name,
                reason: "scope must not contain '.'",
            });
        }
        Ok(Self(name))
    }

    /// Returns the scope name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the fully-qualified configuration key for `name`.
    ///
    /// The key for `account_sid` in scope `sms` is `"sms.account_sid"`.
    #[must_use]
    pub fn key(&self, name: &str) -> String {
        format!("{}{KEY_SEPARATOR}{name}", self.0)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Scope {
    type Err = ParseScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<&str> for Scope {
    type Error = ParseScopeError;

    fn try_from(name: &str) -> Result<Self, Self::Error> {
        Self::new(name)
    }
}

impl TryFrom<String> for Scope {
    type Error = ParseScopeError;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        Self::new(name)
    }
}

impl From<Scope> for String {
    fn from(scope: Scope) -> Self {
        scope.0
    }
}
