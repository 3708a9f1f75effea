//! Core types and utilities shared by courier connectors.
//!
//! This crate provides the `Result` alias used across the workspace and the
//! [`Scope`] type that namespaces a connector instance's configuration.

pub mod error;
pub mod scope;

pub use error::Result;
pub use scope::{ParseScopeError, Scope};
