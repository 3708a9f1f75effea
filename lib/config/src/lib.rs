//! Configuration for courier connectors.
//!
//! This crate provides:
//!
//! - **ConfigProvider**: The capability connectors use to register defaults
//!   and read resolved values
//! - **ConfigStore**: A layered store fed from the environment

pub mod error;
pub mod provider;
pub mod store;

pub use error::ConfigError;
pub use provider::ConfigProvider;
pub use store::{ConfigStore, ENV_PREFIX};
