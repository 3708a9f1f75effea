//! Lifecycle sequencing for courier components.
//!
//! Components register a [`LifecycleHook`] with a [`Lifecycle`] at
//! construction time. The host then calls [`Lifecycle::start`] once before
//! serving and [`Lifecycle::stop`] once during shutdown.

pub mod error;
pub mod hook;
pub mod lifecycle;

pub use error::{HookError, LifecycleError};
pub use hook::{HookContext, LifecycleHook, Phase};
pub use lifecycle::{Lifecycle, LifecycleConfig};
