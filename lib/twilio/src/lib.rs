//! Lifecycle-managed Twilio messaging connector.
//!
//! This crate provides:
//!
//! - **TwilioConnector**: Registers scoped configuration defaults, builds its
//!   client when the lifecycle starts, and sends outbound messages
//! - **RestClient**: Minimal client for the Messages resource
//! - **FakeClientFactory**: In-process fake provider for tests
//!
//! ```rust,ignore
//! let params = Params { lifecycle, config };
//! let sms = courier_twilio::module("sms".parse()?, &params);
//! params.lifecycle.start().await?;
//! sms.send_message(&SendMessageRequest::new(from, to, "hello")).await?;
//! ```

pub mod client;
pub mod connector;
pub mod credential;
pub mod error;
pub mod fake;
pub mod message;
pub mod rest;

pub use client::{ClientFactory, ClientSettings, MessagingClient};
pub use connector::{
    DEFAULT_ACCOUNT_SID, DEFAULT_AUTH_TOKEN, DEFAULT_BASE_URL, Params, TwilioConnector, module,
};
pub use credential::Credentials;
pub use error::{ClientError, ConnectorError};
pub use fake::{FakeClient, FakeClientFactory};
pub use message::{Message, MessageStatus, SendMessageRequest};
pub use rest::{RestClient, RestClientFactory};
