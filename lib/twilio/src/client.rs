//! Messaging client abstraction.
//!
//! The connector only needs one provider call, so the client surface is a
//! single method. The factory indirection lets the connector build its client
//! at start time from resolved configuration, and lets tests substitute a
//! fake without a network.

use crate::credential::Credentials;
use crate::error::ClientError;
use crate::message::{Message, SendMessageRequest};
use async_trait::async_trait;

/// Settings a client is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    /// Account SID and auth token.
    pub credentials: Credentials,
    /// Provider API root, without a trailing path.
    pub base_url: String,
}

/// A client able to create outbound messages.
#[async_trait]
pub trait MessagingClient: Send + Sync + 'static {
    /// Creates (sends) one message.
    ///
    /// # Errors
    ///
    /// Returns the provider's error; implementations must not retry.
    async fn create_message(&self, request: &SendMessageRequest) -> Result<Message, ClientError>;
}

/// Builds a [`MessagingClient`] from settings.
pub trait ClientFactory: Send + Sync + 'static {
    /// The client type produced.
    type Client: MessagingClient;

    /// Builds a client. Must not contact the network.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot produce a client.
    fn build(&self, settings: &ClientSettings) -> Result<Self::Client, ClientError>;
}
