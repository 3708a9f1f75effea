//! Outbound message request and the provider's message resource.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A request to send one message.
///
/// Values are passed to the provider as-is; malformed numbers are rejected
/// by the provider, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessageRequest {
    /// Sender identifier (phone number or messaging service).
    pub from: String,
    /// Recipient identifier.
    pub to: String,
    /// Message text.
    #[serde(rename = "msg", alias = "body")]
    pub body: String,
}

impl SendMessageRequest {
    /// Creates a new request.
    #[must_use]
    pub fn new(from: impl Into<String>, to: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            body: body.into(),
        }
    }
}

/// Delivery status reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Accepted,
    Scheduled,
    Queued,
    Sending,
    Sent,
    Delivered,
    Undelivered,
    Failed,
    Canceled,
    Receiving,
    Received,
    Read,
    #[default]
    #[serde(other)]
    Unknown,
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Accepted => "accepted",
            Self::Scheduled => "scheduled",
            Self::Queued => "queued",
            Self::Sending => "sending",
            Self::Sent => "sent",
            Self::Delivered => "delivered",
            Self::Undelivered => "undelivered",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
            Self::Receiving => "receiving",
            Self::Received => "received",
            Self::Read => "read",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// A message resource as returned by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Provider-assigned identifier.
    pub sid: String,
    #[serde(default)]
    pub status: MessageStatus,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub error_code: Option<i64>,
    #[serde(default)]
    pub error_message: Option<String>,
}
