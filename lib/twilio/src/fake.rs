//! In-process fake provider.
//!
//! Records every request and answers with a fabricated message or a fixed
//! error. Clones of a [`FakeClientFactory`] share their recordings, so a test
//! can keep one clone and hand the other to the connector.

use crate::client::{ClientFactory, ClientSettings, MessagingClient};
use crate::error::ClientError;
use crate::message::{Message, MessageStatus, SendMessageRequest};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};
use ulid::Ulid;

#[derive(Debug, Clone)]
enum Behavior {
    Succeed { sid: Option<String> },
    Fail(ClientError),
}

#[derive(Debug, Default)]
struct Recordings {
    builds: Mutex<Vec<ClientSettings>>,
    calls: Mutex<Vec<SendMessageRequest>>,
}

/// A fake client answering from a fixed behavior.
#[derive(Debug, Clone)]
pub struct FakeClient {
    behavior: Behavior,
    recordings: Arc<Recordings>,
}

#[async_trait]
impl MessagingClient for FakeClient {
    async fn create_message(&self, request: &SendMessageRequest) -> Result<Message, ClientError> {
        self.recordings
            .calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        match &self.behavior {
            Behavior::Succeed { sid } => Ok(Message {
                sid: sid.clone().unwrap_or_else(|| format!("SM{}", Ulid::new())),
                status: MessageStatus::Queued,
                from: Some(request.from.clone()),
                to: request.to.clone(),
                body: request.body.clone(),
                error_code: None,
                error_message: None,
            }),
            Behavior::Fail(e) => Err(e.clone()),
        }
    }
}

/// Factory producing [`FakeClient`]s.
#[derive(Debug, Clone)]
pub struct FakeClientFactory {
    behavior: Behavior,
    construction_error: Option<ClientError>,
    recordings: Arc<Recordings>,
}

impl FakeClientFactory {
    /// Clients succeed with a generated message SID.
    #[must_use]
    pub fn succeeding() -> Self {
        Self::with_behavior(Behavior::Succeed { sid: None })
    }

    /// Clients succeed with the given message SID.
    #[must_use]
    pub fn with_sid(sid: impl Into<String>) -> Self {
        Self::with_behavior(Behavior::Succeed {
            sid: Some(sid.into()),
        })
    }

    /// Clients fail every call with `error`.
    #[must_use]
    pub fn failing(error: ClientError) -> Self {
        Self::with_behavior(Behavior::Fail(error))
    }

    /// Building a client fails with `error`.
    #[must_use]
    pub fn failing_construction(error: ClientError) -> Self {
        Self {
            construction_error: Some(error),
            ..Self::succeeding()
        }
    }

    fn with_behavior(behavior: Behavior) -> Self {
        Self {
            behavior,
            construction_error: None,
            recordings: Arc::default(),
        }
    }

    /// Returns the settings of every client built so far.
    #[must_use]
    pub fn builds(&self) -> Vec<ClientSettings> {
        self.recordings
            .builds
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns every request received by clients from this factory.
    #[must_use]
    pub fn calls(&self) -> Vec<SendMessageRequest> {
        self.recordings
            .calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of requests received.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls().len()
    }
}

impl ClientFactory for FakeClientFactory {
    type Client = FakeClient;

    fn build(&self, settings: &ClientSettings) -> Result<FakeClient, ClientError> {
        if let Some(e) = &self.construction_error {
            return Err(e.clone());
        }
        self.recordings
            .builds
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(settings.clone());
        Ok(FakeClient {
            behavior: self.behavior.clone(),
            recordings: Arc::clone(&self.recordings),
        })
    }
}
