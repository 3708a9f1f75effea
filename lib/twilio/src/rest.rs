//! REST client for the Twilio Messages API.

use crate::client::{ClientFactory, ClientSettings, MessagingClient};
use crate::credential::Credentials;
use crate::error::ClientError;
use crate::message::{Message, SendMessageRequest};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

/// API version segment of every resource path.
const API_VERSION: &str = "2010-04-01";

/// Upper bound on a single request, connection included.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Error body returned by the provider on non-2xx responses.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: Option<i64>,
    message: String,
}

/// HTTP client for the Messages resource.
///
/// Building the client validates nothing beyond the credentials being
/// non-empty; credentials are checked by the provider on the first call.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    credentials: Credentials,
    base_url: String,
}

impl RestClient {
    /// Creates a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if either credential is empty or the HTTP client
    /// cannot be initialized.
    pub fn new(settings: &ClientSettings) -> Result<Self, ClientError> {
        let credentials = &settings.credentials;
        if credentials.username().is_empty() || credentials.password().is_empty() {
            return Err(ClientError::InvalidCredentials {
                reason: "account SID and auth token must not be empty".to_string(),
            });
        }

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ClientError::Transport {
                reason: e.to_string(),
            })?;

        Ok(Self {
            http,
            credentials: credentials.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Returns the account SID requests are made under.
    #[must_use]
    pub fn account_sid(&self) -> &str {
        self.credentials.username()
    }

    /// Returns the underlying HTTP client, for calling resources this crate
    /// does not wrap.
    #[must_use]
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Returns the URL of the account's Messages resource.
    #[must_use]
    pub fn messages_url(&self) -> String {
        format!(
            "{}/{API_VERSION}/Accounts/{}/Messages.json",
            self.base_url,
            self.account_sid()
        )
    }
}

#[async_trait]
impl MessagingClient for RestClient {
    #[instrument(skip(self, request), fields(to = %request.to))]
    async fn create_message(&self, request: &SendMessageRequest) -> Result<Message, ClientError> {
        let form = [
            ("From", request.from.as_str()),
            ("To", request.to.as_str()),
            ("Body", request.body.as_str()),
        ];

        let response = self
            .http
            .post(self.messages_url())
            .basic_auth(self.credentials.username(), Some(self.credentials.password()))
            .form(&form)
            .send()
            .await
            .map_err(|e| ClientError::Transport {
                reason: e.to_string(),
            })?;

        let status = response.status();
        debug!(status = status.as_u16(), "provider responded");

        if status.is_success() {
            return response.json::<Message>().await.map_err(|e| ClientError::Decode {
                reason: e.to_string(),
            });
        }

        let text = response.text().await.map_err(|e| ClientError::Transport {
            reason: e.to_string(),
        })?;
        let (code, message) = match serde_json::from_str::<ApiErrorBody>(&text) {
            Ok(body) => (body.code, body.message),
            Err(_) => (None, text),
        };
        Err(ClientError::Api {
            status: status.as_u16(),
            code,
            message,
        })
    }
}

/// Builds [`RestClient`]s; the production factory.
#[derive(Debug, Clone, Copy, Default)]
pub struct RestClientFactory;

impl ClientFactory for RestClientFactory {
    type Client = RestClient;

    fn build(&self, settings: &ClientSettings) -> Result<RestClient, ClientError> {
        RestClient::new(settings)
    }
}
