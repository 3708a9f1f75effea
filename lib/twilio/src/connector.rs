//! The lifecycle-managed Twilio connector.
//!
//! Construction registers configuration defaults and the lifecycle hook but
//! builds no client. The client is built from resolved configuration when the
//! lifecycle starts and dropped when it stops:
//!
//! ```text
//! NotStarted --start--> Started(client) --stop--> Stopped
//!      \______________________stop_______________/
//! ```
//!
//! Stopped is terminal.

use crate::client::{ClientFactory, ClientSettings, MessagingClient};
use crate::credential::Credentials;
use crate::error::ConnectorError;
use crate::message::{Message, SendMessageRequest};
use crate::rest::RestClientFactory;
use async_trait::async_trait;
use courier_config::ConfigProvider;
use courier_core::Scope;
use courier_lifecycle::{HookContext, HookError, Lifecycle, LifecycleHook};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{Instrument, Span, debug, info, info_span, warn};

/// Placeholder account SID registered as the default. Deployments must
/// override it.
pub const DEFAULT_ACCOUNT_SID: &str = "ACXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXX";

/// Placeholder auth token registered as the default. Deployments must
/// override it.
pub const DEFAULT_AUTH_TOKEN: &str = "f2xxxxxxxxxxxxxxxxxxxxxxxxxxxxxx";

/// Default provider API root.
pub const DEFAULT_BASE_URL: &str = "https://api.twilio.com";

/// Setting names, relative to the connector's scope.
pub const ACCOUNT_SID_KEY: &str = "account_sid";
pub const AUTH_TOKEN_KEY: &str = "auth_token";
pub const BASE_URL_KEY: &str = "base_url";

/// Host collaborators handed to the connector at construction.
#[derive(Clone)]
pub struct Params {
    /// Registrar the connector appends its start/stop hook to.
    pub lifecycle: Arc<Lifecycle>,
    /// Configuration the connector registers defaults in and reads from.
    pub config: Arc<dyn ConfigProvider>,
}

enum State<C> {
    NotStarted,
    Started(Arc<C>),
    Stopped,
}

/// A Twilio messaging connector bound to one configuration scope.
pub struct TwilioConnector<F: ClientFactory = RestClientFactory> {
    scope: Scope,
    span: Span,
    config: Arc<dyn ConfigProvider>,
    factory: F,
    state: RwLock<State<F::Client>>,
}

/// Creates a connector using the production REST client and registers it
/// with `params.lifecycle`.
pub fn module(scope: Scope, params: &Params) -> Arc<TwilioConnector> {
    TwilioConnector::new(scope, params, RestClientFactory)
}

impl<F: ClientFactory> TwilioConnector<F> {
    /// Creates a connector, registers its configuration defaults, and appends
    /// its hook to the lifecycle. Does not contact the network.
    pub fn new(scope: Scope, params: &Params, factory: F) -> Arc<Self> {
        let span = info_span!("twilio_connector", scope = %scope);

        let connector = Arc::new(Self {
            scope,
            span,
            config: Arc::clone(&params.config),
            factory,
            state: RwLock::new(State::NotStarted),
        });
        connector.register_defaults();
        params
            .lifecycle
            .append(Arc::clone(&connector) as Arc<dyn LifecycleHook>);
        connector
    }

    /// Returns the configuration scope.
    #[must_use]
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Returns true between a successful start and stop.
    #[must_use]
    pub fn is_started(&self) -> bool {
        matches!(
            *self.state.read().unwrap_or_else(PoisonError::into_inner),
            State::Started(_)
        )
    }

    fn register_defaults(&self) {
        let _entered = self.span.enter();
        for (name, value) in [
            (ACCOUNT_SID_KEY, DEFAULT_ACCOUNT_SID),
            (AUTH_TOKEN_KEY, DEFAULT_AUTH_TOKEN),
            (BASE_URL_KEY, DEFAULT_BASE_URL),
        ] {
            self.config.set_default(&self.scope.key(name), value);
        }
        debug!("registered configuration defaults");
    }

    fn resolved(&self, name: &str, fallback: &str) -> String {
        self.config.get_string_or(&self.scope.key(name), fallback)
    }

    fn settings(&self) -> ClientSettings {
        ClientSettings {
            credentials: Credentials::basic(
                self.resolved(ACCOUNT_SID_KEY, DEFAULT_ACCOUNT_SID),
                self.resolved(AUTH_TOKEN_KEY, DEFAULT_AUTH_TOKEN),
            ),
            base_url: self.resolved(BASE_URL_KEY, DEFAULT_BASE_URL),
        }
    }

    /// Builds the client from resolved configuration.
    ///
    /// Placeholder credentials do not fail here; they fail on the first send.
    ///
    /// # Errors
    ///
    /// Returns `ClientConstruction` if the factory rejects the settings,
    /// `AlreadyStarted` on a second call, and `Stopped` after stop.
    pub fn start(&self) -> courier_core::Result<(), ConnectorError> {
        let _entered = self.span.enter();
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        match *state {
            State::NotStarted => {}
            State::Started(_) => {
                return Err(ConnectorError::AlreadyStarted {
                    scope: self.scope.to_string(),
                }
                .into());
            }
            State::Stopped => return Err(self.stopped_error().into()),
        }

        let settings = self.settings();
        let account_sid = settings.credentials.username();
        info!(
            account_sid,
            base_url = %settings.base_url,
            "starting twilio connector"
        );
        if account_sid == DEFAULT_ACCOUNT_SID
            || settings.credentials.password() == DEFAULT_AUTH_TOKEN
        {
            warn!("using placeholder credentials; sends will be rejected by the provider");
        }

        let client = self
            .factory
            .build(&settings)
            .map_err(|error| ConnectorError::ClientConstruction {
                scope: self.scope.to_string(),
                error,
            })?;
        *state = State::Started(Arc::new(client));
        Ok(())
    }

    /// Drops the client. The connector cannot be started again.
    pub fn stop(&self) {
        let _entered = self.span.enter();
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = State::Stopped;
        info!("stopped twilio connector");
    }

    /// Sends one message through the provider.
    ///
    /// The provider is called exactly once; nothing is retried.
    ///
    /// # Errors
    ///
    /// Returns `NotStarted`/`Stopped` outside the started interval, and
    /// `Provider` carrying the client's error unchanged if the call fails.
    pub async fn send_message(
        &self,
        request: &SendMessageRequest,
    ) -> courier_core::Result<Message, ConnectorError> {
        self.send(request).instrument(self.span.clone()).await
    }

    async fn send(&self, request: &SendMessageRequest) -> courier_core::Result<Message, ConnectorError> {
        let client = self.client()?;
        debug!(to = %request.to, "sending message");

        let message = client
            .create_message(request)
            .await
            .map_err(ConnectorError::Provider)?;

        info!(sid = %message.sid, status = %message.status, "message created");
        Ok(message)
    }

    /// Returns the raw client.
    ///
    /// This is an escape hatch for provider features the connector does not
    /// wrap. Calls made through it bypass the connector entirely: they are
    /// not logged here, and the handle stays usable after the connector stops.
    ///
    /// # Errors
    ///
    /// Returns `NotStarted` before start and `Stopped` after stop.
    pub fn client(&self) -> courier_core::Result<Arc<F::Client>, ConnectorError> {
        match &*self.state.read().unwrap_or_else(PoisonError::into_inner) {
            State::Started(client) => Ok(Arc::clone(client)),
            State::NotStarted => Err(ConnectorError::NotStarted {
                scope: self.scope.to_string(),
            }
            .into()),
            State::Stopped => Err(self.stopped_error().into()),
        }
    }

    fn stopped_error(&self) -> ConnectorError {
        ConnectorError::Stopped {
            scope: self.scope.to_string(),
        }
    }
}

#[async_trait]
impl<F: ClientFactory> LifecycleHook for TwilioConnector<F> {
    fn name(&self) -> &str {
        self.scope.as_str()
    }

    async fn on_start(&self, _ctx: &HookContext) -> Result<(), HookError> {
        self.start()
            .map_err(|report| HookError::new(report.current_context()))
    }

    async fn on_stop(&self, _ctx: &HookContext) -> Result<(), HookError> {
        self.stop();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use crate::fake::FakeClientFactory;
    use courier_config::ConfigStore;
    use tracing_test::traced_test;

    fn params() -> (Params, Arc<ConfigStore>) {
        let store = Arc::new(ConfigStore::new());
        let params = Params {
            lifecycle: Arc::new(Lifecycle::new()),
            config: Arc::clone(&store) as Arc<dyn ConfigProvider>,
        };
        (params, store)
    }

    fn scope(name: &str) -> Scope {
        name.parse().unwrap()
    }

    fn request() -> SendMessageRequest {
        SendMessageRequest::new("+15550000000", "+15550000001", "hello")
    }

    #[test]
    fn construction_registers_scoped_defaults() {
        let (params, store) = params();
        let connector = TwilioConnector::new(scope("sms"), &params, FakeClientFactory::succeeding());

        assert_eq!(
            store.get_string("sms.account_sid").as_deref(),
            Some(DEFAULT_ACCOUNT_SID)
        );
        assert_eq!(
            store.get_string("sms.auth_token").as_deref(),
            Some(DEFAULT_AUTH_TOKEN)
        );
        assert_eq!(
            store.get_string("sms.base_url").as_deref(),
            Some(DEFAULT_BASE_URL)
        );
        assert_eq!(params.lifecycle.len(), 1);
        assert!(!connector.is_started());
    }

    #[test]
    fn scopes_do_not_share_configuration() {
        let (params, store) = params();
        let _sms = TwilioConnector::new(scope("sms"), &params, FakeClientFactory::succeeding());
        let _eu = TwilioConnector::new(scope("sms_eu"), &params, FakeClientFactory::succeeding());

        store.set("sms_eu.account_sid", "ACeu");

        assert_eq!(
            store.get_string("sms.account_sid").as_deref(),
            Some(DEFAULT_ACCOUNT_SID)
        );
        assert_eq!(store.get_string("sms_eu.account_sid").as_deref(), Some("ACeu"));
    }

    #[test]
    fn start_builds_client_from_resolved_configuration() {
        let (params, store) = params();
        let factory = FakeClientFactory::succeeding();
        let connector = TwilioConnector::new(scope("sms"), &params, factory.clone());

        store.set("sms.account_sid", "AClive");
        store.set("sms.auth_token", "live-token");
        connector.start().unwrap();

        let builds = factory.builds();
        assert_eq!(builds.len(), 1);
        assert_eq!(builds[0].credentials, Credentials::basic("AClive", "live-token"));
        assert_eq!(builds[0].base_url, DEFAULT_BASE_URL);
        assert!(connector.is_started());
    }

    #[tokio::test]
    async fn send_before_start_is_not_started() {
        let (params, _) = params();
        let factory = FakeClientFactory::succeeding();
        let connector = TwilioConnector::new(scope("sms"), &params, factory.clone());

        let err = connector.send_message(&request()).await.unwrap_err();

        assert_eq!(
            err.current_context(),
            &ConnectorError::NotStarted {
                scope: "sms".to_string()
            }
        );
        assert_eq!(factory.call_count(), 0);
        assert!(connector.client().is_err());
    }

    #[tokio::test]
    async fn send_passes_fields_through_unchanged() {
        let (params, _) = params();
        let factory = FakeClientFactory::with_sid("SM42");
        let connector = TwilioConnector::new(scope("sms"), &params, factory.clone());
        connector.start().unwrap();

        let request = SendMessageRequest::new("+1 (555) 000-0000", "whatsapp:+15550000001", "héllo\n👋");
        let message = connector.send_message(&request).await.unwrap();

        assert_eq!(message.sid, "SM42");
        assert_eq!(factory.calls(), vec![request]);
    }

    #[tokio::test]
    async fn provider_failure_is_returned_after_one_call() {
        let (params, _) = params();
        let provider_error = ClientError::Api {
            status: 401,
            code: Some(20003),
            message: "Authenticate".to_string(),
        };
        let factory = FakeClientFactory::failing(provider_error.clone());
        let connector = TwilioConnector::new(scope("sms"), &params, factory.clone());
        connector.start().unwrap();

        let err = connector.send_message(&request()).await.unwrap_err();

        assert_eq!(
            err.current_context(),
            &ConnectorError::Provider(provider_error)
        );
        assert_eq!(factory.call_count(), 1);
    }

    #[test]
    fn construction_failure_fails_start() {
        let (params, _) = params();
        let factory = FakeClientFactory::failing_construction(ClientError::InvalidCredentials {
            reason: "malformed".to_string(),
        });
        let connector = TwilioConnector::new(scope("sms"), &params, factory);

        let err = connector.start().unwrap_err();

        assert!(matches!(
            err.current_context(),
            ConnectorError::ClientConstruction { scope, .. } if scope == "sms"
        ));
        assert!(!connector.is_started());
    }

    #[test]
    fn start_twice_is_rejected() {
        let (params, _) = params();
        let connector = TwilioConnector::new(scope("sms"), &params, FakeClientFactory::succeeding());
        connector.start().unwrap();

        let err = connector.start().unwrap_err();
        assert!(matches!(
            err.current_context(),
            ConnectorError::AlreadyStarted { .. }
        ));
    }

    #[tokio::test]
    async fn stopped_connector_rejects_use_and_restart() {
        let (params, _) = params();
        let connector = TwilioConnector::new(scope("sms"), &params, FakeClientFactory::succeeding());
        connector.start().unwrap();
        connector.stop();

        let err = connector.send_message(&request()).await.unwrap_err();
        assert!(matches!(err.current_context(), ConnectorError::Stopped { .. }));

        let err = connector.start().unwrap_err();
        assert!(matches!(err.current_context(), ConnectorError::Stopped { .. }));
    }

    #[tokio::test]
    async fn client_escape_hatch_returns_started_client() {
        let (params, _) = params();
        let factory = FakeClientFactory::with_sid("SMraw");
        let connector = TwilioConnector::new(scope("sms"), &params, factory.clone());
        connector.start().unwrap();

        let client = connector.client().unwrap();
        let message = client.create_message(&request()).await.unwrap();

        assert_eq!(message.sid, "SMraw");
        assert_eq!(factory.call_count(), 1);
    }

    #[tokio::test]
    async fn lifecycle_drives_start_and_stop() {
        let (params, _) = params();
        let connector = TwilioConnector::new(scope("sms"), &params, FakeClientFactory::succeeding());

        params.lifecycle.start().await.unwrap();
        assert!(connector.is_started());

        // No send in between; stop must still succeed.
        params.lifecycle.stop().await.unwrap();
        assert!(!connector.is_started());
    }

    #[tokio::test]
    async fn lifecycle_start_fails_when_client_cannot_be_built() {
        let (params, _) = params();
        let _connector = TwilioConnector::new(
            scope("sms"),
            &params,
            FakeClientFactory::failing_construction(ClientError::InvalidCredentials {
                reason: "malformed".to_string(),
            }),
        );

        let err = params.lifecycle.start().await.unwrap_err();
        assert!(err.to_string().contains("failed to build client"));
    }

    #[tokio::test]
    #[traced_test]
    async fn placeholder_credentials_start_and_send() {
        let (params, _) = params();
        let factory = FakeClientFactory::with_sid("SMxxxx");
        let connector = TwilioConnector::new(scope("sms"), &params, factory.clone());

        params.lifecycle.start().await.unwrap();
        let message = connector
            .send_message(&SendMessageRequest::new("+15550000000", "+15550000001", "hello"))
            .await
            .unwrap();

        assert_eq!(message.sid, "SMxxxx");
        assert_eq!(
            factory.calls(),
            vec![SendMessageRequest::new("+15550000000", "+15550000001", "hello")]
        );
        assert!(logs_contain("using placeholder credentials"));
        assert!(logs_contain("SMxxxx"));

        params.lifecycle.stop().await.unwrap();
    }

    #[tokio::test]
    #[traced_test]
    async fn auth_token_is_never_logged() {
        let (params, store) = params();
        let connector = TwilioConnector::new(scope("sms"), &params, FakeClientFactory::succeeding());
        store.set("sms.account_sid", "AClogged");
        store.set("sms.auth_token", "do-not-log-me");

        connector.start().unwrap();
        connector.send_message(&request()).await.unwrap();
        connector.stop();

        assert!(logs_contain("AClogged"));
        assert!(!logs_contain("do-not-log-me"));
    }

    #[tokio::test]
    async fn environment_override_reaches_start_for_any_scope_case() {
        let env: config::Map<String, String> = [
            ("COURIER_SMS_EU__ACCOUNT_SID".to_string(), "ACenv".to_string()),
            ("COURIER_SMS_EU__AUTH_TOKEN".to_string(), "env-token".to_string()),
        ]
        .into_iter()
        .collect();
        let store = Arc::new(ConfigStore::from_environment(Some(env)).unwrap());
        let params = Params {
            lifecycle: Arc::new(Lifecycle::new()),
            config: Arc::clone(&store) as Arc<dyn ConfigProvider>,
        };
        let upper = FakeClientFactory::succeeding();
        let lower = FakeClientFactory::succeeding();
        let _upper = TwilioConnector::new(scope("SMS_EU"), &params, upper.clone());
        let _lower = TwilioConnector::new(scope("sms_eu"), &params, lower.clone());

        params.lifecycle.start().await.unwrap();

        for factory in [upper, lower] {
            let builds = factory.builds();
            assert_eq!(builds[0].credentials, Credentials::basic("ACenv", "env-token"));
            assert_eq!(builds[0].base_url, DEFAULT_BASE_URL);
        }
    }

    #[tokio::test]
    async fn two_scopes_resolve_independently() {
        let (params, store) = params();
        let sms_factory = FakeClientFactory::succeeding();
        let eu_factory = FakeClientFactory::succeeding();
        let _sms = TwilioConnector::new(scope("sms"), &params, sms_factory.clone());
        let _eu = TwilioConnector::new(scope("sms_eu"), &params, eu_factory.clone());

        store.set("sms_eu.account_sid", "ACeu");
        params.lifecycle.start().await.unwrap();

        assert_eq!(
            sms_factory.builds()[0].credentials.username(),
            DEFAULT_ACCOUNT_SID
        );
        assert_eq!(eu_factory.builds()[0].credentials.username(), "ACeu");
    }

    #[test]
    fn module_uses_rest_factory() {
        let (params, store) = params();
        let connector = module(scope("sms"), &params);
        store.set("sms.base_url", "http://127.0.0.1:9");

        connector.start().unwrap();
        let client = connector.client().unwrap();
        assert_eq!(
            client.messages_url(),
            format!("http://127.0.0.1:9/2010-04-01/Accounts/{DEFAULT_ACCOUNT_SID}/Messages.json")
        );
    }
}
