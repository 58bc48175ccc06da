// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! High-level client for one Nest account.
//!
//! [`NestClient`] ties together token handling, snapshot retrieval and
//! command routing. Results are published to the injected
//! [`StateStore`] under the client's device id.

use std::sync::Arc;
use std::time::Duration;

use crate::auth::{
    AuthManager, AuthToken, Credentials, DEFAULT_LOGIN_HOST, TokenSource, TokenStore,
};
use crate::command::{Command, CommandRouter, InvalidCommandPolicy};
use crate::error::{Error, Result, RoutingError};
#[cfg(feature = "http")]
use crate::protocol::{HttpConfig, HttpTransport};
use crate::protocol::{ApiResponse, Transport};
use crate::snapshot::{DeviceSnapshot, SnapshotFetcher, TYPE_CLASS};
use crate::state::{DeviceStatus, StateStore};

/// Result of a command that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    /// The write was accepted by the platform.
    Sent(ApiResponse),
    /// The command was invalid and dropped without any request.
    Ignored(RoutingError),
}

impl CommandOutcome {
    /// Returns `true` if a request was sent.
    #[must_use]
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent(_))
    }

    /// Returns the platform's reply, if a request was sent.
    #[must_use]
    pub fn response(&self) -> Option<&ApiResponse> {
        match self {
            Self::Sent(response) => Some(response),
            Self::Ignored(_) => None,
        }
    }
}

/// A connected Nest account.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
///
/// use nestor_lib::{Command, Credentials, FileTokenStore, HttpConfig, MemoryStateStore, NestClient};
///
/// # async fn example() -> nestor_lib::Result<()> {
/// let state = Arc::new(MemoryStateStore::new());
/// let client = NestClient::builder("nest", Credentials::new("me@example.com", "secret"))
///     .build_http(HttpConfig::new(), FileTokenStore::new("auth.json"), Arc::clone(&state))?;
///
/// let snapshot = client.connect().await?;
/// println!("{} thermostats", snapshot.thermostats().len());
///
/// client.send(&"temp-Kitchen-70".parse()?).await?;
/// client.send(&Command::Away).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct NestClient<T, K, S> {
    device_id: String,
    transport: Arc<T>,
    auth: AuthManager<Arc<T>, K>,
    fetcher: SnapshotFetcher<Arc<T>, Arc<S>>,
    router: CommandRouter,
    state: Arc<S>,
    refresh_delay: Option<Duration>,
}

impl NestClient<(), (), ()> {
    /// Starts building a client.
    pub fn builder(device_id: impl Into<String>, credentials: Credentials) -> NestClientBuilder {
        NestClientBuilder::new(device_id, credentials)
    }
}

impl<T: Transport, K: TokenStore, S: StateStore> NestClient<T, K, S> {
    /// Returns the key under which results are published.
    #[must_use]
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Returns the state store.
    #[must_use]
    pub fn state_store(&self) -> &Arc<S> {
        &self.state
    }

    /// Returns the token held in memory, valid or not.
    #[must_use]
    pub fn token(&self) -> Option<AuthToken> {
        self.auth.current()
    }

    /// Returns the last published status.
    #[must_use]
    pub fn state(&self) -> Option<DeviceStatus> {
        self.state.get_device_state(&self.device_id)
    }

    /// Returns the last successfully fetched snapshot.
    ///
    /// `None` after a failed fetch: the state is unknown.
    #[must_use]
    pub fn snapshot(&self) -> Option<DeviceSnapshot> {
        self.state().and_then(|status| status.value)
    }

    /// Authenticates and fetches the first snapshot.
    ///
    /// A valid cached token is reused; otherwise the client logs in.
    ///
    /// # Errors
    ///
    /// Returns the authentication or fetch failure. The state store holds
    /// `err` afterwards.
    pub async fn connect(&self) -> Result<DeviceSnapshot> {
        let (token, _) = self.authenticate().await?;
        self.fetcher.fetch(&token, &self.device_id).await
    }

    /// Re-fetches the snapshot.
    ///
    /// Returns `Ok(None)` without touching the network if the client has never
    /// held a token. An expired token is renewed first.
    ///
    /// # Errors
    ///
    /// See [`connect`](Self::connect).
    pub async fn refresh(&self) -> Result<Option<DeviceSnapshot>> {
        if self.auth.current().is_none() {
            tracing::debug!(device_id = %self.device_id, "Not connected, skipping refresh");
            return Ok(None);
        }
        let (token, _) = self.authenticate().await?;
        self.fetcher.fetch(&token, &self.device_id).await.map(Some)
    }

    /// Sends a command.
    ///
    /// The command is routed against the last published snapshot. A fresh one
    /// is fetched first when the call had to log in or nothing has been
    /// published yet. After a successful write the client waits for the
    /// configured delay and refreshes the snapshot.
    ///
    /// # Errors
    ///
    /// Returns `Error::Routing` for invalid commands under
    /// [`InvalidCommandPolicy::Reject`], `Error::Api` if the platform refuses
    /// the write, and authentication, transport or fetch failures.
    pub async fn send(&self, command: &Command) -> Result<CommandOutcome> {
        let (token, source) = self.authenticate().await?;

        let published = match source {
            TokenSource::Login => None,
            TokenSource::Memory | TokenSource::Cache => self.snapshot(),
        };
        let snapshot = match published {
            Some(snapshot) => snapshot,
            None => self.fetcher.fetch(&token, &self.device_id).await?,
        };

        let request = match CommandRouter::route(command, &snapshot, &token) {
            Ok(request) => request,
            Err(e) => return self.invalid(e),
        };

        tracing::info!(
            device_id = %self.device_id,
            command = %command,
            path = request.path(),
            "Sending command"
        );
        let response = self.transport.execute(&request).await?;

        if let Some(err) = response.api_error() {
            tracing::error!(command = %command, description = %err.description, "Command refused");
            return Err(err.into());
        }

        self.settle_and_refresh(&token).await;
        Ok(CommandOutcome::Sent(response))
    }

    /// Resolves and sends a raw command/sub-device pair.
    ///
    /// A whitelisted `command` takes precedence over `subdevice`.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub async fn send_raw(
        &self,
        command: Option<&str>,
        subdevice: Option<&str>,
    ) -> Result<CommandOutcome> {
        match Command::resolve(command, subdevice) {
            Ok(command) => self.send(&command).await,
            Err(e) => self.invalid(e),
        }
    }

    fn invalid(&self, err: RoutingError) -> Result<CommandOutcome> {
        self.router
            .on_invalid(err)
            .map(CommandOutcome::Ignored)
            .map_err(Error::from)
    }

    async fn authenticate(&self) -> Result<(AuthToken, TokenSource)> {
        self.auth.acquire().await.inspect_err(|e| {
            tracing::warn!(device_id = %self.device_id, error = %e, "Device state unknown");
            self.state
                .update_state(&self.device_id, TYPE_CLASS, DeviceStatus::err());
        })
    }

    async fn settle_and_refresh(&self, token: &AuthToken) {
        let Some(delay) = self.refresh_delay else {
            return;
        };
        tokio::time::sleep(delay).await;

        // The fetcher publishes the outcome.
        let _ = self.fetcher.fetch(token, &self.device_id).await;
    }
}

// ============================================================================
// NestClientBuilder
// ============================================================================

/// Builder for [`NestClient`].
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use nestor_lib::{Credentials, InvalidCommandPolicy, NestClient};
///
/// let builder = NestClient::builder("nest", Credentials::new("me@example.com", "secret"))
///     .with_policy(InvalidCommandPolicy::Reject)
///     .with_refresh_delay(Some(Duration::from_millis(500)));
/// assert_eq!(builder.login_host(), "home.nest.com");
/// ```
#[derive(Debug, Clone)]
pub struct NestClientBuilder {
    device_id: String,
    credentials: Credentials,
    login_host: String,
    policy: InvalidCommandPolicy,
    refresh_delay: Option<Duration>,
}

impl NestClientBuilder {
    /// Default delay before the snapshot is refreshed after a command.
    pub const DEFAULT_REFRESH_DELAY: Duration = Duration::from_secs(1);

    /// Creates a builder with default settings.
    #[must_use]
    pub fn new(device_id: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            device_id: device_id.into(),
            credentials,
            login_host: DEFAULT_LOGIN_HOST.to_string(),
            policy: InvalidCommandPolicy::default(),
            refresh_delay: Some(Self::DEFAULT_REFRESH_DELAY),
        }
    }

    /// Sets the host used for the login exchange.
    ///
    /// A `host:port` form is accepted.
    #[must_use]
    pub fn with_login_host(mut self, host: impl Into<String>) -> Self {
        self.login_host = host.into();
        self
    }

    /// Sets what happens to commands that cannot be routed.
    #[must_use]
    pub fn with_policy(mut self, policy: InvalidCommandPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the delay before the post-command refresh; `None` disables it.
    #[must_use]
    pub fn with_refresh_delay(mut self, delay: Option<Duration>) -> Self {
        self.refresh_delay = delay;
        self
    }

    /// Returns the login host.
    #[must_use]
    pub fn login_host(&self) -> &str {
        &self.login_host
    }

    /// Returns the invalid-command policy.
    #[must_use]
    pub fn policy(&self) -> InvalidCommandPolicy {
        self.policy
    }

    /// Returns the post-command refresh delay.
    #[must_use]
    pub fn refresh_delay(&self) -> Option<Duration> {
        self.refresh_delay
    }

    /// Builds a client on an arbitrary transport.
    pub fn build<T, K, S>(self, transport: T, token_store: K, state: S) -> NestClient<T, K, S>
    where
        T: Transport,
        K: TokenStore,
        S: StateStore,
    {
        let transport = Arc::new(transport);
        let state = Arc::new(state);

        let auth = AuthManager::new(Arc::clone(&transport), token_store, self.credentials)
            .with_login_host(self.login_host);
        let fetcher = SnapshotFetcher::new(Arc::clone(&transport), Arc::clone(&state));

        NestClient {
            device_id: self.device_id,
            transport,
            auth,
            fetcher,
            router: CommandRouter::new(self.policy),
            state,
            refresh_delay: self.refresh_delay,
        }
    }

    /// Builds a client talking HTTPS.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    #[cfg(feature = "http")]
    pub fn build_http<K, S>(
        self,
        config: HttpConfig,
        token_store: K,
        state: S,
    ) -> Result<NestClient<HttpTransport, K, S>>
    where
        K: TokenStore,
        S: StateStore,
    {
        let transport = config.into_transport()?;
        Ok(self.build(transport, token_store, state))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;
    use crate::auth::{MemoryTokenStore, now_millis};
    use crate::error::ApiError;
    use crate::protocol::Method;
    use crate::protocol::mock::MockTransport;
    use crate::state::{MemoryStateStore, StatusKind};
    use crate::types::WHERE_ID_PREFIX;

    type TestClient = NestClient<MockTransport, MemoryTokenStore, MemoryStateStore>;

    fn credentials() -> Credentials {
        Credentials::new("me@example.com", "secret")
    }

    fn cached_token() -> AuthToken {
        AuthToken {
            url: "t.example".to_string(),
            token: "cached".to_string(),
            user_id: 7,
            expire: now_millis() + 3_600_000,
        }
    }

    fn login_reply() -> Value {
        json!({
            "access_token": "fresh",
            "userid": 7,
            "expires_in": "2999-01-01T00:00:00Z",
            "urls": { "transport_url": "https://t.example:443" }
        })
    }

    fn tree() -> Value {
        json!({
            "structure": { "s1": { "away": false } },
            "device": {
                "T1": {
                    "serial_number": "T1",
                    "fan_mode": "auto",
                    "where_id": format!("{WHERE_ID_PREFIX}0a")
                }
            },
            "shared": {
                "T1": {
                    "target_temperature_type": "heat",
                    "current_temperature": 20.0,
                    "target_temperature": 21.0
                }
            }
        })
    }

    fn client(transport: MockTransport, tokens: MemoryTokenStore) -> TestClient {
        NestClient::builder("nest", credentials())
            .with_refresh_delay(None)
            .build(transport, tokens, MemoryStateStore::new())
    }

    fn paths(client: &TestClient) -> Vec<String> {
        client
            .transport
            .requests()
            .iter()
            .map(|r| r.path().to_string())
            .collect()
    }

    #[test]
    fn builder_defaults() {
        let builder = NestClient::builder("nest", credentials());
        assert_eq!(builder.login_host(), "home.nest.com");
        assert_eq!(builder.policy(), InvalidCommandPolicy::Ignore);
        assert_eq!(builder.refresh_delay(), Some(Duration::from_secs(1)));
    }

    #[tokio::test]
    async fn connect_logs_in_then_fetches() {
        let client = client(
            MockTransport::new().respond_json(login_reply()).respond_json(tree()),
            MemoryTokenStore::new(),
        );

        let snapshot = client.connect().await.unwrap();
        assert_eq!(snapshot.first_labelled("Kitchen").unwrap().serial, "T1");
        assert_eq!(paths(&client), ["/user/login", "/v2/mobile/user.7"]);
        assert_eq!(client.state().unwrap().state, StatusKind::Ok);
        assert_eq!(client.token().unwrap().token, "fresh");
    }

    #[tokio::test]
    async fn connect_reuses_cached_token() {
        let client = client(
            MockTransport::new().respond_json(tree()),
            MemoryTokenStore::with_token(cached_token()),
        );

        client.connect().await.unwrap();
        assert_eq!(paths(&client), ["/v2/mobile/user.7"]);
    }

    #[tokio::test]
    async fn connect_failure_publishes_err() {
        let client = client(
            MockTransport::new().fail_with("ECONNREFUSED"),
            MemoryTokenStore::new(),
        );

        let err = client.connect().await.unwrap_err();
        assert!(err.is_unreachable());
        assert_eq!(client.state(), Some(DeviceStatus::err()));
        assert!(client.snapshot().is_none());
    }

    #[tokio::test]
    async fn refresh_without_token_is_a_no_op() {
        let client = client(MockTransport::new(), MemoryTokenStore::new());

        assert_eq!(client.refresh().await.unwrap(), None);
        assert_eq!(client.transport.call_count(), 0);
        assert!(client.state().is_none());
    }

    #[tokio::test]
    async fn refresh_after_connect() {
        let client = client(
            MockTransport::new()
                .respond_json(tree())
                .respond_json(json!({ "structure": { "s1": { "away": true } } })),
            MemoryTokenStore::with_token(cached_token()),
        );

        client.connect().await.unwrap();
        let snapshot = client.refresh().await.unwrap().unwrap();
        assert!(snapshot.thermostats().is_empty());
        assert_eq!(client.snapshot(), Some(snapshot));
    }

    #[tokio::test]
    async fn away_uses_published_snapshot() {
        let client = client(
            MockTransport::new().respond_json(tree()).respond_json(json!({})),
            MemoryTokenStore::with_token(cached_token()),
        );
        client.connect().await.unwrap();

        let outcome = client.send(&Command::Away).await.unwrap();
        assert!(outcome.is_sent());

        let request = &client.transport.requests()[1];
        assert_eq!(request.method(), Method::Post);
        assert_eq!(request.host(), "t.example");
        assert_eq!(request.path(), "/v2/put/structure.s1");
        assert_eq!(request.args().unwrap()["away"], true);
    }

    #[tokio::test]
    async fn fresh_login_fetches_before_routing() {
        let client = client(
            MockTransport::new()
                .respond_json(login_reply())
                .respond_json(tree())
                .respond_json(json!({})),
            MemoryTokenStore::new(),
        );

        let outcome = client.send(&"temp-Kitchen-72".parse().unwrap()).await.unwrap();
        assert!(outcome.is_sent());
        assert_eq!(
            paths(&client),
            ["/user/login", "/v2/mobile/user.7", "/v2/put/shared.T1"]
        );
    }

    #[tokio::test]
    async fn cached_token_without_snapshot_fetches_first() {
        let client = client(
            MockTransport::new().respond_json(tree()).respond_json(json!({})),
            MemoryTokenStore::with_token(cached_token()),
        );

        let outcome = client.send(&Command::Home).await.unwrap();
        assert!(outcome.is_sent());
        assert_eq!(
            paths(&client),
            ["/v2/mobile/user.7", "/v2/put/structure.s1"]
        );
        assert_eq!(client.state().unwrap().state, StatusKind::Ok);
    }

    #[tokio::test]
    async fn failed_fetch_before_routing_sends_nothing() {
        let client = client(
            MockTransport::new().respond_empty(),
            MemoryTokenStore::with_token(cached_token()),
        );

        let err = client.send(&Command::Home).await.unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
        assert_eq!(client.transport.call_count(), 1);
        assert_eq!(client.state(), Some(DeviceStatus::err()));
    }

    #[tokio::test]
    async fn unknown_command_is_ignored_without_network() {
        let client = client(MockTransport::new(), MemoryTokenStore::new());

        let outcome = client.send_raw(Some("Reboot"), None).await.unwrap();
        assert!(matches!(
            outcome,
            CommandOutcome::Ignored(RoutingError::UnknownCommand(_))
        ));
        assert_eq!(client.transport.call_count(), 0);
    }

    #[tokio::test]
    async fn reject_policy_surfaces_routing_error() {
        let client = NestClient::builder("nest", credentials())
            .with_policy(InvalidCommandPolicy::Reject)
            .with_refresh_delay(None)
            .build(
                MockTransport::new().respond_json(tree()),
                MemoryTokenStore::with_token(cached_token()),
                MemoryStateStore::new(),
            );
        client.connect().await.unwrap();

        let err = client
            .send_raw(None, Some("temp-Kitchen-40"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Routing(RoutingError::InvalidTemperature(_))
        ));
        assert_eq!(client.transport.call_count(), 1);
    }

    #[tokio::test]
    async fn refused_write_is_an_api_error() {
        let client = client(
            MockTransport::new().respond_json(tree()).respond_json(json!({
                "error": "forbidden",
                "error_description": "read only"
            })),
            MemoryTokenStore::with_token(cached_token()),
        );
        client.connect().await.unwrap();

        let err = client.send(&Command::FanOn).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Api(ApiError { ref description, .. }) if description == "read only"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn command_is_followed_by_refresh() {
        let client = NestClient::builder("nest", credentials()).build(
            MockTransport::new()
                .respond_json(tree())
                .respond_json(json!({}))
                .respond_empty(),
            MemoryTokenStore::with_token(cached_token()),
            MemoryStateStore::new(),
        );
        client.connect().await.unwrap();

        client.send(&Command::FanAuto).await.unwrap();
        assert_eq!(
            paths(&client),
            [
                "/v2/mobile/user.7",
                "/v2/put/structure.s1",
                "/v2/mobile/user.7"
            ]
        );
        // The refresh came back empty, so the state is unknown again.
        assert_eq!(client.state(), Some(DeviceStatus::err()));
    }
}
