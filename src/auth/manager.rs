// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Token acquisition and reuse.

use parking_lot::RwLock;
use tokio::sync::Mutex;

use crate::auth::token::LoginResponse;
use crate::auth::{AuthToken, Credentials, TokenStore};
use crate::error::{AuthError, Result};
use crate::protocol::{ApiRequest, Transport};

/// Path of the login endpoint.
pub const LOGIN_PATH: &str = "/user/login";

/// Default login host.
pub const DEFAULT_LOGIN_HOST: &str = "home.nest.com";

/// Where a token handed out by [`AuthManager`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    /// Already held in memory.
    Memory,
    /// Read back from the token store.
    Cache,
    /// Obtained through a fresh login exchange.
    Login,
}

/// Obtains, validates and caches the access token.
///
/// Refreshes are single-flight: while one caller performs the login exchange,
/// concurrent callers wait for it and reuse its result instead of logging in
/// a second time.
///
/// # Examples
///
/// ```no_run
/// use nestor_lib::auth::{AuthManager, Credentials, FileTokenStore};
/// use nestor_lib::protocol::HttpTransport;
///
/// # async fn example() -> nestor_lib::Result<()> {
/// let auth = AuthManager::new(
///     HttpTransport::new()?,
///     FileTokenStore::new("auth.json"),
///     Credentials::new("me@example.com", "secret"),
/// );
/// let token = auth.ensure_token().await?;
/// println!("user {}", token.user_id);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct AuthManager<T, S> {
    transport: T,
    store: S,
    credentials: Credentials,
    login_host: String,
    token: RwLock<Option<AuthToken>>,
    refresh: Mutex<()>,
}

impl<T: Transport, S: TokenStore> AuthManager<T, S> {
    /// Creates a manager with no token in memory.
    pub fn new(transport: T, store: S, credentials: Credentials) -> Self {
        Self {
            transport,
            store,
            credentials,
            login_host: DEFAULT_LOGIN_HOST.to_string(),
            token: RwLock::new(None),
            refresh: Mutex::new(()),
        }
    }

    /// Sets the host used for the login exchange.
    #[must_use]
    pub fn with_login_host(mut self, host: impl Into<String>) -> Self {
        self.login_host = host.into();
        self
    }

    /// Returns the token held in memory, valid or not.
    #[must_use]
    pub fn current(&self) -> Option<AuthToken> {
        self.token.read().clone()
    }

    /// Forgets the in-memory token so the next call re-validates.
    pub fn invalidate(&self) {
        *self.token.write() = None;
    }

    /// Returns a valid token, logging in if needed.
    ///
    /// # Errors
    ///
    /// Returns `Error::Auth` if the platform rejects the login,
    /// `Error::Transport` if it cannot be reached.
    pub async fn ensure_token(&self) -> Result<AuthToken> {
        self.acquire().await.map(|(token, _)| token)
    }

    /// Returns a valid token and where it came from.
    ///
    /// Reuse never touches the network: a valid in-memory or cached token is
    /// returned as-is. Otherwise exactly one login exchange is performed.
    ///
    /// # Errors
    ///
    /// See [`ensure_token`](Self::ensure_token).
    pub async fn acquire(&self) -> Result<(AuthToken, TokenSource)> {
        if let Some(token) = self.valid_in_memory() {
            return Ok((token, TokenSource::Memory));
        }

        let _guard = self.refresh.lock().await;

        // Another caller may have refreshed while we waited.
        if let Some(token) = self.valid_in_memory() {
            return Ok((token, TokenSource::Memory));
        }

        if let Some(token) = self.load_cached().await {
            *self.token.write() = Some(token.clone());
            return Ok((token, TokenSource::Cache));
        }

        let token = self.login().await?;
        *self.token.write() = Some(token.clone());
        Ok((token, TokenSource::Login))
    }

    fn valid_in_memory(&self) -> Option<AuthToken> {
        self.token.read().as_ref().filter(|t| t.is_valid()).cloned()
    }

    async fn load_cached(&self) -> Option<AuthToken> {
        match self.store.load().await {
            Ok(Some(token)) if token.is_valid() => {
                tracing::debug!(user_id = token.user_id, "Reusing cached token");
                Some(token)
            }
            Ok(Some(_)) => {
                tracing::info!("Cached token expired");
                None
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring token cache");
                None
            }
        }
    }

    async fn login(&self) -> Result<AuthToken> {
        tracing::info!(host = %self.login_host, "Logging in");

        let request =
            ApiRequest::post(&self.login_host, LOGIN_PATH).with_form(self.credentials.clone());
        let response = self.transport.execute(&request).await?;

        if let Some(err) = response.api_error() {
            tracing::error!(description = %err.description, "Login rejected");
            return Err(AuthError::Rejected {
                error: err.error,
                description: err.description,
            }
            .into());
        }
        if response.is_empty() {
            return Err(AuthError::EmptyResponse.into());
        }

        let token = response.parse::<LoginResponse>()?.into_token()?;

        if let Err(e) = self.store.save(&token).await {
            tracing::warn!(error = %e, "Could not cache auth data");
        }

        tracing::info!(url = %token.url, user_id = token.user_id, "Authenticated");
        Ok(token)
    }
}
