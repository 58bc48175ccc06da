// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTPS transport built on `reqwest`.

use std::time::Duration;

use reqwest::Client;
use tokio_util::sync::CancellationToken;

use crate::error::{Result, TransportError};
use crate::protocol::{ApiRequest, ApiResponse, DEFAULT_PORT, Method, Transport};

// ============================================================================
// HttpConfig
// ============================================================================

/// Configuration for the HTTP transport.
///
/// # Examples
///
/// ```
/// use nestor_lib::protocol::HttpConfig;
/// use std::time::Duration;
///
/// let config = HttpConfig::new().with_timeout(Duration::from_secs(5));
/// assert!(config.use_https());
/// ```
#[derive(Debug, Clone)]
pub struct HttpConfig {
    use_https: bool,
    timeout: Duration,
    cancel: Option<CancellationToken>,
}

impl HttpConfig {
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            use_https: true,
            timeout: Self::DEFAULT_TIMEOUT,
            cancel: None,
        }
    }

    /// Talks plain HTTP instead of HTTPS. Only useful against local mocks.
    #[must_use]
    pub fn with_plain_http(mut self) -> Self {
        self.use_https = false;
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Aborts in-flight requests when `token` is cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Returns whether HTTPS is used.
    #[must_use]
    pub fn use_https(&self) -> bool {
        self.use_https
    }

    /// Returns the timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Creates an `HttpTransport` from this configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn into_transport(self) -> std::result::Result<HttpTransport, TransportError> {
        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(TransportError::Http)?;

        Ok(HttpTransport {
            client,
            use_https: self.use_https,
            timeout: self.timeout,
            cancel: self.cancel,
        })
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// HttpTransport
// ============================================================================

/// Executes [`ApiRequest`]s over HTTPS.
///
/// The status code is not interpreted: the platform reports failures in the
/// body, so every body is decoded and handed back.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    use_https: bool,
    timeout: Duration,
    cancel: Option<CancellationToken>,
}

impl HttpTransport {
    /// Creates a transport with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn new() -> std::result::Result<Self, TransportError> {
        HttpConfig::new().into_transport()
    }

    /// Builds the URL for a request.
    ///
    /// Hosts already carrying a port are used verbatim.
    fn url_for(&self, request: &ApiRequest) -> String {
        let scheme = if self.use_https { "https" } else { "http" };
        let port_suffix = if request.host().contains(':') || request.port() == DEFAULT_PORT {
            String::new()
        } else {
            format!(":{}", request.port())
        };
        format!("{scheme}://{}{port_suffix}{}", request.host(), request.path())
    }

    fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }

    /// Maps a client error onto the transport taxonomy.
    fn classify(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            return TransportError::Timeout(self.timeout_ms());
        }

        match io_source(&err) {
            Some(io) if io.kind() == std::io::ErrorKind::TimedOut => {
                TransportError::Timeout(self.timeout_ms())
            }
            Some(io) => TransportError::from_io(io),
            None if err.is_connect() => TransportError::Other {
                code: err.to_string(),
            },
            None => TransportError::Http(err),
        }
    }

    async fn exchange(&self, url: &str, request: &ApiRequest) -> reqwest::Result<(u16, Vec<u8>)> {
        let mut builder = match request.method() {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
        };
        // reqwest derives Content-Length from the body.
        for (name, value) in request.headers() {
            if name != "Content-Length" {
                builder = builder.header(name, value);
            }
        }
        if let Some(body) = request.encoded_body() {
            builder = builder.body(body);
        }

        let mut response = builder.send().await?;
        let status = response.status().as_u16();
        tracing::debug!(status, "Connected");

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            body.extend_from_slice(&chunk);
        }
        Ok((status, body))
    }
}

/// Finds the I/O error at the root of a client error, if there is one.
fn io_source<'a>(err: &'a (dyn std::error::Error + 'static)) -> Option<&'a std::io::Error> {
    let mut source = err.source();
    while let Some(current) = source {
        if let Some(io) = current.downcast_ref::<std::io::Error>() {
            return Some(io);
        }
        source = current.source();
    }
    None
}

impl Transport for HttpTransport {
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let url = self.url_for(request);

        tracing::debug!(method = %request.method(), url = %url, "Sending API request");

        let outcome = match &self.cancel {
            Some(cancel) => tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(TransportError::Cancelled.into()),
                outcome = self.exchange(&url, request) => outcome,
            },
            None => self.exchange(&url, request).await,
        };

        let (status, body) = outcome.map_err(|err| {
            let classified = self.classify(err);
            if classified.is_unreachable() {
                tracing::error!(url = %url, "API is unreachable");
            } else {
                tracing::error!(url = %url, error = %classified, "API request failed");
            }
            classified
        })?;

        let body = String::from_utf8_lossy(&body);
        tracing::debug!(status, body = %body, "Received API response");

        Ok(ApiResponse::from_body(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() -> HttpTransport {
        HttpConfig::new().with_plain_http().into_transport().unwrap()
    }

    #[test]
    fn config_defaults() {
        let config = HttpConfig::default();
        assert!(config.use_https());
        assert_eq!(config.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn config_builder_chain() {
        let config = HttpConfig::new()
            .with_plain_http()
            .with_timeout(Duration::from_millis(250))
            .with_cancellation(CancellationToken::new());
        assert!(!config.use_https());
        assert_eq!(config.timeout(), Duration::from_millis(250));
    }

    #[test]
    fn https_default_port_is_omitted() {
        let transport = HttpTransport::new().unwrap();
        let request = ApiRequest::get("home.nest.com", "/user/login");
        assert_eq!(transport.url_for(&request), "https://home.nest.com/user/login");
    }

    #[test]
    fn custom_port_is_appended() {
        let transport = HttpTransport::new().unwrap();
        let request = ApiRequest::get("home.nest.com", "/x").with_port(8443);
        assert_eq!(transport.url_for(&request), "https://home.nest.com:8443/x");
    }

    #[test]
    fn plain_http_bare_host() {
        let request = ApiRequest::get("localhost", "/x");
        assert_eq!(plain().url_for(&request), "http://localhost/x");
    }

    #[tokio::test]
    async fn cancelled_before_send() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let transport = HttpConfig::new()
            .with_plain_http()
            .with_cancellation(cancel)
            .into_transport()
            .unwrap();

        let err = transport
            .execute(&ApiRequest::get("127.0.0.1:9", "/"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Transport(TransportError::Cancelled)
        ));
    }

    #[test]
    fn host_with_port_is_used_verbatim() {
        let request = ApiRequest::get("127.0.0.1:3000", "/v2/mobile/user.1");
        assert_eq!(
            plain().url_for(&request),
            "http://127.0.0.1:3000/v2/mobile/user.1"
        );
    }
}
