// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Request descriptors and the transport that executes them.
//!
//! Every call to the platform is described by an [`ApiRequest`]: host, port,
//! path, method, the optional token and the optional body. A [`Transport`]
//! executes one request/response cycle and hands back an [`ApiResponse`].
//!
//! # Transports
//!
//! - [`HttpTransport`]: HTTPS using `reqwest` (feature `http`)
//!
//! Anything implementing [`Transport`] can be injected into the client, which
//! is how the tests replace the network.

#[cfg(feature = "http")]
mod http;
#[cfg(test)]
pub(crate) mod mock;

#[cfg(feature = "http")]
pub use http::{HttpConfig, HttpTransport};

use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::auth::{AuthToken, Credentials};
use crate::error::{ApiError, ParseError, Result};

/// Fixed user agent sent with every request.
pub const USER_AGENT: &str = concat!("nestor_lib/", env!("CARGO_PKG_VERSION"));

/// Protocol version announced on authenticated requests.
pub const PROTOCOL_VERSION: &str = "1";

/// Default HTTPS port.
pub const DEFAULT_PORT: u16 = 443;

/// HTTP method of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// Read.
    Get,
    /// Login and every write.
    Post,
}

impl Method {
    /// Returns the method name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of a POST request.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Explicit arguments, sent as JSON.
    Json(Value),
    /// Login credentials, sent as URL-encoded form fields.
    Form(Credentials),
}

impl RequestBody {
    /// Serializes the body for the wire.
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            Self::Json(args) => args.to_string(),
            Self::Form(credentials) => format!(
                "username={}&password={}",
                urlencoding::encode(credentials.username()),
                urlencoding::encode(credentials.password())
            ),
        }
    }
}

/// A fully described platform request, ready to be executed.
///
/// # Examples
///
/// ```
/// use nestor_lib::protocol::{ApiRequest, Method};
///
/// let request = ApiRequest::get("home.nest.com", "/user/login");
/// assert_eq!(request.method(), Method::Get);
/// assert_eq!(request.port(), 443);
/// assert!(request.encoded_body().is_none());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    host: String,
    port: u16,
    path: String,
    method: Method,
    auth: Option<AuthToken>,
    body: Option<RequestBody>,
}

impl ApiRequest {
    /// Creates a request with the given method.
    #[must_use]
    pub fn new(method: Method, host: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            path: path.into(),
            method,
            auth: None,
            body: None,
        }
    }

    /// Creates a GET request.
    #[must_use]
    pub fn get(host: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(Method::Get, host, path)
    }

    /// Creates a POST request.
    #[must_use]
    pub fn post(host: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(Method::Post, host, path)
    }

    /// Sets a custom port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Attaches a token; its headers are sent if it is usable.
    #[must_use]
    pub fn with_auth(mut self, token: AuthToken) -> Self {
        self.auth = Some(token);
        self
    }

    /// Sets explicit arguments, sent as a JSON body.
    #[must_use]
    pub fn with_json(mut self, args: Value) -> Self {
        self.body = Some(RequestBody::Json(args));
        self
    }

    /// Sets login credentials, sent as a form body.
    #[must_use]
    pub fn with_form(mut self, credentials: Credentials) -> Self {
        self.body = Some(RequestBody::Form(credentials));
        self
    }

    /// Returns the host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the method.
    #[must_use]
    pub fn method(&self) -> Method {
        self.method
    }

    /// Returns the attached token, if any.
    #[must_use]
    pub fn auth(&self) -> Option<&AuthToken> {
        self.auth.as_ref()
    }

    /// Returns the body, if any.
    #[must_use]
    pub fn body(&self) -> Option<&RequestBody> {
        self.body.as_ref()
    }

    /// Returns the JSON arguments of a write request.
    #[must_use]
    pub fn args(&self) -> Option<&Value> {
        match &self.body {
            Some(RequestBody::Json(args)) => Some(args),
            _ => None,
        }
    }

    /// Returns the serialized body. Only POST requests carry one.
    #[must_use]
    pub fn encoded_body(&self) -> Option<String> {
        match self.method {
            Method::Post => self.body.as_ref().map(RequestBody::encode),
            Method::Get => None,
        }
    }

    /// Builds the header list sent with this request.
    ///
    /// The content type is always form-encoded, even for JSON bodies; the
    /// platform expects exactly that.
    #[must_use]
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = vec![
            ("Accept", "application/json".to_string()),
            ("Accept-Charset", "utf-8".to_string()),
            ("User-Agent", USER_AGENT.to_string()),
            (
                "Content-Type",
                "application/x-www-form-urlencoded".to_string(),
            ),
        ];

        if let Some(token) = self.auth.as_ref().filter(|t| t.has_credentials()) {
            headers.push(("X-nl-protocol-version", PROTOCOL_VERSION.to_string()));
            headers.push(("X-nl-user-id", token.user_id.to_string()));
            headers.push(("Authorization", format!("Basic {}", token.token)));
        }

        if let Some(body) = self.encoded_body() {
            headers.push(("Content-Length", body.len().to_string()));
        }

        headers
    }
}

/// The outcome of one successful request/response cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    /// The body parsed as JSON.
    Json(Value),
    /// The body was empty.
    Empty,
}

impl ApiResponse {
    /// Decodes a raw body.
    ///
    /// An empty (or whitespace-only) body is not an error.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Json` if a non-empty body is not valid JSON.
    pub fn from_body(body: &str) -> std::result::Result<Self, ParseError> {
        if body.trim().is_empty() {
            tracing::warn!("No data returned from API");
            return Ok(Self::Empty);
        }
        Ok(Self::Json(serde_json::from_str(body)?))
    }

    /// Returns `true` if no data was returned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Returns the JSON value, if any.
    #[must_use]
    pub fn json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Empty => None,
        }
    }

    /// Returns the platform error carried by the payload, if any.
    #[must_use]
    pub fn api_error(&self) -> Option<ApiError> {
        let error = self.json()?.get("error")?;
        let error = match error {
            Value::String(s) => s.clone(),
            Value::Null => return None,
            other => other.to_string(),
        };
        let description = self
            .json()
            .and_then(|v| v.get("error_description"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Some(ApiError { error, description })
    }

    /// Deserializes the payload into a typed value.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::NoData` for an empty body, or `ParseError::Json`
    /// if the payload does not match `T`.
    pub fn parse<T: DeserializeOwned>(&self) -> std::result::Result<T, ParseError> {
        match self {
            Self::Json(value) => T::deserialize(value).map_err(Into::into),
            Self::Empty => Err(ParseError::NoData),
        }
    }
}

/// Executes platform requests.
///
/// Failures are returned, never raised: connection problems come back as
/// [`TransportError`](crate::error::TransportError), undecodable bodies as
/// [`ParseError`].
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Executes one request/response cycle.
    ///
    /// # Errors
    ///
    /// Returns `Error::Transport` on connection failures and `Error::Parse`
    /// if the body is not JSON.
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse>;
}

impl<T: Transport> Transport for std::sync::Arc<T> {
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse> {
        (**self).execute(request).await
    }
}
