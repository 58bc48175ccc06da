// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `NestoR` library.
//!
//! Every failure is returned as a value. Nothing in the library panics on
//! bad input from the network, the token cache, or the caller.
//!
//! | Category | Type | Typical cause |
//! |----------|------|---------------|
//! | Authentication | [`AuthError`] | bad credentials, malformed login reply |
//! | Transport | [`TransportError`] | connection reset, refused, timeout |
//! | Platform | [`ApiError`] | well-formed `{error, error_description}` payload |
//! | Validation | [`RoutingError`], [`ValueError`] | unknown command, out-of-range value |
//! | State | [`StateError`] | missing or corrupt token cache |
//! | Parsing | [`ParseError`] | malformed device tree |

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Login exchange failed.
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Connection-level failure.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The platform answered with an error payload.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// A command could not be turned into a request.
    #[error("invalid command: {0}")]
    Routing(#[from] RoutingError),

    /// The token cache could not be used.
    #[error("state error: {0}")]
    State(#[from] StateError),

    /// A response could not be understood.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
}

impl Error {
    /// Returns `true` if the platform could not be reached at all.
    #[must_use]
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Transport(TransportError::Unreachable { .. }))
    }
}

/// Errors raised while acquiring a token.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The platform rejected the credentials.
    #[error("login rejected ({error}): {description}")]
    Rejected {
        /// Short platform error code, e.g. `access_denied`.
        error: String,
        /// Human readable description supplied by the platform.
        description: String,
    },

    /// A required field was missing from a successful login reply.
    #[error("login response is missing {0}")]
    MissingField(&'static str),

    /// The `expires_in` field could not be read as a date.
    #[error("cannot interpret token expiry: {0}")]
    InvalidExpiry(String),

    /// The login exchange returned no body.
    #[error("login returned no data")]
    EmptyResponse,
}

/// Connection-level failures.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The API host reset, refused or could not be routed to.
    #[error("API is unreachable ({code})")]
    Unreachable {
        /// The underlying error code, e.g. `ECONNREFUSED`.
        code: String,
    },

    /// The request did not complete in time.
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    /// The request was cancelled by the caller.
    #[error("request cancelled")]
    Cancelled,

    /// Any other connection failure, carrying its raw code.
    #[error("{code}")]
    Other {
        /// The raw error code or description.
        code: String,
    },

    /// Error raised by the HTTP client itself.
    #[cfg(feature = "http")]
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Error codes that mean the API host could not be reached.
const UNREACHABLE_CODES: [&str; 3] = ["ECONNRESET", "ECONNREFUSED", "EHOSTUNREACH"];

impl TransportError {
    /// Classifies a raw connection error code.
    ///
    /// # Examples
    ///
    /// ```
    /// use nestor_lib::error::TransportError;
    ///
    /// assert!(TransportError::from_code("ECONNREFUSED").is_unreachable());
    /// assert!(!TransportError::from_code("EPIPE").is_unreachable());
    /// ```
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        if UNREACHABLE_CODES.contains(&code) {
            Self::Unreachable {
                code: code.to_string(),
            }
        } else {
            Self::Other {
                code: code.to_string(),
            }
        }
    }

    /// Classifies an I/O error raised while connecting.
    #[must_use]
    pub fn from_io(err: &std::io::Error) -> Self {
        use std::io::ErrorKind;

        let code = match err.kind() {
            ErrorKind::ConnectionReset => "ECONNRESET",
            ErrorKind::ConnectionRefused => "ECONNREFUSED",
            ErrorKind::HostUnreachable => "EHOSTUNREACH",
            ErrorKind::TimedOut => "ETIMEDOUT",
            _ => return Self::Other {
                code: err.to_string(),
            },
        };
        Self::from_code(code)
    }

    /// Returns `true` for the `ApiUnreachable` category.
    #[must_use]
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable { .. })
    }
}

/// A well-formed error payload returned by the platform.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{error}: {description}")]
pub struct ApiError {
    /// Short error code.
    pub error: String,
    /// Human readable description.
    pub description: String,
}

/// Reasons a command could not be routed to a request.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RoutingError {
    /// The command is neither whitelisted nor a sub-device string.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// A sub-device string is missing its label or value.
    #[error("malformed sub-device string: {0}")]
    MalformedSubDevice(String),

    /// A mode value other than off, heat or cool.
    #[error("invalid mode: {0}")]
    InvalidMode(String),

    /// A temperature that is not a number in the accepted range.
    #[error("invalid temperature: {0}")]
    InvalidTemperature(#[from] ValueError),

    /// No thermostat carries the requested label.
    #[error("no thermostat labelled {0:?}")]
    NoMatchingDevice(String),

    /// The snapshot has no structure to address.
    #[error("snapshot has no structure")]
    NoStructure,
}

/// Errors related to value validation and constraints.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValueError {
    /// A numeric value is outside the allowed range.
    #[error("value {actual} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Minimum allowed value.
        min: f64,
        /// Maximum allowed value.
        max: f64,
        /// The actual value that was provided.
        actual: f64,
    },

    /// A value that should be numeric is not.
    #[error("not a number: {0:?}")]
    NotANumber(String),

    /// An unknown mode string.
    #[error("invalid mode: {0}")]
    InvalidMode(String),
}

/// Errors related to the token cache.
#[derive(Debug, Error)]
pub enum StateError {
    /// The cache could not be read or written.
    #[error("token cache I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The cache exists but does not hold a usable token.
    #[error("token cache is corrupt: {0}")]
    Corrupt(String),
}

/// Errors related to parsing platform responses.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Expected field is missing from the response.
    #[error("missing field in response: {0}")]
    MissingField(String),

    /// The endpoint answered with an empty body.
    #[error("no data returned from API")]
    NoData,
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
