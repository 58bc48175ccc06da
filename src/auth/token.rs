// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Credentials, tokens, and the login reply.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AuthError;

/// Returns the current wall-clock time in epoch milliseconds.
#[must_use]
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Account credentials used for the login exchange.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Creates a credential pair.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Returns the username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the password.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// An access token together with the host it is valid for.
///
/// This is also the on-disk format of the token cache:
/// `{"url": ..., "token": ..., "userId": ..., "expire": ...}`.
///
/// # Examples
///
/// ```
/// use nestor_lib::auth::AuthToken;
///
/// let token = AuthToken {
///     url: "transport.home.nest.com".to_string(),
///     token: "b.1234".to_string(),
///     user_id: 42,
///     expire: 2_000,
/// };
/// assert!(token.is_valid_at(1_999));
/// assert!(!token.is_valid_at(2_000));
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthToken {
    /// Transport host, without scheme or default port.
    pub url: String,
    /// Access token.
    pub token: String,
    /// Numeric user id.
    pub user_id: u64,
    /// Expiry, in epoch milliseconds.
    pub expire: i64,
}

impl AuthToken {
    /// Returns `true` if the token has a host and expires after `now` (epoch ms).
    #[must_use]
    pub fn is_valid_at(&self, now: i64) -> bool {
        !self.url.is_empty() && self.expire > now
    }

    /// Returns `true` if the token is usable right now.
    ///
    /// The clock is read on every call.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(now_millis())
    }

    /// Returns `true` if the token can authenticate a request.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        !self.token.is_empty() && self.user_id != 0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthToken")
            .field("url", &self.url)
            .field("token", &"***")
            .field("user_id", &self.user_id)
            .field("expire", &self.expire)
            .finish()
    }
}

/// Successful reply of the login endpoint.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct LoginResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    userid: Option<Value>,
    #[serde(default)]
    expires_in: Option<Value>,
    #[serde(default)]
    urls: Option<LoginUrls>,
}

#[derive(Debug, Clone, Deserialize)]
struct LoginUrls {
    #[serde(default)]
    transport_url: Option<String>,
}

impl LoginResponse {
    /// Converts the reply into a token.
    pub(crate) fn into_token(self) -> Result<AuthToken, AuthError> {
        let url = self
            .urls
            .and_then(|urls| urls.transport_url)
            .ok_or(AuthError::MissingField("urls.transport_url"))?;
        let token = self
            .access_token
            .ok_or(AuthError::MissingField("access_token"))?;
        let user_id = self
            .userid
            .as_ref()
            .and_then(parse_user_id)
            .ok_or(AuthError::MissingField("userid"))?;
        let expire = self
            .expires_in
            .as_ref()
            .ok_or(AuthError::MissingField("expires_in"))
            .and_then(parse_expiry)?;

        Ok(AuthToken {
            url: transport_host(&url),
            token,
            user_id,
            expire,
        })
    }
}

/// Strips the scheme and the default port from a transport URL.
pub(crate) fn transport_host(url: &str) -> String {
    let host = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    host.replacen(":443", "", 1)
}

/// Reads the user id, which the platform sends as a string or a number.
fn parse_user_id(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Reads `expires_in` as an absolute point in time, in epoch milliseconds.
///
/// Despite its name the field holds a date, e.g.
/// `"Mon, 01-Sep-2014 17:20:48 GMT"`. Numbers are taken as epoch milliseconds.
pub(crate) fn parse_expiry(value: &Value) -> Result<i64, AuthError> {
    let invalid = || AuthError::InvalidExpiry(value.to_string());

    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| {
                // Safe: fractional milliseconds are dropped on purpose
                #[allow(clippy::cast_possible_truncation)]
                n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)
            })
            .ok_or_else(invalid),
        Value::String(s) => parse_date(s.trim()).ok_or_else(invalid),
        _ => Err(invalid()),
    }
}

fn parse_date(s: &str) -> Option<i64> {
    if let Ok(date) = DateTime::parse_from_rfc2822(s) {
        return Some(date.timestamp_millis());
    }
    if let Ok(date) = DateTime::parse_from_rfc3339(s) {
        return Some(date.timestamp_millis());
    }
    NaiveDateTime::parse_from_str(s, "%a, %d-%b-%Y %H:%M:%S GMT")
        .ok()
        .map(|naive| naive.and_utc().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn login(value: Value) -> LoginResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn token_validity_uses_strict_comparison() {
        let token = AuthToken {
            url: "h".to_string(),
            token: "t".to_string(),
            user_id: 1,
            expire: 1_000,
        };
        assert!(token.is_valid_at(999));
        assert!(!token.is_valid_at(1_000));
        assert!(!token.is_valid_at(1_001));
    }

    #[test]
    fn token_without_url_is_invalid() {
        let token = AuthToken {
            url: String::new(),
            token: "t".to_string(),
            user_id: 1,
            expire: i64::MAX,
        };
        assert!(!token.is_valid());
    }

    #[test]
    fn token_cache_format() {
        let token: AuthToken = serde_json::from_str(
            r#"{"url":"h.example","token":"abc","userId":7,"expire":1700000000000}"#,
        )
        .unwrap();
        assert_eq!(token.user_id, 7);
        assert_eq!(token.expire, 1_700_000_000_000);

        let json = serde_json::to_value(&token).unwrap();
        assert_eq!(json["userId"], 7);
    }

    #[test]
    fn debug_hides_secrets() {
        let token = AuthToken {
            url: "h".to_string(),
            token: "very-secret".to_string(),
            user_id: 1,
            expire: 0,
        };
        assert!(!format!("{token:?}").contains("very-secret"));
        assert!(!format!("{:?}", Credentials::new("u", "hunter2")).contains("hunter2"));
    }

    #[test]
    fn transport_host_strips_scheme_and_port() {
        assert_eq!(
            transport_host("https://czfe1.transport.home.nest.com:443"),
            "czfe1.transport.home.nest.com"
        );
        assert_eq!(transport_host("http://127.0.0.1:8080"), "127.0.0.1:8080");
        assert_eq!(transport_host("plain.example"), "plain.example");
    }

    #[test]
    fn login_response_into_token() {
        let token = login(json!({
            "access_token": "b.abc",
            "userid": "12345",
            "expires_in": "Mon, 01-Sep-2014 17:20:48 GMT",
            "urls": { "transport_url": "https://t.example:443" }
        }))
        .into_token()
        .unwrap();

        assert_eq!(token.url, "t.example");
        assert_eq!(token.token, "b.abc");
        assert_eq!(token.user_id, 12_345);
        assert_eq!(token.expire, 1_409_592_048_000);
    }

    #[test]
    fn login_response_missing_fields() {
        let err = login(json!({"access_token": "a"})).into_token().unwrap_err();
        assert_eq!(err, AuthError::MissingField("urls.transport_url"));

        let err = login(json!({
            "access_token": "a",
            "userid": "not a number",
            "expires_in": 0,
            "urls": { "transport_url": "https://t" }
        }))
        .into_token()
        .unwrap_err();
        assert_eq!(err, AuthError::MissingField("userid"));
    }

    #[test]
    fn expiry_formats() {
        assert_eq!(
            parse_expiry(&json!("Mon, 01 Sep 2014 17:20:48 GMT")).unwrap(),
            1_409_592_048_000
        );
        assert_eq!(
            parse_expiry(&json!("2014-09-01T17:20:48Z")).unwrap(),
            1_409_592_048_000
        );
        assert_eq!(parse_expiry(&json!(1_409_592_048_000_i64)).unwrap(), 1_409_592_048_000);
        assert!(matches!(
            parse_expiry(&json!("tomorrow")),
            Err(AuthError::InvalidExpiry(_))
        ));
        assert!(parse_expiry(&json!(null)).is_err());
    }
}
