// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Retrieval of the device tree.

use crate::auth::AuthToken;
use crate::error::{ParseError, Result};
use crate::protocol::{ApiRequest, Transport};
use crate::snapshot::DeviceSnapshot;
use crate::state::{DeviceStatus, StateStore};

/// Type class under which snapshots are published.
pub const TYPE_CLASS: &str = "nest";

/// Returns the device tree path for a user.
#[must_use]
pub fn device_tree_path(user_id: u64) -> String {
    format!("/v2/mobile/user.{user_id}")
}

/// Fetches the device tree and publishes the result.
///
/// Every fetch ends with exactly one update in the state store: `ok` with the
/// new snapshot, or `err` when anything went wrong.
#[derive(Debug)]
pub struct SnapshotFetcher<T, S> {
    transport: T,
    store: S,
}

impl<T: Transport, S: StateStore> SnapshotFetcher<T, S> {
    /// Creates a fetcher.
    pub fn new(transport: T, store: S) -> Self {
        Self { transport, store }
    }

    /// Fetches, normalizes and publishes the snapshot for `device_id`.
    ///
    /// # Errors
    ///
    /// Returns the failure after recording `err` in the state store:
    /// `Error::Transport` when the platform is unreachable, `Error::Api` for
    /// an error payload, `Error::Parse` for an empty or malformed tree.
    pub async fn fetch(&self, token: &AuthToken, device_id: &str) -> Result<DeviceSnapshot> {
        tracing::info!(device_id, "Fetching device info");

        match self.fetch_tree(token).await {
            Ok(snapshot) => {
                tracing::debug!(
                    thermostats = snapshot.thermostats().len(),
                    protects = snapshot.protects().len(),
                    "Device info updated"
                );
                self.store
                    .update_state(device_id, TYPE_CLASS, DeviceStatus::ok(snapshot.clone()));
                Ok(snapshot)
            }
            Err(e) => {
                tracing::warn!(device_id, error = %e, "Device state unknown");
                self.store
                    .update_state(device_id, TYPE_CLASS, DeviceStatus::err());
                Err(e)
            }
        }
    }

    async fn fetch_tree(&self, token: &AuthToken) -> Result<DeviceSnapshot> {
        let request =
            ApiRequest::get(&token.url, device_tree_path(token.user_id)).with_auth(token.clone());
        let response = self.transport.execute(&request).await?;

        if let Some(err) = response.api_error() {
            return Err(err.into());
        }
        let tree = response.json().ok_or(ParseError::NoData)?;
        Ok(DeviceSnapshot::from_device_tree(tree)?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::error::Error;
    use crate::protocol::Method;
    use crate::protocol::mock::MockTransport;
    use crate::state::{MemoryStateStore, StatusKind};

    fn token() -> AuthToken {
        AuthToken {
            url: "t.example".to_string(),
            token: "abc".to_string(),
            user_id: 99,
            expire: i64::MAX,
        }
    }

    type TestFetcher = SnapshotFetcher<Arc<MockTransport>, Arc<MemoryStateStore>>;

    fn fetcher(
        transport: MockTransport,
    ) -> (TestFetcher, Arc<MockTransport>, Arc<MemoryStateStore>) {
        let transport = Arc::new(transport);
        let store = Arc::new(MemoryStateStore::new());
        (
            SnapshotFetcher::new(Arc::clone(&transport), Arc::clone(&store)),
            transport,
            store,
        )
    }

    #[tokio::test]
    async fn successful_fetch_publishes_ok() {
        let (fetcher, transport, store) = fetcher(MockTransport::new().respond_json(json!({
            "structure": { "s1": { "away": false } }
        })));

        let snapshot = fetcher.fetch(&token(), "nest").await.unwrap();
        assert_eq!(snapshot.structure_id(), Some("s1"));

        let status = store.get_device_state("nest").unwrap();
        assert_eq!(status.state, StatusKind::Ok);
        assert_eq!(status.value, Some(snapshot));

        let request = &transport.requests()[0];
        assert_eq!(request.method(), Method::Get);
        assert_eq!(request.host(), "t.example");
        assert_eq!(request.path(), "/v2/mobile/user.99");
        assert!(request.auth().is_some());
    }

    #[tokio::test]
    async fn empty_response_publishes_err() {
        let (fetcher, _, store) = fetcher(MockTransport::new().respond_empty());

        let err = fetcher.fetch(&token(), "nest").await.unwrap_err();
        assert!(matches!(err, Error::Parse(ParseError::NoData)));
        assert_eq!(store.get_device_state("nest"), Some(DeviceStatus::err()));
    }

    #[tokio::test]
    async fn malformed_response_publishes_err() {
        let (fetcher, _, store) = fetcher(MockTransport::new().respond_json(json!({
            "device": { "T1": { "serial_number": "T1" } }
        })));

        assert!(fetcher.fetch(&token(), "nest").await.is_err());
        assert_eq!(store.get_device_state("nest"), Some(DeviceStatus::err()));
    }

    #[tokio::test]
    async fn api_error_publishes_err() {
        let (fetcher, _, store) = fetcher(MockTransport::new().respond_json(json!({
            "error": "unauthorized",
            "error_description": "token expired"
        })));

        let err = fetcher.fetch(&token(), "nest").await.unwrap_err();
        assert!(matches!(err, Error::Api(_)));
        assert!(!store.get_device_state("nest").unwrap().is_ok());
    }

    #[tokio::test]
    async fn unreachable_publishes_err() {
        let (fetcher, _, store) = fetcher(MockTransport::new().fail_with("ECONNRESET"));

        let err = fetcher.fetch(&token(), "nest").await.unwrap_err();
        assert!(err.is_unreachable());
        assert_eq!(store.get_device_state("nest"), Some(DeviceStatus::err()));
    }
}
