// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Durable storage for the access token.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::auth::AuthToken;
use crate::error::StateError;

/// Loads and saves the cached token.
#[allow(async_fn_in_trait)]
pub trait TokenStore {
    /// Loads the cached token.
    ///
    /// Returns `Ok(None)` if nothing has been cached yet.
    ///
    /// # Errors
    ///
    /// Returns `StateError` if the cache exists but cannot be used.
    async fn load(&self) -> Result<Option<AuthToken>, StateError>;

    /// Replaces the cached token.
    ///
    /// # Errors
    ///
    /// Returns `StateError` if the cache cannot be written.
    async fn save(&self, token: &AuthToken) -> Result<(), StateError>;
}

impl<S: TokenStore> TokenStore for Arc<S> {
    async fn load(&self) -> Result<Option<AuthToken>, StateError> {
        (**self).load().await
    }

    async fn save(&self, token: &AuthToken) -> Result<(), StateError> {
        (**self).save(token).await
    }
}

/// Token cache kept in a JSON file.
///
/// # Examples
///
/// ```
/// use nestor_lib::auth::FileTokenStore;
///
/// let store = FileTokenStore::new("/var/lib/nestor/auth.json");
/// assert!(store.path().ends_with("auth.json"));
/// ```
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Creates a store backed by `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the cache file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    async fn load(&self) -> Result<Option<AuthToken>, StateError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if contents.trim().is_empty() {
            return Err(StateError::Corrupt("auth cache is empty".to_string()));
        }

        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|e| StateError::Corrupt(e.to_string()))
    }

    async fn save(&self, token: &AuthToken) -> Result<(), StateError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let contents =
            serde_json::to_string(token).map_err(|e| StateError::Corrupt(e.to_string()))?;
        tokio::fs::write(&self.path, contents).await?;

        tracing::info!(path = %self.path.display(), "Auth data cached");
        Ok(())
    }
}

/// Token cache kept in memory. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<AuthToken>>,
}

impl MemoryTokenStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `token`.
    #[must_use]
    pub fn with_token(token: AuthToken) -> Self {
        Self {
            token: Mutex::new(Some(token)),
        }
    }

    /// Returns the stored token.
    #[must_use]
    pub fn get(&self) -> Option<AuthToken> {
        self.token.lock().clone()
    }
}

impl TokenStore for MemoryTokenStore {
    async fn load(&self) -> Result<Option<AuthToken>, StateError> {
        Ok(self.get())
    }

    async fn save(&self, token: &AuthToken) -> Result<(), StateError> {
        *self.token.lock() = Some(token.clone());
        Ok(())
    }
}
