// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Authentication lifecycle.
//!
//! - [`AuthToken`]: token, transport host, user id and absolute expiry
//! - [`TokenStore`]: injectable cache ([`FileTokenStore`], [`MemoryTokenStore`])
//! - [`AuthManager`]: reuses a valid token or performs the login exchange
//!
//! A token is considered expired when it is absent, malformed, or its
//! `expire` is not after the current wall-clock time.

mod manager;
mod store;
mod token;

pub use manager::{AuthManager, DEFAULT_LOGIN_HOST, LOGIN_PATH, TokenSource};
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use token::{AuthToken, Credentials, now_millis};
