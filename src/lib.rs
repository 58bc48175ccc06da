// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `Nestor` Lib - A Rust library to monitor and control Nest thermostats and
//! Protect smoke detectors.
//!
//! This library provides an async API over the platform's mobile HTTPS
//! interface: it logs in, caches the access token, fetches a normalized
//! snapshot of every device and turns high-level commands into writes.
//!
//! # Supported Features
//!
//! - **Authentication**: login exchange, token cache with expiry, single-flight refresh
//! - **Snapshots**: structure presence, thermostat mode/temperatures/humidity,
//!   Protect smoke/CO/battery health, room labels
//! - **Commands**: `Home`, `Away`, `Fan_On`, `Fan_Auto`, and per-thermostat
//!   `mode-<label>-<mode>` / `temp-<label>-<°F>`
//! - **State publication**: every fetch ends as `ok` or `err` in a pluggable store
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use nestor_lib::{Command, Credentials, FileTokenStore, HttpConfig, MemoryStateStore, NestClient};
//!
//! #[tokio::main]
//! async fn main() -> nestor_lib::Result<()> {
//!     let state = Arc::new(MemoryStateStore::new());
//!     let client = NestClient::builder("nest", Credentials::new("me@example.com", "secret"))
//!         .build_http(HttpConfig::new(), FileTokenStore::new("auth.json"), Arc::clone(&state))?;
//!
//!     // Reuses the cached token if it is still valid
//!     let snapshot = client.connect().await?;
//!     for thermostat in snapshot.thermostats().values() {
//!         println!("{}: {}°F", thermostat.label, thermostat.temp_f);
//!     }
//!
//!     client.send(&Command::Away).await?;
//!     client.send_raw(None, Some("temp-Living Room-68")).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Reading State
//!
//! Fetch results are written to the [`StateStore`] given to the builder. An
//! `err` status means the state is unknown, not that devices are off:
//!
//! ```
//! use nestor_lib::{DeviceStatus, MemoryStateStore, StateStore};
//!
//! let store = MemoryStateStore::new();
//! store.update_state("nest", "nest", DeviceStatus::err());
//! assert!(store.get_device_state("nest").unwrap().snapshot().is_none());
//! ```

pub mod auth;
mod client;
pub mod command;
pub mod error;
pub mod protocol;
pub mod snapshot;
pub mod state;
pub mod types;

pub use auth::{AuthManager, AuthToken, Credentials, FileTokenStore, MemoryTokenStore, TokenStore};
pub use client::{CommandOutcome, NestClient, NestClientBuilder};
pub use command::{Command, CommandRouter, InvalidCommandPolicy, SubDeviceAction, SubDeviceCommand};
pub use error::{
    ApiError, AuthError, Error, ParseError, Result, RoutingError, StateError, TransportError,
    ValueError,
};
#[cfg(feature = "http")]
pub use protocol::{HttpConfig, HttpTransport};
pub use protocol::{ApiRequest, ApiResponse, Transport};
pub use snapshot::{DeviceSnapshot, ProtectState, ThermostatState};
pub use state::{DeviceStatus, MemoryStateStore, StateStore, StatusKind};
pub use types::{
    FanMode, HealthStatus, Location, ModeSetting, Presence, TargetTemperature, ThermostatMode,
};
