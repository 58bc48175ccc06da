// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device snapshots.
//!
//! [`SnapshotFetcher`] retrieves the user's device tree, normalizes it into a
//! [`DeviceSnapshot`] and publishes the result to a
//! [`StateStore`](crate::state::StateStore).

mod fetcher;
mod model;
mod parser;

pub use fetcher::{SnapshotFetcher, TYPE_CLASS, device_tree_path};
pub use model::{DeviceSnapshot, ProtectState, ThermostatState};
