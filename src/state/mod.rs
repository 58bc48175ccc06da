// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device state publication.
//!
//! Fetch results are written to a [`StateStore`] as a [`DeviceStatus`]:
//! `ok` with a snapshot, or `err` with none. Callers must read `err` as
//! "state unknown", never as "device off".
//!
//! # Examples
//!
//! ```
//! use nestor_lib::state::{DeviceStatus, MemoryStateStore, StateStore};
//!
//! let store = MemoryStateStore::new();
//! store.update_state("living-room", "nest", DeviceStatus::err());
//!
//! let status = store.get_device_state("living-room").unwrap();
//! assert!(status.snapshot().is_none());
//! ```

mod device_status;
mod store;

pub use device_status::{DeviceStatus, StatusKind};
pub use store::{MemoryStateStore, StateStore, StateUpdate};
