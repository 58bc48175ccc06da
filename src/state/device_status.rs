// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Published device status.

use serde::{Deserialize, Serialize};

use crate::snapshot::DeviceSnapshot;

/// Outcome of the most recent fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    /// The snapshot is current.
    Ok,
    /// The state is unknown. This does not mean the devices are off.
    Err,
}

/// What the state store holds for a device: `{state, value?}`.
///
/// # Examples
///
/// ```
/// use nestor_lib::state::{DeviceStatus, StatusKind};
///
/// let status = DeviceStatus::err();
/// assert_eq!(status.state, StatusKind::Err);
/// assert!(status.snapshot().is_none());
/// assert_eq!(serde_json::to_string(&status).unwrap(), r#"{"state":"err"}"#);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceStatus {
    /// Whether the value is current.
    pub state: StatusKind,
    /// The snapshot, present only when `state` is `ok`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<DeviceSnapshot>,
}

impl DeviceStatus {
    /// A successful fetch.
    #[must_use]
    pub fn ok(snapshot: DeviceSnapshot) -> Self {
        Self {
            state: StatusKind::Ok,
            value: Some(snapshot),
        }
    }

    /// A failed fetch.
    #[must_use]
    pub fn err() -> Self {
        Self {
            state: StatusKind::Err,
            value: None,
        }
    }

    /// Returns `true` for an `ok` status.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.state == StatusKind::Ok
    }

    /// Returns the snapshot of an `ok` status.
    #[must_use]
    pub fn snapshot(&self) -> Option<&DeviceSnapshot> {
        match self.state {
            StatusKind::Ok => self.value.as_ref(),
            StatusKind::Err => None,
        }
    }
}
