// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! State store interface and an in-memory implementation.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast;

use super::DeviceStatus;

/// Default channel capacity for state update notifications.
const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Key-value store where fetch results are published.
///
/// This is the only way fetch results leave the library and the only way
/// command routing learns about the current snapshot.
pub trait StateStore {
    /// Records the status of a device.
    fn update_state(&self, device_id: &str, type_class: &str, status: DeviceStatus);

    /// Returns the last status recorded for a device.
    fn get_device_state(&self, device_id: &str) -> Option<DeviceStatus>;
}

impl<S: StateStore + ?Sized> StateStore for Arc<S> {
    fn update_state(&self, device_id: &str, type_class: &str, status: DeviceStatus) {
        (**self).update_state(device_id, type_class, status);
    }

    fn get_device_state(&self, device_id: &str) -> Option<DeviceStatus> {
        (**self).get_device_state(device_id)
    }
}

/// A status update published by [`MemoryStateStore`].
#[derive(Debug, Clone, PartialEq)]
pub struct StateUpdate {
    /// The device that was updated.
    pub device_id: String,
    /// The controller type the update came from.
    pub type_class: String,
    /// The new status.
    pub status: DeviceStatus,
}

/// In-memory state store.
///
/// Every update is also broadcast to subscribers, so a renderer can redraw
/// without polling the store. Slow subscribers may miss updates
/// (`RecvError::Lagged`); the store itself always holds the latest status.
///
/// # Examples
///
/// ```
/// use nestor_lib::state::{DeviceStatus, MemoryStateStore, StateStore};
///
/// let store = MemoryStateStore::new();
/// let mut updates = store.subscribe();
///
/// store.update_state("nest", "nest", DeviceStatus::err());
///
/// assert!(!store.get_device_state("nest").unwrap().is_ok());
/// assert_eq!(updates.try_recv().unwrap().device_id, "nest");
/// ```
#[derive(Debug)]
pub struct MemoryStateStore {
    states: RwLock<HashMap<String, DeviceStatus>>,
    sender: broadcast::Sender<StateUpdate>,
}

impl MemoryStateStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(DEFAULT_CHANNEL_CAPACITY);
        Self {
            states: RwLock::new(HashMap::new()),
            sender,
        }
    }

    /// Subscribes to status updates published after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StateUpdate> {
        self.sender.subscribe()
    }

    /// Returns the number of devices with a recorded status.
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.read().len()
    }

    /// Returns `true` if nothing has been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.read().is_empty()
    }
}

impl Default for MemoryStateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore for MemoryStateStore {
    fn update_state(&self, device_id: &str, type_class: &str, status: DeviceStatus) {
        self.states
            .write()
            .insert(device_id.to_string(), status.clone());

        // Ignore errors (no subscribers)
        let _ = self.sender.send(StateUpdate {
            device_id: device_id.to_string(),
            type_class: type_class.to_string(),
            status,
        });
    }

    fn get_device_state(&self, device_id: &str) -> Option<DeviceStatus> {
        self.states.read().get(device_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::DeviceSnapshot;
    use crate::types::Presence;

    #[test]
    fn unknown_device_has_no_state() {
        let store = MemoryStateStore::new();
        assert!(store.get_device_state("missing").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn latest_update_wins() {
        let store = MemoryStateStore::new();
        let snapshot = DeviceSnapshot::new(Some("s".to_string()), Presence::On);

        store.update_state("nest", "nest", DeviceStatus::ok(snapshot));
        store.update_state("nest", "nest", DeviceStatus::err());

        assert_eq!(store.get_device_state("nest"), Some(DeviceStatus::err()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn subscribers_receive_updates() {
        let store = MemoryStateStore::new();
        let mut rx = store.subscribe();

        store.update_state("nest", "nest", DeviceStatus::err());

        let update = rx.try_recv().unwrap();
        assert_eq!(update.type_class, "nest");
        assert_eq!(update.status, DeviceStatus::err());
    }

    #[test]
    fn shared_through_arc() {
        let store = Arc::new(MemoryStateStore::new());
        let handle: Arc<MemoryStateStore> = Arc::clone(&store);

        handle.update_state("a", "nest", DeviceStatus::err());
        assert!(store.get_device_state("a").is_some());
    }
}
