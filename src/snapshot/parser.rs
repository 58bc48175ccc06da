// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Normalization of the platform's device tree.
//!
//! The tree holds four collections keyed by id:
//!
//! | Collection | Content |
//! |------------|---------|
//! | `structure` | homes; only the first one is used |
//! | `topaz` | smoke/CO detectors |
//! | `device` | thermostats |
//! | `shared` | current/target temperature and mode, keyed by thermostat serial |

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::ParseError;
use crate::snapshot::{DeviceSnapshot, ProtectState, ThermostatState};
use crate::types::{
    FanMode, HealthStatus, Presence, ThermostatMode, celsius_to_fahrenheit, label_for_where_id,
};

#[derive(Debug, Default, Deserialize)]
struct DeviceTree {
    #[serde(default)]
    structure: IndexMap<String, RawStructure>,
    #[serde(default)]
    topaz: IndexMap<String, RawTopaz>,
    #[serde(default)]
    device: IndexMap<String, RawDevice>,
    #[serde(default)]
    shared: IndexMap<String, RawShared>,
}

#[derive(Debug, Deserialize)]
struct RawStructure {
    #[serde(default)]
    away: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct RawTopaz {
    #[serde(default)]
    serial_number: Option<String>,
    #[serde(default)]
    smoke_status: Option<i64>,
    #[serde(default)]
    co_status: Option<i64>,
    #[serde(default)]
    battery_health_state: Option<i64>,
    #[serde(default)]
    where_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawDevice {
    #[serde(default)]
    serial_number: Option<String>,
    #[serde(default)]
    fan_mode: Option<FanMode>,
    #[serde(default)]
    current_humidity: Option<f64>,
    #[serde(default)]
    where_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawShared {
    #[serde(default)]
    target_temperature_type: Option<ThermostatMode>,
    #[serde(default)]
    current_temperature: Option<f64>,
    #[serde(default)]
    target_temperature: Option<f64>,
}

impl DeviceSnapshot {
    /// Builds a snapshot from the raw device tree.
    ///
    /// Multiple structures are not supported: the first one listed is the
    /// home, the rest are ignored.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Json` if the tree has the wrong shape, and
    /// `ParseError::MissingField` if a thermostat has no shared record or
    /// the record lacks a temperature.
    pub fn from_device_tree(tree: &serde_json::Value) -> Result<Self, ParseError> {
        let tree = DeviceTree::deserialize(tree)?;

        let (structure_id, presence) = match tree.structure.first() {
            Some((id, structure)) => (Some(id.clone()), Presence::from_away(structure.away)),
            None => (None, Presence::Off),
        };
        if tree.structure.len() > 1 {
            tracing::debug!(
                count = tree.structure.len(),
                "Ignoring structures beyond the first"
            );
        }

        let mut snapshot = Self::new(structure_id, presence);

        for (key, topaz) in tree.topaz {
            let serial = topaz.serial_number.unwrap_or(key);
            snapshot = snapshot.with_protect(ProtectState {
                smoke_status: HealthStatus::from_code(topaz.smoke_status),
                co_status: HealthStatus::from_code(topaz.co_status),
                battery_status: HealthStatus::from_code(topaz.battery_health_state),
                label: label_of(topaz.where_id.as_deref()),
                serial,
            });
        }

        for (key, device) in tree.device {
            let serial = device.serial_number.unwrap_or(key);
            let shared = tree
                .shared
                .get(&serial)
                .ok_or_else(|| ParseError::MissingField(format!("shared.{serial}")))?;
            let temp_c = shared.current_temperature.ok_or_else(|| {
                ParseError::MissingField(format!("shared.{serial}.current_temperature"))
            })?;
            let target_c = shared.target_temperature.ok_or_else(|| {
                ParseError::MissingField(format!("shared.{serial}.target_temperature"))
            })?;

            snapshot = snapshot.with_thermostat(ThermostatState {
                mode: shared
                    .target_temperature_type
                    .clone()
                    .unwrap_or(ThermostatMode::Off),
                fan_mode: device.fan_mode,
                humidity_pct: device.current_humidity,
                temp_f: celsius_to_fahrenheit(temp_c),
                target_f: celsius_to_fahrenheit(target_c),
                label: label_of(device.where_id.as_deref()),
                serial,
            });
        }

        Ok(snapshot)
    }
}

fn label_of(where_id: Option<&str>) -> String {
    where_id.map_or("", label_for_where_id).to_string()
}
