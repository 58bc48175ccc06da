// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Normalized device snapshot.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::types::{FanMode, HealthStatus, Presence, ThermostatMode};

/// State of one thermostat, temperatures in Fahrenheit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThermostatState {
    /// Serial number.
    pub serial: String,
    /// Operating mode.
    pub mode: ThermostatMode,
    /// Fan mode, if reported.
    pub fan_mode: Option<FanMode>,
    /// Relative humidity in percent, if reported.
    pub humidity_pct: Option<f64>,
    /// Current temperature.
    pub temp_f: f64,
    /// Target temperature.
    pub target_f: f64,
    /// Room label, empty when the location is unknown.
    pub label: String,
}

/// State of one smoke/CO detector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtectState {
    /// Serial number.
    pub serial: String,
    /// Smoke sensor.
    pub smoke_status: HealthStatus,
    /// Carbon monoxide sensor.
    pub co_status: HealthStatus,
    /// Battery health.
    pub battery_status: HealthStatus,
    /// Room label, empty when the location is unknown.
    pub label: String,
}

/// Everything known about one home after a fetch.
///
/// A snapshot is built once and never modified; command routing only reads
/// it. Devices keep the order in which the platform listed them, which makes
/// "first thermostat with this label" deterministic.
///
/// # Examples
///
/// ```
/// use nestor_lib::snapshot::{DeviceSnapshot, ThermostatState};
/// use nestor_lib::types::{Presence, ThermostatMode};
///
/// let snapshot = DeviceSnapshot::new(Some("s1".to_string()), Presence::On)
///     .with_thermostat(ThermostatState {
///         serial: "T1".to_string(),
///         mode: ThermostatMode::Heat,
///         fan_mode: None,
///         humidity_pct: None,
///         temp_f: 68.0,
///         target_f: 70.0,
///         label: "Kitchen".to_string(),
///     });
///
/// assert_eq!(snapshot.first_labelled("Kitchen").unwrap().serial, "T1");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSnapshot {
    structure_id: Option<String>,
    presence: Presence,
    thermostats: IndexMap<String, ThermostatState>,
    protects: IndexMap<String, ProtectState>,
}

impl DeviceSnapshot {
    /// Creates a snapshot without devices.
    #[must_use]
    pub fn new(structure_id: Option<String>, presence: Presence) -> Self {
        Self {
            structure_id,
            presence,
            thermostats: IndexMap::new(),
            protects: IndexMap::new(),
        }
    }

    /// Adds a thermostat, replacing any with the same serial.
    #[must_use]
    pub fn with_thermostat(mut self, thermostat: ThermostatState) -> Self {
        self.thermostats.insert(thermostat.serial.clone(), thermostat);
        self
    }

    /// Adds a detector, replacing any with the same serial.
    #[must_use]
    pub fn with_protect(mut self, protect: ProtectState) -> Self {
        self.protects.insert(protect.serial.clone(), protect);
        self
    }

    /// Returns the id of the home's structure.
    #[must_use]
    pub fn structure_id(&self) -> Option<&str> {
        self.structure_id.as_deref()
    }

    /// Returns the household presence.
    #[must_use]
    pub fn presence(&self) -> Presence {
        self.presence
    }

    /// Returns all thermostats keyed by serial.
    #[must_use]
    pub fn thermostats(&self) -> &IndexMap<String, ThermostatState> {
        &self.thermostats
    }

    /// Returns all detectors keyed by serial.
    #[must_use]
    pub fn protects(&self) -> &IndexMap<String, ProtectState> {
        &self.protects
    }

    /// Returns the thermostat with the given serial.
    #[must_use]
    pub fn thermostat(&self, serial: &str) -> Option<&ThermostatState> {
        self.thermostats.get(serial)
    }

    /// Returns every thermostat whose label matches exactly.
    ///
    /// Labels are not unique; several thermostats can share a room.
    pub fn thermostats_labelled<'a>(
        &'a self,
        label: &'a str,
    ) -> impl Iterator<Item = &'a ThermostatState> + 'a {
        self.thermostats.values().filter(move |t| t.label == label)
    }

    /// Returns the first thermostat whose label matches exactly.
    #[must_use]
    pub fn first_labelled(&self, label: &str) -> Option<&ThermostatState> {
        self.thermostats.values().find(|t| t.label == label)
    }
}
