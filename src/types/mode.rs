// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mode and status enumerations reported by the platform.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// Thermostat operating mode as reported in the shared record.
///
/// The platform may report modes this library does not know about; they are
/// kept verbatim in [`ThermostatMode::Other`].
///
/// # Examples
///
/// ```
/// use nestor_lib::types::ThermostatMode;
///
/// assert_eq!(ThermostatMode::from("heat"), ThermostatMode::Heat);
/// assert_eq!(ThermostatMode::from("eco").as_str(), "eco");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ThermostatMode {
    /// Heating.
    Heat,
    /// Cooling.
    Cool,
    /// Heating and cooling to keep a range.
    Range,
    /// Off.
    Off,
    /// Any other mode string.
    Other(String),
}

impl ThermostatMode {
    /// Returns the platform string for this mode.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Heat => "heat",
            Self::Cool => "cool",
            Self::Range => "range",
            Self::Off => "off",
            Self::Other(mode) => mode,
        }
    }
}

impl From<String> for ThermostatMode {
    fn from(value: String) -> Self {
        match value.as_str() {
            "heat" => Self::Heat,
            "cool" => Self::Cool,
            "range" => Self::Range,
            "off" => Self::Off,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for ThermostatMode {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<ThermostatMode> for String {
    fn from(value: ThermostatMode) -> Self {
        match value {
            ThermostatMode::Other(mode) => mode,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ThermostatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A mode that can be requested through a `mode-<label>-<value>` command.
///
/// # Examples
///
/// ```
/// use nestor_lib::types::ModeSetting;
///
/// assert_eq!("cool".parse::<ModeSetting>().unwrap(), ModeSetting::Cool);
/// assert!("range".parse::<ModeSetting>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModeSetting {
    /// Turn the thermostat off.
    Off,
    /// Heat.
    Heat,
    /// Cool.
    Cool,
}

impl ModeSetting {
    /// Returns the platform string for this setting.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Heat => "heat",
            Self::Cool => "cool",
        }
    }
}

impl FromStr for ModeSetting {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "off" => Ok(Self::Off),
            "heat" => Ok(Self::Heat),
            "cool" => Ok(Self::Cool),
            _ => Err(ValueError::InvalidMode(s.to_string())),
        }
    }
}

impl fmt::Display for ModeSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fan mode reported by a thermostat.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FanMode {
    /// Fan runs continuously.
    On,
    /// Fan runs with the heating or cooling cycle.
    Auto,
    /// Any other fan mode string.
    Other(String),
}

impl FanMode {
    /// Returns the platform string for this fan mode.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::On => "on",
            Self::Auto => "auto",
            Self::Other(mode) => mode,
        }
    }
}

impl From<String> for FanMode {
    fn from(value: String) -> Self {
        match value.as_str() {
            "on" => Self::On,
            "auto" => Self::Auto,
            _ => Self::Other(value),
        }
    }
}

impl From<FanMode> for String {
    fn from(value: FanMode) -> Self {
        match value {
            FanMode::Other(mode) => mode,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for FanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Presence of the household, derived from the structure's away flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    /// Somebody is home.
    On,
    /// Away, or the flag is unknown.
    Off,
}

impl Presence {
    /// Derives presence from the raw away flag.
    ///
    /// Only an explicit `false` means home.
    #[must_use]
    pub fn from_away(away: Option<bool>) -> Self {
        if away == Some(false) { Self::On } else { Self::Off }
    }
}

/// Health of one detector subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Nothing to report.
    Ok,
    /// Alarm, warning, or unknown state.
    Err,
}

impl HealthStatus {
    /// Derives the status from a raw platform code, where only `0` is healthy.
    #[must_use]
    pub fn from_code(code: Option<i64>) -> Self {
        if code == Some(0) { Self::Ok } else { Self::Err }
    }
}
