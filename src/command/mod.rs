// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! User commands and their translation into platform writes.
//!
//! # Command Surface
//!
//! | Input | Target | Arguments |
//! |-------|--------|-----------|
//! | `Home` | structure | `away: false` |
//! | `Away` | structure | `away: true` |
//! | `Fan_On` | structure | `fan_mode: "on"` |
//! | `Fan_Auto` | structure | `fan_mode: "auto"` |
//! | `mode-<label>-<off\|heat\|cool>` | first thermostat labelled `<label>` | `target_temperature_type` |
//! | `temp-<label>-<50..100>` | first thermostat labelled `<label>` | `target_temperature` in Celsius |
//!
//! # Sub-device strings
//!
//! After the `mode-`/`temp-` prefix the remainder is split on every `-`: the
//! first piece is the label and the second the value. Labels with spaces such
//! as `Living Room` work; a label containing `-` cannot be addressed.
//!
//! ```
//! use nestor_lib::command::{Command, SubDeviceAction};
//! use nestor_lib::types::ModeSetting;
//!
//! let cmd: Command = "mode-Living Room-heat".parse().unwrap();
//! let Command::SubDevice(sub) = cmd else { unreachable!() };
//! assert_eq!(sub.label(), "Living Room");
//! assert_eq!(sub.action(), SubDeviceAction::Mode(ModeSetting::Heat));
//!
//! assert_eq!("Away".parse::<Command>().unwrap(), Command::Away);
//! ```

mod router;

pub use router::{CommandRouter, InvalidCommandPolicy, shared_path, structure_path};

use std::fmt;
use std::str::FromStr;

use crate::error::RoutingError;
use crate::types::{ModeSetting, TargetTemperature};

/// A command accepted by the client.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Mark the structure as occupied.
    Home,
    /// Mark the structure as away.
    Away,
    /// Run the fan continuously.
    FanOn,
    /// Run the fan automatically.
    FanAuto,
    /// Change one thermostat.
    SubDevice(SubDeviceCommand),
}

impl Command {
    /// Whitelisted top-level command names.
    pub const KEYMAP: [&'static str; 4] = ["Away", "Home", "Fan_On", "Fan_Auto"];

    /// Looks up a whitelisted top-level command.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "Home" => Some(Self::Home),
            "Away" => Some(Self::Away),
            "Fan_On" => Some(Self::FanOn),
            "Fan_Auto" => Some(Self::FanAuto),
            _ => None,
        }
    }

    /// Resolves a request carrying a command and/or a sub-device string.
    ///
    /// A whitelisted command wins; otherwise the sub-device string is parsed.
    ///
    /// # Errors
    ///
    /// Returns `RoutingError::UnknownCommand` if neither input is usable, or
    /// the sub-device parse error.
    pub fn resolve(command: Option<&str>, subdevice: Option<&str>) -> Result<Self, RoutingError> {
        if let Some(cmd) = command.and_then(Self::from_key) {
            return Ok(cmd);
        }
        match subdevice.filter(|s| !s.is_empty()) {
            Some(subdevice) => subdevice.parse::<SubDeviceCommand>().map(Self::SubDevice),
            None => Err(RoutingError::UnknownCommand(
                command.unwrap_or_default().to_string(),
            )),
        }
    }

    /// Returns the wire name of a top-level command.
    #[must_use]
    pub fn key(&self) -> Option<&'static str> {
        match self {
            Self::Home => Some("Home"),
            Self::Away => Some("Away"),
            Self::FanOn => Some("Fan_On"),
            Self::FanAuto => Some("Fan_Auto"),
            Self::SubDevice(_) => None,
        }
    }
}

impl FromStr for Command {
    type Err = RoutingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Self::from_key(s) {
            Some(cmd) => Ok(cmd),
            None => s.parse().map(Self::SubDevice),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.key(), self) {
            (Some(key), _) => f.write_str(key),
            (None, Self::SubDevice(sub)) => write!(f, "{sub}"),
            (None, _) => Ok(()),
        }
    }
}

/// Kind of sub-device change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubDeviceKind {
    /// `mode-...`
    Mode,
    /// `temp-...`
    Temp,
}

impl SubDeviceKind {
    /// Returns the string prefix for this kind, including the separator.
    #[must_use]
    pub const fn prefix(&self) -> &'static str {
        match self {
            Self::Mode => "mode-",
            Self::Temp => "temp-",
        }
    }
}

/// Validated value of a sub-device command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SubDeviceAction {
    /// Switch the operating mode.
    Mode(ModeSetting),
    /// Change the set point.
    Temperature(TargetTemperature),
}

impl SubDeviceAction {
    /// Returns the kind of this action.
    #[must_use]
    pub const fn kind(&self) -> SubDeviceKind {
        match self {
            Self::Mode(_) => SubDeviceKind::Mode,
            Self::Temperature(_) => SubDeviceKind::Temp,
        }
    }
}

/// A parsed `<kind>-<label>-<value>` string.
#[derive(Debug, Clone, PartialEq)]
pub struct SubDeviceCommand {
    label: String,
    action: SubDeviceAction,
}

impl SubDeviceCommand {
    /// Creates a sub-device command.
    #[must_use]
    pub fn new(label: impl Into<String>, action: SubDeviceAction) -> Self {
        Self {
            label: label.into(),
            action,
        }
    }

    /// Returns the thermostat label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the requested change.
    #[must_use]
    pub fn action(&self) -> SubDeviceAction {
        self.action
    }
}

impl FromStr for SubDeviceCommand {
    type Err = RoutingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, rest) = [SubDeviceKind::Mode, SubDeviceKind::Temp]
            .into_iter()
            .find_map(|kind| s.strip_prefix(kind.prefix()).map(|rest| (kind, rest)))
            .ok_or_else(|| RoutingError::UnknownCommand(s.to_string()))?;

        let mut parts = rest.split('-');
        let label = parts.next().unwrap_or_default();
        let value = parts
            .next()
            .ok_or_else(|| RoutingError::MalformedSubDevice(s.to_string()))?;

        let action = match kind {
            SubDeviceKind::Mode => value
                .parse()
                .map(SubDeviceAction::Mode)
                .map_err(|_| RoutingError::InvalidMode(value.to_string()))?,
            SubDeviceKind::Temp => value.parse().map(SubDeviceAction::Temperature)?,
        };

        Ok(Self::new(label, action))
    }
}

impl fmt::Display for SubDeviceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.action {
            SubDeviceAction::Mode(mode) => write!(f, "mode-{}-{mode}", self.label),
            SubDeviceAction::Temperature(t) => write!(f, "temp-{}-{}", self.label, t.fahrenheit()),
        }
    }
}
