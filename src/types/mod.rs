// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types shared by snapshots and commands.
//!
//! # Types
//!
//! - [`TargetTemperature`] - Set point in Fahrenheit (50-100)
//! - [`Location`] - Fixed room names keyed by the platform's location codes
//! - [`ThermostatMode`] / [`ModeSetting`] - Reported and requestable modes
//! - [`FanMode`] - Thermostat fan setting
//! - [`Presence`] - Home/away state of a structure
//! - [`HealthStatus`] - Detector subsystem health

mod location;
mod mode;
mod temperature;

pub use location::{Location, WHERE_ID_PREFIX, label_for_where_id};
pub use mode::{FanMode, HealthStatus, ModeSetting, Presence, ThermostatMode};
pub use temperature::{TargetTemperature, celsius_to_fahrenheit, fahrenheit_to_celsius};
