// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Temperature conversions and the settable target range.
//!
//! The platform stores every temperature in Celsius while commands and
//! snapshots are expressed in Fahrenheit. Conversions are exact; no rounding
//! happens beyond what `f64` arithmetic implies.

use std::fmt;
use std::str::FromStr;

use crate::error::ValueError;

/// Converts Celsius to Fahrenheit.
///
/// # Examples
///
/// ```
/// use nestor_lib::types::celsius_to_fahrenheit;
///
/// assert!((celsius_to_fahrenheit(20.0) - 68.0).abs() < 1e-9);
/// ```
#[must_use]
pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 1.8 + 32.0
}

/// Converts Fahrenheit to Celsius.
///
/// # Examples
///
/// ```
/// use nestor_lib::types::fahrenheit_to_celsius;
///
/// assert!((fahrenheit_to_celsius(212.0) - 100.0).abs() < 1e-9);
/// ```
#[must_use]
pub fn fahrenheit_to_celsius(fahrenheit: f64) -> f64 {
    (fahrenheit - 32.0) / 1.8
}

/// A thermostat set point in Fahrenheit, between 50 and 100 inclusive.
///
/// # Examples
///
/// ```
/// use nestor_lib::types::TargetTemperature;
///
/// let target: TargetTemperature = "72".parse().unwrap();
/// assert_eq!(target.fahrenheit(), 72.0);
///
/// assert!(TargetTemperature::new(40.0).is_err());
/// assert!("warm".parse::<TargetTemperature>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct TargetTemperature(f64);

impl TargetTemperature {
    /// Lowest accepted set point.
    pub const MIN_F: f64 = 50.0;

    /// Highest accepted set point.
    pub const MAX_F: f64 = 100.0;

    /// Creates a set point from a Fahrenheit value.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` outside 50..=100 (NaN included).
    pub fn new(fahrenheit: f64) -> Result<Self, ValueError> {
        if !(Self::MIN_F..=Self::MAX_F).contains(&fahrenheit) {
            return Err(ValueError::OutOfRange {
                min: Self::MIN_F,
                max: Self::MAX_F,
                actual: fahrenheit,
            });
        }
        Ok(Self(fahrenheit))
    }

    /// Returns the set point in Fahrenheit.
    #[must_use]
    pub const fn fahrenheit(&self) -> f64 {
        self.0
    }

    /// Returns the set point in Celsius, as the platform expects it.
    #[must_use]
    pub fn celsius(&self) -> f64 {
        fahrenheit_to_celsius(self.0)
    }
}

impl fmt::Display for TargetTemperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°F", self.0)
    }
}

impl FromStr for TargetTemperature {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| ValueError::NotANumber(s.to_string()))?;
        Self::new(value)
    }
}

impl TryFrom<f64> for TargetTemperature {
    type Error = ValueError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
