// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Translation of commands into write requests.

use serde_json::{Value, json};

use super::{Command, SubDeviceAction, SubDeviceCommand};
use crate::auth::{AuthToken, now_millis};
use crate::error::RoutingError;
use crate::protocol::ApiRequest;
use crate::snapshot::DeviceSnapshot;

/// Returns the write path for a structure.
#[must_use]
pub fn structure_path(structure_id: &str) -> String {
    format!("/v2/put/structure.{structure_id}")
}

/// Returns the write path for a thermostat's shared record.
#[must_use]
pub fn shared_path(serial: &str) -> String {
    format!("/v2/put/shared.{serial}")
}

/// What to do with a command that cannot be routed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum InvalidCommandPolicy {
    /// Log a warning and send nothing.
    #[default]
    Ignore,
    /// Return the routing error to the caller.
    Reject,
}

/// Turns commands into requests against the current snapshot.
///
/// # Examples
///
/// ```
/// use nestor_lib::auth::AuthToken;
/// use nestor_lib::command::{Command, CommandRouter};
/// use nestor_lib::snapshot::DeviceSnapshot;
/// use nestor_lib::types::Presence;
///
/// let token = AuthToken {
///     url: "transport.example".to_string(),
///     token: "secret".to_string(),
///     user_id: 1,
///     expire: i64::MAX,
/// };
/// let snapshot = DeviceSnapshot::new(Some("home".to_string()), Presence::On);
///
/// let request = CommandRouter::route_at(&Command::Away, &snapshot, &token, 1_000).unwrap();
/// assert_eq!(request.path(), "/v2/put/structure.home");
/// assert_eq!(request.args().unwrap()["away"], true);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandRouter {
    policy: InvalidCommandPolicy,
}

impl CommandRouter {
    /// Creates a router with the given policy.
    #[must_use]
    pub const fn new(policy: InvalidCommandPolicy) -> Self {
        Self { policy }
    }

    /// Returns the invalid-command policy.
    #[must_use]
    pub const fn policy(&self) -> InvalidCommandPolicy {
        self.policy
    }

    /// Routes a command stamped with the current time.
    ///
    /// # Errors
    ///
    /// See [`route_at`](Self::route_at).
    pub fn route(
        command: &Command,
        snapshot: &DeviceSnapshot,
        token: &AuthToken,
    ) -> Result<ApiRequest, RoutingError> {
        Self::route_at(command, snapshot, token, now_millis())
    }

    /// Applies the invalid-command policy to a routing failure.
    ///
    /// Under [`InvalidCommandPolicy::Ignore`] the failure is logged and handed
    /// back as `Ok`, meaning nothing is sent.
    ///
    /// # Errors
    ///
    /// Returns the failure unchanged under [`InvalidCommandPolicy::Reject`].
    pub fn on_invalid(&self, err: RoutingError) -> Result<RoutingError, RoutingError> {
        match self.policy {
            InvalidCommandPolicy::Ignore => {
                tracing::warn!(error = %err, "Ignoring invalid command");
                Ok(err)
            }
            InvalidCommandPolicy::Reject => Err(err),
        }
    }

    /// Routes a command with an explicit timestamp.
    ///
    /// # Errors
    ///
    /// Returns `RoutingError::NoStructure` for structure commands when the
    /// snapshot has no structure, and `RoutingError::NoMatchingDevice` when no
    /// thermostat carries the requested label.
    pub fn route_at(
        command: &Command,
        snapshot: &DeviceSnapshot,
        token: &AuthToken,
        now: i64,
    ) -> Result<ApiRequest, RoutingError> {
        match command {
            Command::Home => Self::structure_write(snapshot, token, away_args(false, now)),
            Command::Away => Self::structure_write(snapshot, token, away_args(true, now)),
            Command::FanOn => Self::structure_write(snapshot, token, json!({ "fan_mode": "on" })),
            Command::FanAuto => {
                Self::structure_write(snapshot, token, json!({ "fan_mode": "auto" }))
            }
            Command::SubDevice(sub) => Self::shared_write(sub, snapshot, token),
        }
    }

    fn structure_write(
        snapshot: &DeviceSnapshot,
        token: &AuthToken,
        args: Value,
    ) -> Result<ApiRequest, RoutingError> {
        let structure_id = snapshot.structure_id().ok_or(RoutingError::NoStructure)?;
        Ok(write_request(token, structure_path(structure_id), args))
    }

    fn shared_write(
        sub: &SubDeviceCommand,
        snapshot: &DeviceSnapshot,
        token: &AuthToken,
    ) -> Result<ApiRequest, RoutingError> {
        let thermostat = snapshot
            .first_labelled(sub.label())
            .ok_or_else(|| RoutingError::NoMatchingDevice(sub.label().to_string()))?;

        let args = match sub.action() {
            SubDeviceAction::Mode(mode) => json!({
                "target_change_pending": true,
                "target_temperature_type": mode.as_str(),
            }),
            SubDeviceAction::Temperature(target) => json!({
                "target_change_pending": true,
                "target_temperature": target.celsius(),
            }),
        };

        tracing::debug!(
            serial = %thermostat.serial,
            label = sub.label(),
            "Routing sub-device command"
        );
        Ok(write_request(token, shared_path(&thermostat.serial), args))
    }
}

fn away_args(away: bool, now: i64) -> Value {
    json!({
        "away": away,
        "away_timestamp": now,
        "away_setter": 0,
    })
}

fn write_request(token: &AuthToken, path: String, args: Value) -> ApiRequest {
    ApiRequest::post(&token.url, path)
        .with_auth(token.clone())
        .with_json(args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Method;
    use crate::snapshot::ThermostatState;
    use crate::types::{Presence, ThermostatMode, fahrenheit_to_celsius};

    const NOW: i64 = 1_700_000_000_000;

    fn token() -> AuthToken {
        AuthToken {
            url: "transport.example".to_string(),
            token: "secret".to_string(),
            user_id: 7,
            expire: i64::MAX,
        }
    }

    fn thermostat(serial: &str, label: &str) -> ThermostatState {
        ThermostatState {
            serial: serial.to_string(),
            mode: ThermostatMode::Heat,
            fan_mode: None,
            humidity_pct: None,
            temp_f: 68.0,
            target_f: 70.0,
            label: label.to_string(),
        }
    }

    fn snapshot() -> DeviceSnapshot {
        DeviceSnapshot::new(Some("s1".to_string()), Presence::On)
            .with_thermostat(thermostat("T1", "Kitchen"))
            .with_thermostat(thermostat("T2", "Kitchen"))
            .with_thermostat(thermostat("T3", "Living Room"))
    }

    fn route(input: &str) -> Result<ApiRequest, RoutingError> {
        let command: Command = input.parse()?;
        CommandRouter::route_at(&command, &snapshot(), &token(), NOW)
    }

    #[test]
    fn away_targets_structure() {
        let request = route("Away").unwrap();
        assert_eq!(request.method(), Method::Post);
        assert_eq!(request.host(), "transport.example");
        assert_eq!(request.path(), "/v2/put/structure.s1");
        assert_eq!(
            request.args(),
            Some(&json!({ "away": true, "away_timestamp": NOW, "away_setter": 0 }))
        );
        assert_eq!(request.auth().map(|t| t.user_id), Some(7));
    }

    #[test]
    fn away_without_thermostats() {
        let bare = DeviceSnapshot::new(Some("s1".to_string()), Presence::Off);
        let request = CommandRouter::route_at(&Command::Home, &bare, &token(), NOW).unwrap();
        assert_eq!(request.args().unwrap()["away"], false);
    }

    #[test]
    fn fan_commands() {
        assert_eq!(
            route("Fan_On").unwrap().args(),
            Some(&json!({ "fan_mode": "on" }))
        );
        assert_eq!(
            route("Fan_Auto").unwrap().args(),
            Some(&json!({ "fan_mode": "auto" }))
        );
    }

    #[test]
    fn structure_command_without_structure() {
        let empty = DeviceSnapshot::new(None, Presence::Off);
        assert_eq!(
            CommandRouter::route_at(&Command::Away, &empty, &token(), NOW),
            Err(RoutingError::NoStructure)
        );
    }

    #[test]
    fn temperature_converted_to_celsius() {
        let request = route("temp-Kitchen-72").unwrap();
        assert_eq!(request.path(), "/v2/put/shared.T1");

        let args = request.args().unwrap();
        assert_eq!(args["target_change_pending"], true);
        let celsius = args["target_temperature"].as_f64().unwrap();
        assert!((celsius - fahrenheit_to_celsius(72.0)).abs() < 1e-9);
        assert!((celsius - 22.222).abs() < 1e-3);
    }

    #[test]
    fn mode_targets_first_labelled_thermostat() {
        let request = route("mode-Living Room-cool").unwrap();
        assert_eq!(request.path(), "/v2/put/shared.T3");
        assert_eq!(
            request.args(),
            Some(&json!({ "target_change_pending": true, "target_temperature_type": "cool" }))
        );
    }

    #[test]
    fn unknown_label() {
        assert_eq!(
            route("mode-Garage-off"),
            Err(RoutingError::NoMatchingDevice("Garage".to_string()))
        );
    }

    #[test]
    fn ignore_policy_hands_failure_back() {
        let router = CommandRouter::default();
        assert_eq!(router.policy(), InvalidCommandPolicy::Ignore);

        let err = route("temp-Kitchen-40").unwrap_err();
        assert!(matches!(
            router.on_invalid(err),
            Ok(RoutingError::InvalidTemperature(_))
        ));
    }

    #[test]
    fn reject_policy_surfaces_error() {
        let router = CommandRouter::new(InvalidCommandPolicy::Reject);
        let err = route("mode-Garage-heat").unwrap_err();
        assert_eq!(
            router.on_invalid(err),
            Err(RoutingError::NoMatchingDevice("Garage".to_string()))
        );
    }

    #[test]
    fn route_uses_wall_clock() {
        let before = now_millis();
        let request = CommandRouter::route(&Command::Away, &snapshot(), &token()).unwrap();
        let stamp = request.args().unwrap()["away_timestamp"].as_i64().unwrap();
        assert!(stamp >= before);
    }
}
