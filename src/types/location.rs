// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Room names for the platform's fixed location codes.

use std::fmt;

/// Common prefix of every built-in `where_id`.
pub const WHERE_ID_PREFIX: &str = "00000000-0000-0000-0000-0001000000";

/// One of the fixed rooms a device can be placed in.
///
/// # Examples
///
/// ```
/// use nestor_lib::types::{Location, label_for_where_id};
///
/// assert_eq!(Location::from_code("0a"), Some(Location::Kitchen));
/// assert_eq!(
///     label_for_where_id("00000000-0000-0000-0000-00010000000c"),
///     "Living Room"
/// );
/// assert_eq!(label_for_where_id("custom-room"), "");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location {
    /// Code `01`.
    Basement,
    /// Code `0d`.
    Bedroom,
    /// Code `03`.
    Den,
    /// Code `10`.
    DiningRoom,
    /// Code `06`.
    Downstairs,
    /// Code `00`.
    Entryway,
    /// Code `0b`.
    FamilyRoom,
    /// Code `02`.
    Hallway,
    /// Code `08`.
    KidsRoom,
    /// Code `0a`.
    Kitchen,
    /// Code `0c`.
    LivingRoom,
    /// Code `05`.
    MasterBedroom,
    /// Code `0e`.
    Office,
    /// Code `0f`.
    Upstairs,
}

impl Location {
    /// Every known location.
    pub const ALL: [Self; 14] = [
        Self::Basement,
        Self::Bedroom,
        Self::Den,
        Self::DiningRoom,
        Self::Downstairs,
        Self::Entryway,
        Self::FamilyRoom,
        Self::Hallway,
        Self::KidsRoom,
        Self::Kitchen,
        Self::LivingRoom,
        Self::MasterBedroom,
        Self::Office,
        Self::Upstairs,
    ];

    /// Looks up a two-character location code.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|location| location.code() == code)
    }

    /// Returns the platform's code for this location.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Entryway => "00",
            Self::Basement => "01",
            Self::Hallway => "02",
            Self::Den => "03",
            Self::MasterBedroom => "05",
            Self::Downstairs => "06",
            Self::KidsRoom => "08",
            Self::Kitchen => "0a",
            Self::FamilyRoom => "0b",
            Self::LivingRoom => "0c",
            Self::Bedroom => "0d",
            Self::Office => "0e",
            Self::Upstairs => "0f",
            Self::DiningRoom => "10",
        }
    }

    /// Returns the display name used as a device label.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Basement => "Basement",
            Self::Bedroom => "Bedroom",
            Self::Den => "Den",
            Self::DiningRoom => "Dining Room",
            Self::Downstairs => "Downstairs",
            Self::Entryway => "Entryway",
            Self::FamilyRoom => "Family Room",
            Self::Hallway => "Hallway",
            Self::KidsRoom => "Kids Room",
            Self::Kitchen => "Kitchen",
            Self::LivingRoom => "Living Room",
            Self::MasterBedroom => "Master Bedroom",
            Self::Office => "Office",
            Self::Upstairs => "Upstairs",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Maps a device `where_id` to its label, or `""` when the code is unknown.
///
/// The well-known prefix is stripped first; ids without it are looked up as-is.
#[must_use]
pub fn label_for_where_id(where_id: &str) -> &'static str {
    let code = where_id.strip_prefix(WHERE_ID_PREFIX).unwrap_or(where_id);
    Location::from_code(code).map_or("", |location| location.name())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_code_maps_to_its_name() {
        let table = [
            ("01", "Basement"),
            ("0d", "Bedroom"),
            ("03", "Den"),
            ("10", "Dining Room"),
            ("06", "Downstairs"),
            ("00", "Entryway"),
            ("0b", "Family Room"),
            ("02", "Hallway"),
            ("08", "Kids Room"),
            ("0a", "Kitchen"),
            ("0c", "Living Room"),
            ("05", "Master Bedroom"),
            ("0e", "Office"),
            ("0f", "Upstairs"),
        ];

        for (code, name) in table {
            assert_eq!(label_for_where_id(code), name);
            assert_eq!(label_for_where_id(&format!("{WHERE_ID_PREFIX}{code}")), name);
        }
    }

    #[test]
    fn codes_are_unique() {
        for location in Location::ALL {
            assert_eq!(Location::from_code(location.code()), Some(location));
        }
    }

    #[test]
    fn unknown_codes_are_empty() {
        assert_eq!(label_for_where_id("04"), "");
        assert_eq!(label_for_where_id("0A"), "");
        assert_eq!(label_for_where_id(""), "");
        assert_eq!(label_for_where_id(&format!("{WHERE_ID_PREFIX}ff")), "");
    }
}
