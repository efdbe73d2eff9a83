//! Driving preference model.
//!
//! Two representations exist at the boundary: a plain "can drive" flag and
//! a four-level preference. [`PreferenceLevel`] is canonical; everything
//! past the validator works on levels only. [`DrivingSignal::to_level`] is
//! the one place the flag is mapped.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::FamilyId;

/// A family's stated willingness to drive on one date.
///
/// Variants are ordered from most to least willing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreferenceLevel {
    /// Would like to drive this day.
    Preferable,
    /// Can drive, but would rather not.
    LessPreferable,
    /// Can drive, no preference either way.
    Neutral,
    /// Cannot drive this day.
    Unavailable,
}

impl PreferenceLevel {
    /// All levels, most willing first.
    pub const ALL: [PreferenceLevel; 4] = [
        PreferenceLevel::Preferable,
        PreferenceLevel::LessPreferable,
        PreferenceLevel::Neutral,
        PreferenceLevel::Unavailable,
    ];

    /// Whether this level makes the family a candidate driver.
    #[inline]
    pub fn can_drive(self) -> bool {
        self != PreferenceLevel::Unavailable
    }

    /// Wire name (`preferable`, `less_preferable`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            PreferenceLevel::Preferable => "preferable",
            PreferenceLevel::LessPreferable => "less_preferable",
            PreferenceLevel::Neutral => "neutral",
            PreferenceLevel::Unavailable => "unavailable",
        }
    }
}

impl fmt::Display for PreferenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Driving signal as submitted, in either representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrivingSignal {
    /// Boolean form.
    CanDrive(bool),
    /// Leveled form.
    Level(PreferenceLevel),
}

impl DrivingSignal {
    /// Maps the signal onto the canonical level.
    ///
    /// `true` carries no ranking information, so it becomes `Neutral`;
    /// `false` becomes `Unavailable`.
    pub fn to_level(self) -> PreferenceLevel {
        match self {
            DrivingSignal::CanDrive(true) => PreferenceLevel::Neutral,
            DrivingSignal::CanDrive(false) => PreferenceLevel::Unavailable,
            DrivingSignal::Level(level) => level,
        }
    }
}

impl From<bool> for DrivingSignal {
    fn from(can_drive: bool) -> Self {
        DrivingSignal::CanDrive(can_drive)
    }
}

impl From<PreferenceLevel> for DrivingSignal {
    fn from(level: PreferenceLevel) -> Self {
        DrivingSignal::Level(level)
    }
}

/// One family's preference for one date.
///
/// At most one entry exists per (family, date) in a week. A missing entry
/// means "no preference stated", not "cannot drive".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferenceEntry {
    /// Submitting family.
    pub family_id: FamilyId,
    /// Calendar date the preference applies to.
    pub date: NaiveDate,
    /// Canonical preference level.
    pub level: PreferenceLevel,
}

impl PreferenceEntry {
    /// Creates an entry from either signal representation.
    pub fn new(
        family_id: impl Into<FamilyId>,
        date: NaiveDate,
        signal: impl Into<DrivingSignal>,
    ) -> Self {
        Self {
            family_id: family_id.into(),
            date,
            level: signal.into().to_level(),
        }
    }

    /// Whether this entry makes the family a candidate driver.
    #[inline]
    pub fn can_drive(&self) -> bool {
        self.level.can_drive()
    }
}
