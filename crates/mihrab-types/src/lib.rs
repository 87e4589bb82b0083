//! Core types for mihrab.

pub mod constants;
pub mod coordinate;
pub mod error;
pub mod method;
pub mod prayer;

pub use coordinate::Coordinate;
pub use error::MihrabError;
pub use method::{CalculationMethod, CalculationSelection, School};
pub use prayer::{Prayer, PrayerTimeRecord, TimeOfDay};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction and distance from an origin to the Kaaba.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QiblaResult {
    /// Initial great-circle bearing, clockwise from true North, in [0, 360).
    pub bearing_degrees: f64,
    pub distance_km: f64,
    /// Compass-rose label for `bearing_degrees` (e.g. "WNW").
    pub direction: &'static str,
}

/// Remaining time split into clock components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CountdownState {
    pub hours: u64,
    pub minutes: u8,
    pub seconds: u8,
}

impl CountdownState {
    /// Splits a millisecond delta. Negative deltas clamp to zero.
    pub fn from_millis(ms: i64) -> Self {
        let total_secs = (ms.max(0) / 1000) as u64;
        Self {
            hours: total_secs / 3600,
            minutes: ((total_secs % 3600) / 60) as u8,
            seconds: (total_secs % 60) as u8,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.hours == 0 && self.minutes == 0 && self.seconds == 0
    }
}

impl fmt::Display for CountdownState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
    }
}

/// Current and upcoming prayer at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleStatus {
    /// Last prayer whose time has passed today; `None` before Fajr.
    pub current: Option<Prayer>,
    pub next: Prayer,
    /// Local instant of `next`, tomorrow's Fajr after Isha.
    pub next_at: NaiveDateTime,
    pub ms_until_next: i64,
}

impl ScheduleStatus {
    pub fn countdown(&self) -> CountdownState {
        CountdownState::from_millis(self.ms_until_next)
    }

    /// True when the next prayer is tomorrow's Fajr.
    pub fn wraps_to_tomorrow(&self, today: chrono::NaiveDate) -> bool {
        self.next_at.date() > today
    }
}

/// Table label for a prayer relative to now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrayerState {
    /// Within the active window around its start.
    Current,
    Passed,
    Upcoming,
}

impl fmt::Display for PrayerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PrayerState::Current => "Current",
            PrayerState::Passed => "Passed",
            PrayerState::Upcoming => "Upcoming",
        };
        f.write_str(s)
    }
}

/// One row of the daily prayer table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrayerRow {
    pub prayer: Prayer,
    pub time: TimeOfDay,
    pub state: PrayerState,
}
