//! Core of mihrab: prayer schedule, Qibla direction and date labels.
//!
//! The pure pieces (Qibla geometry, schedule resolution, calendar labels) are
//! always available. The `async` feature adds the network client, the
//! locator and the [`Session`] that ties them together.

pub use mihrab_calendar as calendar;
pub use mihrab_qibla as qibla;
pub use mihrab_schedule as schedule;
pub use mihrab_types as types;

#[cfg(feature = "async")]
pub use mihrab_network as network;

pub use mihrab_calendar::{HijriLabel, hijri_label};
pub use mihrab_qibla::{bearing_to, direction_name, distance_to, qibla, qibla_bearing};
pub use mihrab_schedule::{PrayerScheduleEngine, status_at};
pub use mihrab_types::{
    CalculationMethod, CalculationSelection, Coordinate, CountdownState, MihrabError, Prayer,
    PrayerRow, PrayerState, PrayerTimeRecord, QiblaResult, ScheduleStatus, School, TimeOfDay,
};

#[cfg(feature = "async")]
pub use mihrab_schedule::{CountdownTimer, DisplayTarget};

#[cfg(feature = "async")]
pub mod session;

#[cfg(feature = "async")]
pub use session::{Session, SessionConfig};

pub mod prelude {
    pub use crate::types::*;
    pub use crate::{DateLabels, date_labels};
    pub use crate::{PrayerScheduleEngine, status_at};
    pub use crate::{bearing_to, direction_name, distance_to, qibla};

    #[cfg(feature = "async")]
    pub use crate::network::{GeoLocator, LocationSource, PrayerTimeClient, Resolution};
    #[cfg(feature = "async")]
    pub use crate::{CountdownTimer, Session, SessionConfig};
}

use chrono::{FixedOffset, NaiveDate};
use serde::Serialize;

/// Header labels for a given day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateLabels {
    /// `Sunday, October 18, 2026`
    pub gregorian: String,
    /// Best-effort Hijri date, never authoritative.
    pub hijri: HijriLabel,
    /// `UTC+3`
    pub timezone: String,
}

/// Builds the header labels for `date` in a zone at `offset`.
pub fn date_labels(date: NaiveDate, offset: FixedOffset) -> DateLabels {
    DateLabels {
        gregorian: calendar::gregorian_label(date),
        hijri: hijri_label(date),
        timezone: calendar::utc_offset_label(offset),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_labels() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let labels = date_labels(date, FixedOffset::east_opt(3 * 3600).unwrap());
        assert_eq!(labels.gregorian, "Sunday, October 18, 2026");
        assert_eq!(labels.timezone, "UTC+3");
        assert!(!labels.hijri.approximate);
        assert!(labels.hijri.to_string().ends_with("AH"));
    }

    #[test]
    fn test_reexports_compose() {
        let result = qibla(&Coordinate::new_unchecked(51.5074, -0.1278));
        assert_eq!(result.direction, direction_name(result.bearing_degrees));
        assert_eq!(result.direction, "ESE");
    }
}
