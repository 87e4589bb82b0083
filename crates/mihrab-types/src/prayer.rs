use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::MihrabError;

/// The daily prayers plus Sunrise, in chronological order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Prayer {
    Fajr,
    /// Not a prayer; shown in the table when the provider supplies it.
    Sunrise,
    Dhuhr,
    Asr,
    Maghrib,
    Isha,
}

impl Prayer {
    /// The five mandatory prayers in the order the schedule walks them.
    pub const OBLIGATORY: [Prayer; 5] =
        [Prayer::Fajr, Prayer::Dhuhr, Prayer::Asr, Prayer::Maghrib, Prayer::Isha];

    /// Every row of the daily table, Sunrise included.
    pub const ALL: [Prayer; 6] = [
        Prayer::Fajr,
        Prayer::Sunrise,
        Prayer::Dhuhr,
        Prayer::Asr,
        Prayer::Maghrib,
        Prayer::Isha,
    ];

    pub fn is_obligatory(&self) -> bool {
        !matches!(self, Prayer::Sunrise)
    }

    /// Key used by the provider's `timings` object.
    pub fn provider_key(&self) -> &'static str {
        match self {
            Prayer::Fajr => "Fajr",
            Prayer::Sunrise => "Sunrise",
            Prayer::Dhuhr => "Dhuhr",
            Prayer::Asr => "Asr",
            Prayer::Maghrib => "Maghrib",
            Prayer::Isha => "Isha",
        }
    }
}

impl fmt::Display for Prayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.provider_key())
    }
}

/// A wall-clock time with minute precision and no attached timezone.
///
/// Interpreted as local to the coordinate the record was fetched for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    pub fn new(hour: u8, minute: u8) -> Result<Self, MihrabError> {
        if hour > 23 || minute > 59 {
            return Err(MihrabError::InvalidTime(format!("{hour:02}:{minute:02}")));
        }
        Ok(Self { hour, minute })
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn minutes_since_midnight(&self) -> i64 {
        i64::from(self.hour) * 60 + i64::from(self.minute)
    }

    pub fn to_naive_time(&self) -> NaiveTime {
        // hour/minute are range-checked on construction
        NaiveTime::from_hms_opt(u32::from(self.hour), u32::from(self.minute), 0)
            .unwrap_or(NaiveTime::MIN)
    }

    /// 12-hour clock label, e.g. `5:07 AM`, `12:30 PM`.
    pub fn to_12_hour(&self) -> String {
        let suffix = if self.hour >= 12 { "PM" } else { "AM" };
        let hour12 = match self.hour % 12 {
            0 => 12,
            h => h,
        };
        format!("{}:{:02} {}", hour12, self.minute, suffix)
    }
}

impl FromStr for TimeOfDay {
    type Err = MihrabError;

    /// Parses `HH:MM`, ignoring a trailing zone marker such as `05:12 (EET)`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || MihrabError::InvalidTime(s.to_string());
        let token = s.split_whitespace().next().ok_or_else(invalid)?;
        let token = token.split('(').next().unwrap_or(token);

        let mut parts = token.split(':');
        let hour: u8 = parts.next().and_then(|h| h.trim().parse().ok()).ok_or_else(invalid)?;
        let minute: u8 = parts.next().and_then(|m| m.trim().parse().ok()).ok_or_else(invalid)?;

        Self::new(hour, minute).map_err(|_| invalid())
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = MihrabError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(t: TimeOfDay) -> Self {
        t.to_string()
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// One day's prayer times.
///
/// The five mandatory prayers are required fields: a record missing any of
/// them cannot be constructed and therefore never reaches the schedule engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrayerTimeRecord {
    pub fajr: TimeOfDay,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sunrise: Option<TimeOfDay>,
    pub dhuhr: TimeOfDay,
    pub asr: TimeOfDay,
    pub maghrib: TimeOfDay,
    pub isha: TimeOfDay,
}

impl PrayerTimeRecord {
    /// Builds a record from the provider's `timings` map.
    ///
    /// # Errors
    /// Returns `InvalidPrayerPayload` naming every mandatory prayer that is
    /// missing, empty, or not a valid `HH:MM` time. An unparseable Sunrise is
    /// dropped rather than rejected.
    pub fn from_timings(timings: &HashMap<String, String>) -> Result<Self, MihrabError> {
        let mut missing: SmallVec<[&'static str; 5]> = SmallVec::new();
        let mut found: SmallVec<[TimeOfDay; 5]> = SmallVec::new();

        for prayer in Prayer::OBLIGATORY {
            match timings
                .get(prayer.provider_key())
                .filter(|s| !s.trim().is_empty())
                .and_then(|s| s.parse::<TimeOfDay>().ok())
            {
                Some(t) => found.push(t),
                None => missing.push(prayer.provider_key()),
            }
        }

        if !missing.is_empty() {
            return Err(MihrabError::InvalidPrayerPayload(format!(
                "API response missing required prayer times: {}",
                missing.join(", ")
            )));
        }

        let sunrise = timings
            .get(Prayer::Sunrise.provider_key())
            .and_then(|s| s.parse::<TimeOfDay>().ok());

        Ok(Self {
            fajr: found[0],
            sunrise,
            dhuhr: found[1],
            asr: found[2],
            maghrib: found[3],
            isha: found[4],
        })
    }

    pub fn get(&self, prayer: Prayer) -> Option<TimeOfDay> {
        match prayer {
            Prayer::Fajr => Some(self.fajr),
            Prayer::Sunrise => self.sunrise,
            Prayer::Dhuhr => Some(self.dhuhr),
            Prayer::Asr => Some(self.asr),
            Prayer::Maghrib => Some(self.maghrib),
            Prayer::Isha => Some(self.isha),
        }
    }

    /// The five mandatory prayers with their times, in order.
    pub fn obligatory(&self) -> [(Prayer, TimeOfDay); 5] {
        [
            (Prayer::Fajr, self.fajr),
            (Prayer::Dhuhr, self.dhuhr),
            (Prayer::Asr, self.asr),
            (Prayer::Maghrib, self.maghrib),
            (Prayer::Isha, self.isha),
        ]
    }

    /// Every present entry, Sunrise included when known.
    pub fn entries(&self) -> SmallVec<[(Prayer, TimeOfDay); 6]> {
        Prayer::ALL
            .iter()
            .filter_map(|p| self.get(*p).map(|t| (*p, t)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timings(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_parse_time_with_zone_suffix() {
        let t: TimeOfDay = "04:37 (WIB)".parse().unwrap();
        assert_eq!((t.hour(), t.minute()), (4, 37));
        assert_eq!(t.to_string(), "04:37");
    }

    #[test]
    fn test_parse_time_rejects_garbage() {
        assert!("".parse::<TimeOfDay>().is_err());
        assert!("25:00".parse::<TimeOfDay>().is_err());
        assert!("12:60".parse::<TimeOfDay>().is_err());
        assert!("noon".parse::<TimeOfDay>().is_err());
        assert!("12".parse::<TimeOfDay>().is_err());
    }

    #[test]
    fn test_twelve_hour_format() {
        assert_eq!(TimeOfDay::new(0, 5).unwrap().to_12_hour(), "12:05 AM");
        assert_eq!(TimeOfDay::new(5, 0).unwrap().to_12_hour(), "5:00 AM");
        assert_eq!(TimeOfDay::new(12, 30).unwrap().to_12_hour(), "12:30 PM");
        assert_eq!(TimeOfDay::new(19, 45).unwrap().to_12_hour(), "7:45 PM");
    }

    #[test]
    fn test_record_from_complete_timings() {
        let t = timings(&[
            ("Fajr", "05:00"),
            ("Sunrise", "06:15"),
            ("Dhuhr", "12:00"),
            ("Asr", "15:30"),
            ("Maghrib", "18:00"),
            ("Isha", "19:30"),
            ("Imsak", "04:50"),
        ]);
        let record = PrayerTimeRecord::from_timings(&t).unwrap();
        assert_eq!(record.asr.to_string(), "15:30");
        assert_eq!(record.sunrise.map(|s| s.to_string()).as_deref(), Some("06:15"));
        assert_eq!(record.entries().len(), 6);
    }

    #[test]
    fn test_record_without_sunrise() {
        let t = timings(&[
            ("Fajr", "05:00"),
            ("Dhuhr", "12:00"),
            ("Asr", "15:30"),
            ("Maghrib", "18:00"),
            ("Isha", "19:30"),
        ]);
        let record = PrayerTimeRecord::from_timings(&t).unwrap();
        assert_eq!(record.sunrise, None);
        assert_eq!(record.entries().len(), 5);
    }

    #[test]
    fn test_record_missing_prayers_is_rejected() {
        let t = timings(&[("Fajr", "05:00"), ("Dhuhr", ""), ("Asr", "15:30"), ("Maghrib", "18:00")]);
        let err = PrayerTimeRecord::from_timings(&t).unwrap_err();
        match err {
            MihrabError::InvalidPrayerPayload(msg) => {
                assert!(msg.contains("Dhuhr"));
                assert!(msg.contains("Isha"));
                assert!(!msg.contains("Fajr"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_time_serializes_as_string() {
        let t = TimeOfDay::new(18, 4).unwrap();
        assert_eq!(serde_json::to_string(&t).unwrap(), "\"18:04\"");
        let back: TimeOfDay = serde_json::from_str("\"18:04\"").unwrap();
        assert_eq!(back, t);
    }
}
