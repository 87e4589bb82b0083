//! Date labels for the prayer-times header.
//!
//! The Hijri label is a display value only. It is never used to decide
//! anything about prayer timing.

use chrono::{Datelike, Duration, FixedOffset, NaiveDate};
use hijri_date::HijriDate;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;

/// Minimum Gregorian year for tabular Hijri conversion.
pub const HIJRI_MIN_YEAR: i32 = 1938;
/// Maximum Gregorian year for tabular Hijri conversion.
pub const HIJRI_MAX_YEAR: i32 = 2076;

/// A Hijri date prepared for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HijriLabel {
    pub day: usize,
    pub month: usize,
    pub year: usize,
    /// True when produced by the linear approximation instead of the tabular calendar.
    pub approximate: bool,
}

impl fmt::Display for HijriLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} AH", self.day, hijri_month_name(self.month), self.year)
    }
}

// Thread-local cache: (gregorian, adjustment) -> (hijri_year, month, day)
thread_local! {
    static HIJRI_CACHE: RefCell<Option<(NaiveDate, i64, usize, usize, usize)>> = const { RefCell::new(None) };
}

/// Converts Gregorian to Hijri using the tabular calendar.
///
/// `adjustment` shifts the Gregorian date by whole days before conversion
/// (positive = Hijri ahead). Returns `None` outside 1938-2076.
pub fn to_hijri(date: NaiveDate, adjustment: i64) -> Option<HijriLabel> {
    let cached = HIJRI_CACHE.with(|cache| {
        cache.borrow().as_ref().and_then(|(d, adj, y, m, day)| {
            (*d == date && *adj == adjustment).then_some((*y, *m, *day))
        })
    });

    if let Some((year, month, day)) = cached {
        return Some(HijriLabel { day, month, year, approximate: false });
    }

    let adjusted = date.checked_add_signed(Duration::days(adjustment))?;
    if adjusted.year() < HIJRI_MIN_YEAR || adjusted.year() > HIJRI_MAX_YEAR {
        return None;
    }

    let hijri = HijriDate::from_gr(
        adjusted.year() as usize,
        adjusted.month() as usize,
        adjusted.day() as usize,
    )
    .ok()?;

    HIJRI_CACHE.with(|cache| {
        *cache.borrow_mut() = Some((date, adjustment, hijri.year(), hijri.month(), hijri.day()));
    });

    Some(HijriLabel {
        day: hijri.day(),
        month: hijri.month(),
        year: hijri.year(),
        approximate: false,
    })
}

/// Crude linear Hijri estimate.
///
/// Year scales the Gregorian year offset from 622 by the lunar/solar ratio,
/// month is shifted by eight, and the day is copied as is. Off by weeks.
pub fn approximate_hijri(date: NaiveDate) -> HijriLabel {
    let year = ((f64::from(date.year() - 622)) * 0.970224).floor() as i64 + 1;
    let month = (date.month() + 8) % 12 + 1;
    HijriLabel {
        day: date.day() as usize,
        month: month as usize,
        year: year.max(1) as usize,
        approximate: true,
    }
}

/// Best available label: tabular when in range, linear approximation otherwise.
pub fn hijri_label(date: NaiveDate) -> HijriLabel {
    to_hijri(date, 0).unwrap_or_else(|| approximate_hijri(date))
}

/// Returns Hijri month name.
pub fn hijri_month_name(month: usize) -> &'static str {
    match month {
        1 => "Muharram",
        2 => "Safar",
        3 => "Rabi' al-awwal",
        4 => "Rabi' al-thani",
        5 => "Jumada al-awwal",
        6 => "Jumada al-thani",
        7 => "Rajab",
        8 => "Sha'ban",
        9 => "Ramadan",
        10 => "Shawwal",
        11 => "Dhu al-Qi'dah",
        12 => "Dhu al-Hijjah",
        _ => "Unknown",
    }
}

/// Long Gregorian label, e.g. `Sunday, October 18, 2026`.
pub fn gregorian_label(date: NaiveDate) -> String {
    date.format("%A, %B %-d, %Y").to_string()
}

/// `UTC+3`, `UTC-4`, `UTC+5.5`.
pub fn utc_offset_label(offset: FixedOffset) -> String {
    let secs = offset.local_minus_utc();
    let sign = if secs >= 0 { '+' } else { '-' };
    let abs = secs.unsigned_abs();
    if abs % 3600 == 0 {
        format!("UTC{}{}", sign, abs / 3600)
    } else {
        let hours = f64::from(abs) / 3600.0;
        let text = format!("{hours:.2}");
        format!("UTC{}{}", sign, text.trim_end_matches('0'))
    }
}

/// Offset label of the runtime's local timezone right now.
pub fn local_timezone_label() -> String {
    utc_offset_label(*chrono::Local::now().offset())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_hit() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 11).unwrap();
        let h1 = to_hijri(date, 0).unwrap();
        let h2 = to_hijri(date, 0).unwrap();
        assert_eq!(h1, h2);
        assert!(!h1.approximate);
    }

    #[test]
    fn test_ramadan_1445() {
        // mid-Ramadan 1445
        let h = to_hijri(NaiveDate::from_ymd_opt(2024, 3, 25).unwrap(), 0).unwrap();
        assert_eq!(h.year, 1445);
        assert_eq!(h.month, 9);
    }

    #[test]
    fn test_out_of_range_falls_back_to_approximation() {
        let date = NaiveDate::from_ymd_opt(1900, 1, 1).unwrap();
        assert!(to_hijri(date, 0).is_none());
        let label = hijri_label(date);
        assert!(label.approximate);
    }

    #[test]
    fn test_linear_approximation_formula() {
        let h = approximate_hijri(NaiveDate::from_ymd_opt(2026, 10, 18).unwrap());
        // floor((2026 - 622) * 0.970224) + 1 = 1363
        assert_eq!(h.year, 1363);
        // (10 + 8) % 12 + 1 = 7
        assert_eq!(h.month, 7);
        assert_eq!(h.day, 18);
        assert_eq!(h.to_string(), "18 Rajab 1363 AH");
    }

    #[test]
    fn test_gregorian_label() {
        let d = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        assert_eq!(gregorian_label(d), "Sunday, October 18, 2026");
    }

    #[test]
    fn test_offset_labels() {
        assert_eq!(utc_offset_label(FixedOffset::east_opt(3 * 3600).unwrap()), "UTC+3");
        assert_eq!(utc_offset_label(FixedOffset::west_opt(4 * 3600).unwrap()), "UTC-4");
        assert_eq!(utc_offset_label(FixedOffset::east_opt(5 * 3600 + 1800).unwrap()), "UTC+5.5");
        assert_eq!(utc_offset_label(FixedOffset::east_opt(0).unwrap()), "UTC+0");
    }
}
