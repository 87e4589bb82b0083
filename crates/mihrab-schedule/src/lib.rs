//! Current/next prayer resolution for a single day's record.
//!
//! Times are compared at minute resolution in the record's local wall clock.
//! After Isha the next prayer is tomorrow's Fajr, reusing today's Fajr time.

#[cfg(feature = "timer")]
pub mod timer;

#[cfg(feature = "timer")]
pub use timer::{CountdownTimer, DisplayTarget};

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use mihrab_types::constants::ACTIVE_WINDOW_MINUTES;
use mihrab_types::{CountdownState, Prayer, PrayerRow, PrayerState, PrayerTimeRecord, ScheduleStatus};
use smallvec::SmallVec;

fn minute_of_day(now: &NaiveDateTime) -> i64 {
    i64::from(now.hour()) * 60 + i64::from(now.minute())
}

/// Resolves the current and next prayer at `now`.
///
/// `next` is the first of the five prayers whose minute is strictly after
/// now's minute; if none is left today it is Fajr on the following day.
/// `current` is the last prayer at or before now's minute, `None` before Fajr.
///
/// # Example
/// ```rust
/// use chrono::NaiveDate;
/// use mihrab_schedule::status_at;
/// use mihrab_types::{Prayer, PrayerTimeRecord};
///
/// let record = PrayerTimeRecord {
///     fajr: "05:00".parse().unwrap(),
///     sunrise: None,
///     dhuhr: "12:00".parse().unwrap(),
///     asr: "15:30".parse().unwrap(),
///     maghrib: "18:00".parse().unwrap(),
///     isha: "19:30".parse().unwrap(),
/// };
/// let now = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap().and_hms_opt(10, 0, 0).unwrap();
/// let status = status_at(&record, now);
/// assert_eq!(status.next, Prayer::Dhuhr);
/// assert_eq!(status.current, Some(Prayer::Fajr));
/// ```
pub fn status_at(record: &PrayerTimeRecord, now: NaiveDateTime) -> ScheduleStatus {
    let now_minute = minute_of_day(&now);
    let today = now.date();

    let mut current = None;
    let mut next = None;
    for (prayer, time) in record.obligatory() {
        if time.minutes_since_midnight() > now_minute {
            next = Some((prayer, today.and_time(time.to_naive_time())));
            break;
        }
        current = Some(prayer);
    }

    let (next, next_at) = next.unwrap_or_else(|| {
        let tomorrow = today.succ_opt().unwrap_or(today);
        (Prayer::Fajr, tomorrow.and_time(record.fajr.to_naive_time()))
    });

    ScheduleStatus {
        current,
        next,
        next_at,
        ms_until_next: (next_at - now).num_milliseconds(),
    }
}

/// Labels every row of the day's table relative to `now`.
///
/// A prayer within five whole minutes either side of `now` is `Current`;
/// earlier ones are `Passed`; the rest are `Upcoming`. Seconds are ignored. Sunrise appears only when the
/// record carries it.
pub fn table(record: &PrayerTimeRecord, now: NaiveDateTime) -> SmallVec<[PrayerRow; 6]> {
    let now_minute = minute_of_day(&now);
    record
        .entries()
        .into_iter()
        .map(|(prayer, time)| {
            let delta = now_minute - time.minutes_since_midnight();
            let state = if delta.abs() <= ACTIVE_WINDOW_MINUTES {
                PrayerState::Current
            } else if delta > 0 {
                PrayerState::Passed
            } else {
                PrayerState::Upcoming
            };
            PrayerRow { prayer, time, state }
        })
        .collect()
}

/// Holds one day's record and the last resolved status.
#[derive(Debug, Clone)]
pub struct PrayerScheduleEngine {
    record: PrayerTimeRecord,
    status: ScheduleStatus,
    resolved_on: NaiveDate,
}

impl PrayerScheduleEngine {
    pub fn new(record: PrayerTimeRecord, now: NaiveDateTime) -> Self {
        let status = status_at(&record, now);
        Self { record, status, resolved_on: now.date() }
    }

    pub fn record(&self) -> &PrayerTimeRecord {
        &self.record
    }

    /// Status as of the last resolution.
    pub fn status(&self) -> &ScheduleStatus {
        &self.status
    }

    /// Swaps in a freshly fetched record and resolves against it.
    pub fn replace_record(&mut self, record: PrayerTimeRecord, now: NaiveDateTime) {
        self.record = record;
        self.resolve(now);
    }

    /// Countdown to the next prayer.
    ///
    /// Re-resolves once the previous target is reached or the calendar date
    /// rolls over, so the value handed out never goes negative.
    pub fn tick(&mut self, now: NaiveDateTime) -> CountdownState {
        if now >= self.status.next_at || now.date() != self.resolved_on {
            self.resolve(now);
        }
        CountdownState::from_millis((self.status.next_at - now).num_milliseconds())
    }

    pub fn table(&self, now: NaiveDateTime) -> SmallVec<[PrayerRow; 6]> {
        table(&self.record, now)
    }

    fn resolve(&mut self, now: NaiveDateTime) {
        self.status = status_at(&self.record, now);
        self.resolved_on = now.date();
    }
}
