//! WASM bindings for mihrab.
//!
//! Exposes the pure pieces (Qibla geometry, schedule resolution and table
//! states) to the browser front-end. Fetching stays in JavaScript.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use mihrab_core::{
    Coordinate, MihrabError, PrayerRow, PrayerTimeRecord, QiblaResult, ScheduleStatus, TimeOfDay,
};
use serde::Serialize;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Qibla bearing, distance and compass label for a position.
///
/// # Example (JavaScript)
/// ```js
/// const q = qibla(40.7128, -74.0060);
/// console.log(q.bearingDegrees, q.direction); // 58.48 "ENE"
/// ```
#[wasm_bindgen]
pub fn qibla(latitude: f64, longitude: f64) -> Result<JsValue, JsValue> {
    let result = qibla_for(latitude, longitude).map_err(js_err)?;
    serde_wasm_bindgen::to_value(&result).map_err(js_err)
}

/// Initial great-circle bearing between two points, in degrees.
#[wasm_bindgen]
pub fn bearing(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    mihrab_core::bearing_to(&Coordinate::new_unchecked(lat1, lon1), &Coordinate::new_unchecked(lat2, lon2))
}

/// Haversine distance between two points, in kilometres.
#[wasm_bindgen]
pub fn distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    mihrab_core::distance_to(&Coordinate::new_unchecked(lat1, lon1), &Coordinate::new_unchecked(lat2, lon2))
}

#[wasm_bindgen(js_name = directionName)]
pub fn direction_name(degrees: f64) -> String {
    mihrab_core::direction_name(degrees).to_string()
}

/// `"17:05"` to `"5:05 PM"`.
#[wasm_bindgen(js_name = formatTime12h)]
pub fn format_time_12h(time: &str) -> Result<String, JsValue> {
    time.parse::<TimeOfDay>().map(|t| t.to_12_hour()).map_err(js_err)
}

/// Current/next prayer from an Aladhan `timings` object at a local
/// `YYYY-MM-DDTHH:MM:SS` instant.
#[wasm_bindgen(js_name = scheduleStatus)]
pub fn schedule_status(timings: JsValue, now: &str) -> Result<JsValue, JsValue> {
    let timings: HashMap<String, String> = serde_wasm_bindgen::from_value(timings).map_err(js_err)?;
    let status = status_for(&timings, now).map_err(js_err)?;
    serde_wasm_bindgen::to_value(&status).map_err(js_err)
}

/// Table rows with Current/Passed/Upcoming states.
#[wasm_bindgen(js_name = prayerTable)]
pub fn prayer_table(timings: JsValue, now: &str) -> Result<JsValue, JsValue> {
    let timings: HashMap<String, String> = serde_wasm_bindgen::from_value(timings).map_err(js_err)?;
    let rows = table_for(&timings, now).map_err(js_err)?;
    serde_wasm_bindgen::to_value(&rows).map_err(js_err)
}

#[derive(Debug, Serialize, tsify::Tsify)]
#[tsify(into_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct WasmQibla {
    pub bearing_degrees: f64,
    pub distance_km: f64,
    pub direction: String,
}

impl From<QiblaResult> for WasmQibla {
    fn from(q: QiblaResult) -> Self {
        Self {
            bearing_degrees: q.bearing_degrees,
            distance_km: q.distance_km,
            direction: q.direction.to_string(),
        }
    }
}

#[derive(Debug, Serialize, tsify::Tsify)]
#[tsify(into_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct WasmScheduleStatus {
    pub current: Option<String>,
    pub next: String,
    pub next_at: String,
    pub ms_until_next: f64,
    pub countdown: String,
}

impl From<ScheduleStatus> for WasmScheduleStatus {
    fn from(s: ScheduleStatus) -> Self {
        Self {
            current: s.current.map(|p| p.to_string()),
            next: s.next.to_string(),
            next_at: s.next_at.format("%Y-%m-%dT%H:%M:%S").to_string(),
            ms_until_next: s.ms_until_next as f64,
            countdown: s.countdown().to_string(),
        }
    }
}

#[derive(Debug, Serialize, tsify::Tsify)]
#[tsify(into_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct WasmPrayerRow {
    pub prayer: String,
    pub time: String,
    pub time_12h: String,
    pub state: String,
}

impl From<PrayerRow> for WasmPrayerRow {
    fn from(r: PrayerRow) -> Self {
        Self {
            prayer: r.prayer.to_string(),
            time: r.time.to_string(),
            time_12h: r.time.to_12_hour(),
            state: r.state.to_string(),
        }
    }
}

fn qibla_for(latitude: f64, longitude: f64) -> Result<WasmQibla, MihrabError> {
    let origin = Coordinate::new(latitude, longitude)?;
    Ok(mihrab_core::qibla(&origin).into())
}

fn parse_now(now: &str) -> Result<NaiveDateTime, MihrabError> {
    NaiveDateTime::parse_from_str(now, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(now, "%Y-%m-%dT%H:%M"))
        .map_err(|e| MihrabError::InvalidTime(format!("{}: {}", now, e)))
}

fn status_for(timings: &HashMap<String, String>, now: &str) -> Result<WasmScheduleStatus, MihrabError> {
    let record = PrayerTimeRecord::from_timings(timings)?;
    Ok(mihrab_core::status_at(&record, parse_now(now)?).into())
}

fn table_for(timings: &HashMap<String, String>, now: &str) -> Result<Vec<WasmPrayerRow>, MihrabError> {
    let record = PrayerTimeRecord::from_timings(timings)?;
    Ok(mihrab_core::schedule::table(&record, parse_now(now)?)
        .into_iter()
        .map(WasmPrayerRow::from)
        .collect())
}
