//! Fixed values shared across the workspace.

use std::time::Duration;

/// Kaaba latitude (Masjid al-Haram).
pub const KAABA_LATITUDE: f64 = 21.4225;
/// Kaaba longitude (Masjid al-Haram).
pub const KAABA_LONGITUDE: f64 = 39.8262;

/// Fallback latitude used when no location can be resolved (Mecca).
pub const FALLBACK_LATITUDE: f64 = 21.3891;
/// Fallback longitude used when no location can be resolved (Mecca).
pub const FALLBACK_LONGITUDE: f64 = 39.8579;
/// Display name attached to the fallback coordinate.
pub const FALLBACK_NAME: &str = "Mecca, Saudi Arabia";

/// Mean Earth radius for the Haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Storage slot holding the single cached location.
pub const LOCATION_STORAGE_KEY: &str = "prayerLocation";

/// Per-candidate timeout for prayer-time requests.
pub const PRAYER_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
/// Bounded wait for a device location fix.
pub const LOCATION_TIMEOUT: Duration = Duration::from_secs(10);
/// Envelope for the best-effort reverse geocoding lookup.
pub const GEOCODE_TIMEOUT: Duration = Duration::from_secs(5);

/// Aladhan daily timings endpoint.
pub const ALADHAN_TIMINGS_URL: &str = "https://api.aladhan.com/v1/timings";
/// BigDataCloud client-side reverse geocoding endpoint.
pub const BIGDATACLOUD_REVERSE_URL: &str = "https://api.bigdatacloud.net/data/reverse-geocode-client";
/// IP geolocation endpoint.
pub const IPAPI_URL: &str = "https://ipapi.co/json/";

/// Relay prefixes tried in order after the direct call.
/// The provider URL is percent-encoded and appended.
pub const RELAY_TEMPLATES: [&str; 3] = [
    "https://api.allorigins.win/raw?url=",
    "https://corsproxy.io/?",
    "https://api.codetabs.com/v1/proxy?quest=",
];

/// A prayer is shown as "Current" within this many minutes of its start.
pub const ACTIVE_WINDOW_MINUTES: i64 = 5;

/// Upper bound on days fetched for the monthly schedule.
pub const MONTHLY_SCHEDULE_MAX_DAYS: u32 = 15;

/// Degrees per compass-rose sector (360 / 16).
pub const COMPASS_SECTOR_DEGREES: f64 = 22.5;
