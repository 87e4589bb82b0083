//! Network features for mihrab.
//!
//! Prayer-time fetching with relay fallback, reverse geocoding, device and
//! IP location sensors, and the durable location cache.

pub mod client;
pub mod geocoder;
pub mod locator;
pub mod sensor;
pub mod store;
pub mod transport;

pub use client::{
    ClientConfig, ClientConfigBuilder, DEFAULT_USER_AGENT, DaySchedule, PrayerTimeClient, encode_uri_component,
};
pub use geocoder::ReverseGeocoder;
pub use locator::{GeoLocator, LocationSource, LocatorConfig, Resolution};
pub use sensor::{FixedSensor, IpLocationSensor, LocationSensor, PositionOptions};
pub use store::{JsonFileStore, LocationStore, MemoryStore, default_store_path};
pub use transport::{BoxFuture, HttpResponse, HttpTransport, ReqwestTransport, TransportFailure};
