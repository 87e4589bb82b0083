//! Location resolution: cache, then device, then Mecca.
//!
//! Never fails. Whatever goes wrong, the caller gets a usable coordinate and
//! at most a warning to show.

use std::sync::Arc;
use std::time::Duration;

use mihrab_types::constants::{BIGDATACLOUD_REVERSE_URL, GEOCODE_TIMEOUT, LOCATION_STORAGE_KEY};
use mihrab_types::{Coordinate, MihrabError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::geocoder::ReverseGeocoder;
use crate::sensor::{LocationSensor, PositionOptions};
use crate::store::LocationStore;

/// Locator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocatorConfig {
    /// Options passed to the sensor. `position.timeout` is enforced here.
    pub position: PositionOptions,
    /// Bound on naming a fresh fix.
    pub geocode_timeout: Duration,
    /// Used when no location can be obtained.
    pub fallback: Coordinate,
    pub geocoder_url: String,
    pub storage_key: String,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            position: PositionOptions::default(),
            geocode_timeout: GEOCODE_TIMEOUT,
            fallback: Coordinate::fallback(),
            geocoder_url: BIGDATACLOUD_REVERSE_URL.to_string(),
            storage_key: LOCATION_STORAGE_KEY.to_string(),
        }
    }
}

/// Where a resolved coordinate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocationSource {
    Cache,
    Device,
    Fallback,
}

/// Outcome of [`GeoLocator::resolve`].
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub coordinate: Coordinate,
    pub source: LocationSource,
    /// Set when the device was asked and failed.
    pub warning: Option<MihrabError>,
}

impl Resolution {
    pub fn is_fallback(&self) -> bool {
        self.source == LocationSource::Fallback
    }
}

/// Resolves the user's coordinate.
#[derive(Clone)]
pub struct GeoLocator {
    store: Arc<dyn LocationStore>,
    sensor: Option<Arc<dyn LocationSensor>>,
    geocoder: ReverseGeocoder,
    config: LocatorConfig,
}

impl std::fmt::Debug for GeoLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeoLocator")
            .field("has_sensor", &self.sensor.is_some())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl GeoLocator {
    /// Locator without a device sensor. Resolves to the cache or the fallback.
    pub fn new(store: Arc<dyn LocationStore>, geocoder: ReverseGeocoder, config: LocatorConfig) -> Self {
        Self { store, sensor: None, geocoder, config }
    }

    pub fn with_sensor(mut self, sensor: Arc<dyn LocationSensor>) -> Self {
        self.sensor = Some(sensor);
        self
    }

    pub fn config(&self) -> &LocatorConfig {
        &self.config
    }

    /// Cached coordinate if the stored entry parses and is in range.
    pub fn cached(&self) -> Option<Coordinate> {
        let raw = match self.store.get(&self.config.storage_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "location store unreadable");
                return None;
            }
        };

        match serde_json::from_str::<Coordinate>(&raw) {
            Ok(c) if c.is_valid() => Some(c),
            Ok(c) => {
                warn!(latitude = c.latitude, longitude = c.longitude, "ignoring out-of-range cached location");
                None
            }
            Err(e) => {
                warn!(error = %e, "ignoring unparseable cached location");
                None
            }
        }
    }

    /// Cache, else one bounded device request, else the fallback.
    ///
    /// A fresh device fix is named by the reverse geocoder and persisted.
    pub async fn resolve(&self) -> Resolution {
        if let Some(coordinate) = self.cached() {
            info!(name = %coordinate.display_name(), "using cached location");
            return Resolution { coordinate, source: LocationSource::Cache, warning: None };
        }

        let Some(sensor) = &self.sensor else {
            debug!("no location sensor, using fallback");
            return self.fallback(None);
        };

        let options = self.config.position;
        let fix = tokio::time::timeout(options.timeout, sensor.current_position(options))
            .await
            .unwrap_or_else(|_| Err(MihrabError::location_unavailable("Timeout expired")));

        match fix {
            Ok(position) => {
                let name = tokio::time::timeout(self.config.geocode_timeout, self.geocoder.lookup(&position))
                    .await
                    .unwrap_or_else(|_| {
                        warn!("reverse geocoding timed out, using coordinates");
                        position.format_coords()
                    });
                let coordinate = position.with_name(name);
                self.persist(&coordinate);
                info!(name = %coordinate.display_name(), "resolved device location");
                Resolution { coordinate, source: LocationSource::Device, warning: None }
            }
            Err(e) => {
                warn!(error = %e, "device location unavailable, using fallback");
                self.fallback(Some(e))
            }
        }
    }

    /// Drops the cached location so the next `resolve` asks the device again.
    pub fn forget(&self) -> Result<(), MihrabError> {
        self.store.remove(&self.config.storage_key)
    }

    fn fallback(&self, warning: Option<MihrabError>) -> Resolution {
        Resolution {
            coordinate: self.config.fallback.clone(),
            source: LocationSource::Fallback,
            warning,
        }
    }

    fn persist(&self, coordinate: &Coordinate) {
        let saved = serde_json::to_string(coordinate)
            .map_err(|e| MihrabError::StorageError(e.to_string()))
            .and_then(|json| self.store.set(&self.config.storage_key, &json));
        if let Err(e) = saved {
            warn!(error = %e, "failed to cache location");
        }
    }
}
