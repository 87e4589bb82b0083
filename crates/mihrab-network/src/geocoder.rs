//! Reverse geocoding for the location label.
//!
//! Best effort: the label degrades to formatted coordinates on any failure.

use std::sync::Arc;

use mihrab_types::constants::BIGDATACLOUD_REVERSE_URL;
use mihrab_types::{Coordinate, MihrabError};
use serde::Deserialize;
use tracing::warn;

use crate::transport::{HttpTransport, ReqwestTransport};

/// Subset of the BigDataCloud reverse-geocode response.
#[derive(Debug, Default, Deserialize)]
struct ReverseGeocodeResponse {
    #[serde(default)]
    locality: Option<String>,
    #[serde(default)]
    city: Option<String>,
}

impl ReverseGeocodeResponse {
    fn label(&self) -> Option<String> {
        let present = |s: &Option<String>| s.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string);
        match (present(&self.locality), present(&self.city)) {
            (Some(locality), Some(city)) => Some(format!("{}, {}", locality, city)),
            (_, Some(city)) => Some(city),
            _ => None,
        }
    }
}

/// Turns a coordinate into a human-readable place name.
#[derive(Clone)]
pub struct ReverseGeocoder {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
}

impl std::fmt::Debug for ReverseGeocoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReverseGeocoder").field("base_url", &self.base_url).finish_non_exhaustive()
    }
}

impl ReverseGeocoder {
    /// Geocoder against BigDataCloud over `reqwest`.
    pub fn new(user_agent: &str) -> Result<Self, MihrabError> {
        let transport = ReqwestTransport::new(user_agent)?;
        Ok(Self::with_transport(Arc::new(transport), BIGDATACLOUD_REVERSE_URL))
    }

    pub fn with_transport(transport: Arc<dyn HttpTransport>, base_url: impl Into<String>) -> Self {
        Self { transport, base_url: base_url.into() }
    }

    /// Place name for `coordinate`, or `"{lat:.4}, {lon:.4}"` when the service
    /// fails or knows neither locality nor city.
    pub async fn lookup(&self, coordinate: &Coordinate) -> String {
        match self.try_lookup(coordinate).await {
            Ok(Some(name)) => name,
            Ok(None) => coordinate.format_coords(),
            Err(e) => {
                warn!(error = %e, "reverse geocoding failed, using coordinates");
                coordinate.format_coords()
            }
        }
    }

    /// Fallible form of [`lookup`](Self::lookup).
    ///
    /// `Ok(None)` means the service answered but had no usable name.
    ///
    /// # Errors
    /// `GeocodeFailed` on transport failure, a non-2xx status or an
    /// unparseable body.
    pub async fn try_lookup(&self, coordinate: &Coordinate) -> Result<Option<String>, MihrabError> {
        let url = format!(
            "{}?latitude={}&longitude={}&localityLanguage=en",
            self.base_url, coordinate.latitude, coordinate.longitude
        );
        let response = self
            .transport
            .get(&url)
            .await
            .map_err(|e| MihrabError::GeocodeFailed(e.to_string()))?;

        if !response.is_success() {
            return Err(MihrabError::GeocodeFailed(format!("status {}", response.status)));
        }

        let parsed: ReverseGeocodeResponse = serde_json::from_str(&response.body)
            .map_err(|e| MihrabError::GeocodeFailed(format!("Failed to parse response: {}", e)))?;
        Ok(parsed.label())
    }
}
