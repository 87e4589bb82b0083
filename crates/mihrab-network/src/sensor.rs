//! Device location capabilities.
//!
//! A sensor produces one position fix on request. The locator owns timing;
//! sensors may ignore `timeout` but should honour it where the backend can.

use std::sync::Arc;
use std::time::Duration;

use mihrab_types::constants::{IPAPI_URL, LOCATION_TIMEOUT};
use mihrab_types::{Coordinate, MihrabError};
use serde::{Deserialize, Serialize};

use crate::transport::{BoxFuture, HttpTransport, ReqwestTransport};

/// Request options for a position fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
    /// Oldest acceptable cached fix. Zero demands a fresh one.
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: LOCATION_TIMEOUT,
            maximum_age: Duration::ZERO,
        }
    }
}

/// Source of the device's current position.
pub trait LocationSensor: Send + Sync {
    /// Requests one fix.
    ///
    /// # Errors
    /// `LocationUnavailable` when permission is denied, the fix times out or
    /// the capability is missing.
    fn current_position(&self, options: PositionOptions) -> BoxFuture<'_, Result<Coordinate, MihrabError>>;
}

/// Sensor that always answers the same way.
#[derive(Debug, Clone)]
pub struct FixedSensor {
    outcome: Result<Coordinate, MihrabError>,
}

impl FixedSensor {
    pub fn at(coordinate: Coordinate) -> Self {
        Self { outcome: Ok(coordinate) }
    }

    /// A sensor whose permission was refused.
    pub fn denied(reason: impl Into<String>) -> Self {
        Self { outcome: Err(MihrabError::location_unavailable(reason)) }
    }
}

impl LocationSensor for FixedSensor {
    fn current_position(&self, _options: PositionOptions) -> BoxFuture<'_, Result<Coordinate, MihrabError>> {
        let outcome = self.outcome.clone();
        Box::pin(async move { outcome })
    }
}

#[derive(Debug, Deserialize)]
struct IpApiResult {
    latitude: Option<f64>,
    longitude: Option<f64>,
    #[serde(default)]
    error: bool,
    reason: Option<String>,
}

/// Approximate position from the public IP address (ipapi.co).
#[derive(Clone)]
pub struct IpLocationSensor {
    transport: Arc<dyn HttpTransport>,
    url: String,
}

impl std::fmt::Debug for IpLocationSensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IpLocationSensor").field("url", &self.url).finish_non_exhaustive()
    }
}

impl IpLocationSensor {
    pub fn new(user_agent: &str) -> Result<Self, MihrabError> {
        let transport = ReqwestTransport::new(user_agent)?;
        Ok(Self::with_transport(Arc::new(transport), IPAPI_URL))
    }

    pub fn with_transport(transport: Arc<dyn HttpTransport>, url: impl Into<String>) -> Self {
        Self { transport, url: url.into() }
    }

    async fn locate(&self) -> Result<Coordinate, MihrabError> {
        let response = self
            .transport
            .get(&self.url)
            .await
            .map_err(|e| MihrabError::location_unavailable(e.to_string()))?;
        if !response.is_success() {
            return Err(MihrabError::location_unavailable(format!(
                "IP geolocation failed with status {}",
                response.status
            )));
        }

        let r: IpApiResult = serde_json::from_str(&response.body)
            .map_err(|e| MihrabError::location_unavailable(format!("Invalid IP geolocation response: {}", e)))?;
        if r.error {
            return Err(MihrabError::location_unavailable(
                r.reason.unwrap_or_else(|| "IP geolocation refused".into()),
            ));
        }

        let lat = r.latitude.ok_or_else(|| MihrabError::location_unavailable("no latitude"))?;
        let lon = r.longitude.ok_or_else(|| MihrabError::location_unavailable("no longitude"))?;
        Coordinate::new(lat, lon)
    }
}

impl LocationSensor for IpLocationSensor {
    fn current_position(&self, options: PositionOptions) -> BoxFuture<'_, Result<Coordinate, MihrabError>> {
        Box::pin(async move {
            tokio::time::timeout(options.timeout, self.locate())
                .await
                .map_err(|_| MihrabError::location_unavailable("Timeout expired"))?
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::tests::ScriptedTransport;
    use crate::transport::HttpResponse;

    fn ip_sensor(body: &str) -> IpLocationSensor {
        let transport = ScriptedTransport::new(vec![Ok(HttpResponse::ok(body))]);
        IpLocationSensor::with_transport(Arc::new(transport), "http://ip.test/json/")
    }

    #[test]
    fn test_default_options() {
        let o = PositionOptions::default();
        assert!(o.high_accuracy);
        assert_eq!(o.timeout, Duration::from_secs(10));
        assert_eq!(o.maximum_age, Duration::ZERO);
    }

    #[tokio::test]
    async fn test_ip_sensor_parses_position() {
        let sensor = ip_sensor(r#"{"ip":"1.2.3.4","city":"Jakarta","latitude":-6.2088,"longitude":106.8456}"#);
        let c = sensor.current_position(PositionOptions::default()).await.unwrap();
        assert_eq!((c.latitude, c.longitude), (-6.2088, 106.8456));
        assert!(c.name.is_none());
    }

    #[tokio::test]
    async fn test_ip_sensor_rate_limited() {
        let sensor = ip_sensor(r#"{"error":true,"reason":"RateLimited"}"#);
        let err = sensor.current_position(PositionOptions::default()).await.unwrap_err();
        assert_eq!(err, MihrabError::location_unavailable("RateLimited"));
    }

    #[tokio::test]
    async fn test_fixed_sensor() {
        let ok = FixedSensor::at(Coordinate::new_unchecked(1.0, 2.0));
        assert!(ok.current_position(PositionOptions::default()).await.is_ok());
        let denied = FixedSensor::denied("User denied Geolocation");
        assert!(matches!(
            denied.current_position(PositionOptions::default()).await,
            Err(MihrabError::LocationUnavailable { .. })
        ));
    }
}
