use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{
    FALLBACK_LATITUDE, FALLBACK_LONGITUDE, FALLBACK_NAME, KAABA_LATITUDE, KAABA_LONGITUDE,
};
use crate::error::MihrabError;

/// A geographic position in decimal degrees, optionally labelled.
///
/// Serialized with the field names used by the durable location slot:
/// `{"latitude": .., "longitude": .., "name": ..}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Coordinate {
    /// Creates a validated coordinate.
    ///
    /// # Errors
    /// Returns `InvalidCoordinate` if latitude is outside [-90, 90],
    /// longitude outside [-180, 180], or either is not finite.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, MihrabError> {
        let coord = Self::new_unchecked(latitude, longitude);
        if coord.is_valid() {
            Ok(coord)
        } else {
            Err(MihrabError::InvalidCoordinate { latitude, longitude })
        }
    }

    /// Creates a coordinate without range checks.
    pub const fn new_unchecked(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude, name: None }
    }

    /// Attaches a human-readable place name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The Kaaba, target of every Qibla calculation.
    pub const fn kaaba() -> Self {
        Self::new_unchecked(KAABA_LATITUDE, KAABA_LONGITUDE)
    }

    /// Mecca, used whenever no better location is available.
    pub fn fallback() -> Self {
        Self::new_unchecked(FALLBACK_LATITUDE, FALLBACK_LONGITUDE).with_name(FALLBACK_NAME)
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// `"lat, lon"` with four decimals, the label used when no place name is known.
    pub fn format_coords(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }

    /// The place name if known, otherwise the formatted coordinates.
    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.format_coords())
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_out_of_range() {
        assert!(Coordinate::new(91.0, 0.0).is_err());
        assert!(Coordinate::new(0.0, -180.5).is_err());
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
        assert!(Coordinate::new(-6.2088, 106.8456).is_ok());
    }

    #[test]
    fn test_display_name_prefers_name() {
        let c = Coordinate::new_unchecked(-6.2088, 106.8456);
        assert_eq!(c.display_name(), "-6.2088, 106.8456");
        let c = c.with_name("Jakarta");
        assert_eq!(c.display_name(), "Jakarta");
    }

    #[test]
    fn test_json_round_trip() {
        let c = Coordinate::new_unchecked(51.507_412_345_678, -0.127_812_345_678).with_name("London");
        let json = serde_json::to_string(&c).unwrap();
        assert!(json.contains("\"latitude\""));
        let back: Coordinate = serde_json::from_str(&json).unwrap();
        assert!((back.latitude - c.latitude).abs() < 1e-9);
        assert!((back.longitude - c.longitude).abs() < 1e-9);
        assert_eq!(back.name.as_deref(), Some("London"));
    }

    #[test]
    fn test_name_is_optional_in_json() {
        let back: Coordinate = serde_json::from_str(r#"{"latitude":1.5,"longitude":2.5}"#).unwrap();
        assert_eq!(back.name, None);
        assert!(!serde_json::to_string(&back).unwrap().contains("name"));
    }

    #[test]
    fn test_fallback_is_mecca() {
        let f = Coordinate::fallback();
        assert_eq!(f.latitude, 21.3891);
        assert_eq!(f.longitude, 39.8579);
        assert_eq!(f.name.as_deref(), Some("Mecca, Saudi Arabia"));
    }
}
