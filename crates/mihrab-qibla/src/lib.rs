//! Qibla direction and distance to the Kaaba.
//!
//! Great-circle formulas on a spherical Earth. All functions are pure; NaN
//! inputs propagate to NaN outputs and nothing panics.

#[cfg(feature = "compass")]
pub mod compass;

use mihrab_types::constants::{COMPASS_SECTOR_DEGREES, EARTH_RADIUS_KM};
use mihrab_types::{Coordinate, QiblaResult};

/// Sixteen-point compass rose, starting at North and turning clockwise.
pub const COMPASS_POINTS: [&str; 16] = [
    "North", "NNE", "NE", "ENE", "East", "ESE", "SE", "SSE", "South", "SSW", "SW", "WSW", "West",
    "WNW", "NW", "NNW",
];

/// Initial great-circle bearing from `origin` to `target`, in degrees [0, 360).
///
/// When `origin == target` the bearing is undefined; `atan2(0, 0)` yields 0
/// and that is what is returned.
///
/// # Example
/// ```rust
/// use mihrab_qibla::bearing_to;
/// use mihrab_types::Coordinate;
///
/// let new_york = Coordinate::new_unchecked(40.7128, -74.0060);
/// let bearing = bearing_to(&new_york, &Coordinate::kaaba());
/// assert!((bearing - 58.48).abs() < 0.01);
/// ```
pub fn bearing_to(origin: &Coordinate, target: &Coordinate) -> f64 {
    let phi1 = origin.latitude.to_radians();
    let phi2 = target.latitude.to_radians();
    let delta_lambda = (target.longitude - origin.longitude).to_radians();

    let y = delta_lambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * delta_lambda.cos();

    let bearing = (y.atan2(x).to_degrees() + 360.0) % 360.0;
    // -1e-15 + 360 rounds to exactly 360
    if bearing >= 360.0 { 0.0 } else { bearing }
}

/// Bearing from `origin` to the Kaaba.
pub fn qibla_bearing(origin: &Coordinate) -> f64 {
    bearing_to(origin, &Coordinate::kaaba())
}

/// Haversine distance in kilometres (Earth radius 6371 km).
pub fn distance_to(origin: &Coordinate, target: &Coordinate) -> f64 {
    let phi1 = origin.latitude.to_radians();
    let phi2 = target.latitude.to_radians();
    let delta_phi = phi2 - phi1;
    let delta_lambda = (target.longitude - origin.longitude).to_radians();

    let a = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    // rounding can push near-antipodal points just past 1
    let a = if a > 1.0 { 1.0 } else { a };
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Compass-rose label: sector `round(degrees / 22.5) mod 16`.
///
/// ```rust
/// use mihrab_qibla::direction_name;
///
/// assert_eq!(direction_name(0.0), "North");
/// assert_eq!(direction_name(359.0), "North");
/// assert_eq!(direction_name(180.0), "South");
/// ```
pub fn direction_name(degrees: f64) -> &'static str {
    let normalized = degrees.rem_euclid(360.0);
    // NaN casts to 0
    let index = (normalized / COMPASS_SECTOR_DEGREES).round() as usize % COMPASS_POINTS.len();
    COMPASS_POINTS[index]
}

/// Bearing, distance and label from `origin` to the Kaaba.
pub fn qibla(origin: &Coordinate) -> QiblaResult {
    let bearing_degrees = qibla_bearing(origin);
    QiblaResult {
        bearing_degrees,
        distance_km: distance_to(origin, &Coordinate::kaaba()),
        direction: direction_name(bearing_degrees),
    }
}
