//! # Mihrab
//!
//! Prayer times with a live countdown, and the Qibla direction, for any
//! location.
//!
//! This crate is a facade that re-exports functionality from the `mihrab` ecosystem.
//!
//! ## Modules
//!
//! - `types`: Core types (Coordinate, PrayerTimeRecord, CalculationMethod, etc.)
//! - `calendar`: Gregorian, Hijri and timezone labels
//! - `qibla`: Bearing, distance and compass state
//! - `schedule`: Current/next prayer, table states, countdown timer
//! - `network`: Prayer-time client, geocoder, locator (feature `async`)
//!
//! ## Usage
//!
//! ```rust
//! use mihrab::prelude::*;
//!
//! let jakarta = Coordinate::new(-6.2088, 106.8456).unwrap();
//! let q = qibla(&jakarta);
//! assert_eq!(q.direction, "WNW");
//! ```

pub use mihrab_core::*;
