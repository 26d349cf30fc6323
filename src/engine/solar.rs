//! Low-precision solar position, used for the twilight search.
//!
//! The formulas are the standard truncated series for the Sun's ecliptic
//! longitude (accurate to roughly 0.01 degrees over the current century),
//! more than enough to place astronomical twilight to within the engine's
//! one-minute scan step.

use chrono::{DateTime, Utc};

use super::ephemeris::{equatorial_to_horizontal, julian_day, normalize_degrees};

/// Apparent equatorial position of the Sun.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolarPosition {
    /// Right ascension, degrees.
    pub ra_deg: f64,
    /// Declination, degrees.
    pub dec_deg: f64,
}

/// Sun RA/Dec for a Julian day.
pub fn solar_position(jd: f64) -> SolarPosition {
    let n = jd - 2_451_545.0;

    let mean_longitude = normalize_degrees(280.460 + 0.985_647_4 * n);
    let mean_anomaly = normalize_degrees(357.528 + 0.985_600_3 * n).to_radians();
    let ecliptic_longitude = (mean_longitude
        + 1.915 * mean_anomaly.sin()
        + 0.020 * (2.0 * mean_anomaly).sin())
    .to_radians();
    let obliquity = (23.439 - 0.000_000_4 * n).to_radians();

    let ra = (obliquity.cos() * ecliptic_longitude.sin())
        .atan2(ecliptic_longitude.cos())
        .to_degrees();
    let dec = (obliquity.sin() * ecliptic_longitude.sin()).asin().to_degrees();

    SolarPosition {
        ra_deg: normalize_degrees(ra),
        dec_deg: dec,
    }
}

/// Sun altitude in degrees for an observer at (`lat_deg`, `lon_deg`) at
/// instant `t`.
pub fn solar_altitude_deg(lat_deg: f64, lon_deg: f64, t: DateTime<Utc>) -> f64 {
    let sun = solar_position(julian_day(t));
    equatorial_to_horizontal(sun.ra_deg, sun.dec_deg, lat_deg, lon_deg, t).altitude_deg
}
