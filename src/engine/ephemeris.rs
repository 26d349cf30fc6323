//! Time and coordinate conversions for the visibility engine.
//!
//! Implements Julian day, Greenwich mean sidereal time, and the
//! equatorial-to-horizontal transform. Accuracy is a small fraction of a
//! degree, well inside the engine's one-minute sampling granularity, and
//! every step is pure f64 arithmetic so identical inputs always produce
//! identical outputs.

use chrono::{DateTime, Utc};

/// Horizontal coordinates of a target as seen by an observer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HorizontalCoord {
    /// Altitude above the horizon, degrees.
    pub altitude_deg: f64,
    /// Azimuth from North, clockwise through East, degrees in [0, 360).
    pub azimuth_deg: f64,
}

/// Julian day number for a UTC instant.
pub fn julian_day(t: DateTime<Utc>) -> f64 {
    t.timestamp_millis() as f64 / 86_400_000.0 + 2_440_587.5
}

/// Greenwich mean sidereal time in degrees for a Julian day.
pub fn gmst_degrees(jd: f64) -> f64 {
    normalize_degrees(280.460_618_37 + 360.985_647_366_29 * (jd - 2_451_545.0))
}

/// Normalize an angle to [0, 360).
pub fn normalize_degrees(deg: f64) -> f64 {
    let d = deg % 360.0;
    if d < 0.0 {
        d + 360.0
    } else {
        d
    }
}

/// Whether an azimuth lies inside a window, treating the window as a
/// circular arc: when `az_min > az_max` the window wraps through 360/0.
pub fn azimuth_in_window(az_deg: f64, az_min_deg: f64, az_max_deg: f64) -> bool {
    let az = normalize_degrees(az_deg);
    if az_min_deg <= az_max_deg {
        az >= az_min_deg && az <= az_max_deg
    } else {
        az >= az_min_deg || az <= az_max_deg
    }
}

/// Convert ICRS right ascension/declination to horizontal coordinates for
/// an observer at (`lat_deg`, `lon_deg`) at instant `t`.
///
/// Longitude is east-positive. Precession and refraction are neglected;
/// both are below the engine's inclusion-threshold granularity.
pub fn equatorial_to_horizontal(
    ra_deg: f64,
    dec_deg: f64,
    lat_deg: f64,
    lon_deg: f64,
    t: DateTime<Utc>,
) -> HorizontalCoord {
    let lst_deg = normalize_degrees(gmst_degrees(julian_day(t)) + lon_deg);
    let hour_angle = (lst_deg - ra_deg).to_radians();
    let dec = dec_deg.to_radians();
    let lat = lat_deg.to_radians();

    let sin_alt = lat.sin() * dec.sin() + lat.cos() * dec.cos() * hour_angle.cos();
    let altitude = sin_alt.clamp(-1.0, 1.0).asin();

    // Azimuth from North, clockwise through East.
    let az_y = -dec.cos() * hour_angle.sin();
    let az_x = dec.sin() * lat.cos() - dec.cos() * hour_angle.cos() * lat.sin();
    let azimuth = normalize_degrees(az_y.atan2(az_x).to_degrees());

    HorizontalCoord {
        altitude_deg: altitude.to_degrees(),
        azimuth_deg: azimuth,
    }
}
