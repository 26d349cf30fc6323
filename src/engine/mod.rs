//! Visibility computation engine.
//!
//! Computes, for an observer profile snapshot and a calendar date, which
//! watchlist objects are observable that night. An object is included iff
//! at some sampled instant of the night window its altitude is at or above
//! the profile's minimum AND its azimuth falls inside the profile's window
//! (circular; a window with `az_min > az_max` wraps through North), and its
//! visible span is at least the configured minimum.
//!
//! The night window runs from the end of astronomical twilight on the
//! evening of the requested date to the following astronomical dawn, in the
//! profile's timezone. The computation is a pure function of the snapshot,
//! the date, and the catalog contents: no disk or network access, no clock
//! reads, so identical inputs always produce identical reports.

pub mod ephemeris;
pub mod solar;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

use crate::api::{VisibilityReport, VisibleObject};
use crate::catalog::{normalize_catalog_id, CatalogSource, WatchlistTarget};
use crate::config::EngineSettings;
use crate::error::{Error, Result};
use crate::profiles::ObserverProfile;
use ephemeris::{azimuth_in_window, equatorial_to_horizontal};
use solar::solar_altitude_deg;

/// Frozen copy of the profile fields the engine depends on.
///
/// Reports are computed against a snapshot, not a live profile reference:
/// editing a profile later must never retroactively change an already
/// computed (and cached) report.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileSnapshot {
    /// Profile name, used to key the resulting report.
    pub profile_name: String,
    /// Human-readable location for the report header.
    pub location: String,
    /// Observer latitude, degrees.
    pub latitude: f64,
    /// Observer longitude, degrees (east positive).
    pub longitude: f64,
    /// Timezone the night window is interpreted in.
    pub timezone: Tz,
    /// Minimum altitude criterion, degrees.
    pub min_altitude_deg: f64,
    /// Azimuth window start, degrees.
    pub az_min_deg: f64,
    /// Azimuth window end, degrees.
    pub az_max_deg: f64,
}

impl From<&ObserverProfile> for ProfileSnapshot {
    fn from(profile: &ObserverProfile) -> Self {
        Self {
            profile_name: profile.name.clone(),
            location: profile.location.clone(),
            latitude: profile.latitude,
            longitude: profile.longitude,
            timezone: profile.timezone,
            min_altitude_deg: profile.min_altitude_deg,
            az_min_deg: profile.az_min_deg,
            az_max_deg: profile.az_max_deg,
        }
    }
}

/// How far past local noon the twilight search extends. Two days covers
/// the latest dawn at any latitude that has one.
const TWILIGHT_SEARCH_MINUTES: i64 = 48 * 60;

/// Compute the visibility report for one profile snapshot and date.
///
/// # Arguments
/// * `snapshot` - Frozen observer profile fields
/// * `date` - Calendar date; the night is attributed to the evening of
///   this date through the following dawn
/// * `catalog` - Watchlist targets to check
/// * `settings` - Scan resolution and inclusion thresholds
///
/// # Errors
/// * [`Error::GeocodeUnresolved`] when the snapshot's coordinates are
///   absent or out of range
/// * [`Error::ComputationFailure`] when no astronomical darkness occurs
///   (polar summer)
pub fn compute_visibility(
    snapshot: &ProfileSnapshot,
    date: NaiveDate,
    catalog: &dyn CatalogSource,
    settings: &EngineSettings,
) -> Result<VisibilityReport> {
    validate_coordinates(snapshot)?;

    let (dusk, dawn) = night_window(snapshot, date, settings)?;
    let step = Duration::minutes(settings.sample_step_minutes.max(1) as i64);

    // Sample instants across the night window.
    let mut samples = Vec::new();
    let mut t = dusk;
    while t < dawn {
        samples.push(t);
        t += step;
    }

    let mut objects: Vec<VisibleObject> = catalog
        .targets()
        .iter()
        .filter_map(|target| scan_target(target, snapshot, &samples, settings))
        .collect();

    // Longest visible span first, ties by catalog id for a stable order.
    objects.sort_by(|a, b| {
        b.visible_minutes
            .cmp(&a.visible_minutes)
            .then_with(|| a.catalog_id.cmp(&b.catalog_id))
    });

    Ok(VisibilityReport {
        profile_name: snapshot.profile_name.clone(),
        date,
        location: snapshot.location.clone(),
        timezone: snapshot.timezone,
        window_start_local: dusk.with_timezone(&snapshot.timezone).naive_local(),
        window_end_local: dawn.with_timezone(&snapshot.timezone).naive_local(),
        min_altitude_deg: snapshot.min_altitude_deg,
        az_min_deg: snapshot.az_min_deg,
        az_max_deg: snapshot.az_max_deg,
        objects,
    })
}

fn validate_coordinates(snapshot: &ProfileSnapshot) -> Result<()> {
    let lat_ok = snapshot.latitude.is_finite() && (-90.0..=90.0).contains(&snapshot.latitude);
    let lon_ok = snapshot.longitude.is_finite() && (-180.0..=180.0).contains(&snapshot.longitude);
    if lat_ok && lon_ok {
        Ok(())
    } else {
        Err(Error::GeocodeUnresolved(snapshot.profile_name.clone()))
    }
}

/// Find the astronomical night window for the given evening: the first
/// instant after local noon where the Sun sinks below the twilight
/// altitude, and the following instant where it climbs back above it.
///
/// The search runs at one-minute resolution regardless of the sampling
/// step, so the window boundaries do not move when the step changes.
fn night_window(
    snapshot: &ProfileSnapshot,
    date: NaiveDate,
    settings: &EngineSettings,
) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let noon_naive = date
        .and_hms_opt(12, 0, 0)
        .ok_or_else(|| Error::ComputationFailure(format!("unrepresentable date {}", date)))?;
    let noon = snapshot
        .timezone
        .from_local_datetime(&noon_naive)
        .earliest()
        .ok_or_else(|| {
            Error::ComputationFailure(format!(
                "local noon on {} does not exist in {}",
                date, snapshot.timezone
            ))
        })?
        .with_timezone(&Utc);

    let threshold = settings.twilight_sun_altitude_deg;
    let mut dusk = None;

    for minute in 0..TWILIGHT_SEARCH_MINUTES {
        let t = noon + Duration::minutes(minute);
        let alt = solar_altitude_deg(snapshot.latitude, snapshot.longitude, t);
        match dusk {
            None => {
                if alt < threshold {
                    dusk = Some(t);
                }
            }
            Some(start) => {
                if alt >= threshold {
                    return Ok((start, t));
                }
            }
        }
    }

    match dusk {
        // Dark at the end of the search horizon: polar winter. Close the
        // window at the horizon so the scan stays bounded.
        Some(start) => Ok((start, noon + Duration::minutes(TWILIGHT_SEARCH_MINUTES))),
        None => Err(Error::ComputationFailure(format!(
            "no astronomical darkness at ({:.2}, {:.2}) on {}",
            snapshot.latitude, snapshot.longitude, date
        ))),
    }
}

/// Scan one target over the night's sample instants; returns its report
/// entry when it meets the inclusion criteria.
fn scan_target(
    target: &WatchlistTarget,
    snapshot: &ProfileSnapshot,
    samples: &[DateTime<Utc>],
    settings: &EngineSettings,
) -> Option<VisibleObject> {
    let mut first: Option<(DateTime<Utc>, f64, f64)> = None;
    let mut last: Option<(DateTime<Utc>, f64, f64)> = None;

    for &t in samples {
        let coord = equatorial_to_horizontal(
            target.ra_deg,
            target.dec_deg,
            snapshot.latitude,
            snapshot.longitude,
            t,
        );
        let visible = coord.altitude_deg >= snapshot.min_altitude_deg
            && azimuth_in_window(coord.azimuth_deg, snapshot.az_min_deg, snapshot.az_max_deg);
        if visible {
            let sample = (t, coord.altitude_deg, coord.azimuth_deg);
            if first.is_none() {
                first = Some(sample);
            }
            last = Some(sample);
        }
    }

    let (start_t, start_alt, start_az) = first?;
    let (end_t, end_alt, end_az) = last?;
    let visible_minutes = (end_t - start_t).num_minutes();
    if visible_minutes < settings.min_visible_minutes {
        return None;
    }

    Some(VisibleObject {
        catalog_id: normalize_catalog_id(&target.name),
        name: target.name.clone(),
        aka: target.aka.clone(),
        priority: target.want_better,
        first_visible_local: start_t.with_timezone(&snapshot.timezone).naive_local(),
        last_visible_local: end_t.with_timezone(&snapshot.timezone).naive_local(),
        visible_minutes,
        start_alt_deg: start_alt,
        start_az_deg: start_az,
        end_alt_deg: end_alt,
        end_az_deg: end_az,
        size_sq_arcmin: target.size_sq_arcmin,
        magnitude: target.magnitude,
        constellation: target.constellation.clone(),
        type_desc: target.type_desc.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::JsonCatalog;
    use chrono::Timelike;
    use std::collections::HashMap;

    fn boise_snapshot() -> ProfileSnapshot {
        ProfileSnapshot {
            profile_name: "default".to_string(),
            location: "Star, Idaho".to_string(),
            latitude: 43.69,
            longitude: -116.49,
            timezone: chrono_tz::America::Boise,
            min_altitude_deg: 18.0,
            az_min_deg: 10.0,
            az_max_deg: 165.0,
        }
    }

    fn target(name: &str, ra: f64, dec: f64) -> WatchlistTarget {
        WatchlistTarget {
            name: name.to_string(),
            aka: format!("{} aka", name),
            type_desc: "Test".to_string(),
            constellation: "Test".to_string(),
            ra_deg: ra,
            dec_deg: dec,
            size_sq_arcmin: 10.0,
            magnitude: 8.0,
            want_better: false,
        }
    }

    fn catalog(targets: Vec<WatchlistTarget>) -> JsonCatalog {
        JsonCatalog::new(targets, HashMap::new()).unwrap()
    }

    fn jan_13() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 13).unwrap()
    }

    #[test]
    fn test_snapshot_from_profile() {
        let profile = ObserverProfile::built_in_default();
        let snapshot = ProfileSnapshot::from(&profile);
        assert_eq!(snapshot.profile_name, "default");
        assert_eq!(snapshot.latitude, 43.69);
        assert_eq!(snapshot.timezone, chrono_tz::America::Boise);
    }

    #[test]
    fn test_winter_night_window_boise() {
        let snapshot = boise_snapshot();
        let report =
            compute_visibility(&snapshot, jan_13(), &catalog(vec![]), &EngineSettings::default())
                .unwrap();

        // Astronomical dusk falls in the evening of the 13th...
        assert_eq!(report.window_start_local.date(), jan_13());
        let dusk_hour = report.window_start_local.time().hour();
        assert!((17..=20).contains(&dusk_hour), "dusk at {}", dusk_hour);

        // ...and dawn in the early morning of the 14th.
        assert_eq!(
            report.window_end_local.date(),
            NaiveDate::from_ymd_opt(2025, 1, 14).unwrap()
        );
        let dawn_hour = report.window_end_local.time().hour();
        assert!((4..=8).contains(&dawn_hour), "dawn at {}", dawn_hour);

        let night_hours =
            (report.window_end_local - report.window_start_local).num_minutes() as f64 / 60.0;
        assert!(
            (8.0..=14.0).contains(&night_hours),
            "night length {} h",
            night_hours
        );
    }

    #[test]
    fn test_polaris_included_with_wrapping_window() {
        // Polaris hangs near the pole: altitude tracks latitude, azimuth
        // stays within a degree of North. A window wrapping 350..10
        // contains it all night.
        let mut snapshot = boise_snapshot();
        snapshot.min_altitude_deg = 40.0;
        snapshot.az_min_deg = 350.0;
        snapshot.az_max_deg = 10.0;

        let cat = catalog(vec![target("Polaris", 37.95, 89.264)]);
        let report =
            compute_visibility(&snapshot, jan_13(), &cat, &EngineSettings::default()).unwrap();
        assert_eq!(report.objects.len(), 1);
        let obj = &report.objects[0];
        assert_eq!(obj.catalog_id, "POLARIS");
        // Visible effectively the whole window.
        let window_minutes =
            (report.window_end_local - report.window_start_local).num_minutes();
        assert!(obj.visible_minutes >= window_minutes - 5);
    }

    #[test]
    fn test_polaris_excluded_by_southern_window() {
        let mut snapshot = boise_snapshot();
        snapshot.min_altitude_deg = 40.0;
        snapshot.az_min_deg = 90.0;
        snapshot.az_max_deg = 270.0;

        let cat = catalog(vec![target("Polaris", 37.95, 89.264)]);
        let report =
            compute_visibility(&snapshot, jan_13(), &cat, &EngineSettings::default()).unwrap();
        assert!(report.objects.is_empty());
    }

    #[test]
    fn test_never_risen_target_excluded() {
        let snapshot = boise_snapshot();
        let cat = catalog(vec![target("FARSOUTH", 100.0, -89.0)]);
        let report =
            compute_visibility(&snapshot, jan_13(), &cat, &EngineSettings::default()).unwrap();
        assert!(report.objects.is_empty());
    }

    #[test]
    fn test_minimum_span_filter() {
        let mut snapshot = boise_snapshot();
        snapshot.min_altitude_deg = 40.0;
        snapshot.az_min_deg = 350.0;
        snapshot.az_max_deg = 10.0;
        let cat = catalog(vec![target("Polaris", 37.95, 89.264)]);

        let mut settings = EngineSettings::default();
        settings.min_visible_minutes = 10_000;
        let report = compute_visibility(&snapshot, jan_13(), &cat, &settings).unwrap();
        assert!(report.objects.is_empty());
    }

    #[test]
    fn test_deterministic_output() {
        let snapshot = boise_snapshot();
        let cat = catalog(vec![
            target("Polaris", 37.95, 89.264),
            target("M1", 83.633, 22.0145),
            target("NGC7000", 312.75, 44.37),
        ]);
        let a = compute_visibility(&snapshot, jan_13(), &cat, &EngineSettings::default()).unwrap();
        let b = compute_visibility(&snapshot, jan_13(), &cat, &EngineSettings::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_tie_break_by_catalog_id() {
        // Two near-pole targets share the full-window span; ordering must
        // fall back to catalog id.
        let mut snapshot = boise_snapshot();
        snapshot.min_altitude_deg = 30.0;
        snapshot.az_min_deg = 300.0;
        snapshot.az_max_deg = 60.0;
        let cat = catalog(vec![
            target("ZPOLE", 10.0, 89.5),
            target("APOLE", 200.0, 89.5),
        ]);
        let report =
            compute_visibility(&snapshot, jan_13(), &cat, &EngineSettings::default()).unwrap();
        assert_eq!(report.objects.len(), 2);
        assert_eq!(report.objects[0].catalog_id, "APOLE");
        assert_eq!(report.objects[1].catalog_id, "ZPOLE");
    }

    #[test]
    fn test_polar_summer_fails() {
        let snapshot = ProfileSnapshot {
            profile_name: "svalbard".to_string(),
            location: "Longyearbyen".to_string(),
            latitude: 78.22,
            longitude: 15.64,
            timezone: chrono_tz::Arctic::Longyearbyen,
            min_altitude_deg: 18.0,
            az_min_deg: 0.0,
            az_max_deg: 359.0,
        };
        let date = NaiveDate::from_ymd_opt(2025, 6, 21).unwrap();
        let err = compute_visibility(&snapshot, date, &catalog(vec![]), &EngineSettings::default())
            .unwrap_err();
        assert!(matches!(err, Error::ComputationFailure(_)));
    }

    #[test]
    fn test_bad_coordinates_rejected() {
        let mut snapshot = boise_snapshot();
        snapshot.latitude = f64::NAN;
        let err = compute_visibility(
            &snapshot,
            jan_13(),
            &catalog(vec![]),
            &EngineSettings::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::GeocodeUnresolved(_)));
    }
}
