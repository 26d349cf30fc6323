//! Public DTO surface for the report service.
//!
//! This file consolidates the data types exchanged with the UI layer:
//! visibility reports and their entries, the cache payload envelope, the
//! combined report response, and cache listing rows. All types derive
//! Serialize/Deserialize for JSON storage and transport.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Cache lookup outcome for a report request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CacheStatus {
    /// Served from a fresh cache entry; the engine was not invoked.
    Hit,
    /// The engine was invoked (absent entry, stale entry, or forced
    /// rebuild) and the result stored back.
    Miss,
}

/// One catalog object that met the profile's visibility criteria.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibleObject {
    /// Canonical catalog key, e.g. "M1" or "NGC7000".
    pub catalog_id: String,
    /// Watchlist name as entered, e.g. "M1".
    pub name: String,
    /// Friendly name, e.g. "Crab Nebula".
    pub aka: String,
    /// Priority marker (target wants a better capture).
    pub priority: bool,
    /// First sampled instant the object was visible, in the profile's
    /// local time.
    pub first_visible_local: NaiveDateTime,
    /// Last sampled instant the object was visible, local time.
    pub last_visible_local: NaiveDateTime,
    /// Length of the visible span in minutes.
    pub visible_minutes: i64,
    /// Altitude above horizon at the start of the span, degrees.
    pub start_alt_deg: f64,
    /// Azimuth (from North, clockwise) at the start of the span, degrees.
    pub start_az_deg: f64,
    /// Altitude at the end of the span, degrees.
    pub end_alt_deg: f64,
    /// Azimuth at the end of the span, degrees.
    pub end_az_deg: f64,
    /// Apparent size in square arcminutes.
    pub size_sq_arcmin: f64,
    /// Visual magnitude.
    pub magnitude: f64,
    /// Host constellation.
    pub constellation: String,
    /// Object type description, e.g. "Emission Nebula".
    pub type_desc: String,
}

/// A nightly visibility report: a deterministic function of the profile
/// snapshot, the date, and the catalog contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibilityReport {
    /// Name of the profile this report was computed for.
    pub profile_name: String,
    /// Calendar date the night is attributed to (evening of this date
    /// through the following dawn).
    pub date: NaiveDate,
    /// Human-readable observing location.
    pub location: String,
    /// IANA timezone all local times in this report are expressed in.
    pub timezone: Tz,
    /// Start of astronomical darkness, local time.
    pub window_start_local: NaiveDateTime,
    /// End of astronomical darkness, local time.
    pub window_end_local: NaiveDateTime,
    /// Minimum altitude criterion echoed from the profile, degrees.
    pub min_altitude_deg: f64,
    /// Azimuth window start echoed from the profile, degrees.
    pub az_min_deg: f64,
    /// Azimuth window end echoed from the profile, degrees.
    pub az_max_deg: f64,
    /// Objects meeting the criteria, ordered by visible span descending,
    /// ties broken by catalog id ascending.
    pub objects: Vec<VisibleObject>,
}

/// Stored cache payload: a report plus its creation timestamp and an
/// integrity checksum.
///
/// Freshness is decided by `created_at`, not file mtime, so file-copy or
/// backup operations that touch mtimes cannot resurrect stale entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEnvelope {
    /// Unix timestamp (seconds) at which the report was computed.
    pub created_at: i64,
    /// SHA-256 of the serialized report, hex encoded.
    pub checksum: String,
    /// The report itself.
    pub report: VisibilityReport,
}

impl ReportEnvelope {
    /// Wrap a freshly computed report, stamping `now` as the age-zero
    /// point and computing the integrity checksum.
    pub fn seal(report: VisibilityReport, now: DateTime<Utc>) -> Self {
        let checksum = report_checksum(&report);
        Self {
            created_at: now.timestamp(),
            checksum,
            report,
        }
    }

    /// Age of this payload relative to `now`, saturating at zero.
    pub fn age_seconds(&self, now: DateTime<Utc>) -> u64 {
        (now.timestamp() - self.created_at).max(0) as u64
    }

    /// Whether the stored checksum still matches the report content.
    pub fn checksum_ok(&self) -> bool {
        self.checksum == report_checksum(&self.report)
    }
}

/// SHA-256 over the canonical JSON serialization of a report.
pub fn report_checksum(report: &VisibilityReport) -> String {
    // serde_json emits struct fields in declaration order, so the
    // serialization is stable for identical reports.
    let json = serde_json::to_string(report).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    hex::encode(hasher.finalize())
}

/// Result of a report request: the payload plus cache metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportResponse {
    /// The report payload (cached or freshly computed).
    pub payload: ReportEnvelope,
    /// Whether the payload came from the cache.
    pub cache_status: CacheStatus,
    /// Payload age in seconds; zero for freshly computed reports.
    pub age_seconds: u64,
}

/// One row of the cache listing, for the operator management surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntryInfo {
    /// Profile component of the entry key.
    pub profile_name: String,
    /// Date component of the entry key.
    pub date: NaiveDate,
    /// Stored payload size in bytes.
    pub size_bytes: u64,
    /// Seconds since the entry file was last written.
    pub age_seconds: u64,
    /// Last modification time of the entry file.
    pub last_modified: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_report() -> VisibilityReport {
        VisibilityReport {
            profile_name: "default".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 1, 13).unwrap(),
            location: "Star, Idaho".to_string(),
            timezone: chrono_tz::America::Boise,
            window_start_local: NaiveDate::from_ymd_opt(2025, 1, 13)
                .unwrap()
                .and_hms_opt(18, 45, 0)
                .unwrap(),
            window_end_local: NaiveDate::from_ymd_opt(2025, 1, 14)
                .unwrap()
                .and_hms_opt(6, 30, 0)
                .unwrap(),
            min_altitude_deg: 18.0,
            az_min_deg: 10.0,
            az_max_deg: 165.0,
            objects: vec![],
        }
    }

    #[test]
    fn test_seal_stamps_age_zero() {
        let now = Utc.with_ymd_and_hms(2025, 1, 13, 20, 0, 0).unwrap();
        let envelope = ReportEnvelope::seal(sample_report(), now);
        assert_eq!(envelope.age_seconds(now), 0);
        assert!(envelope.checksum_ok());
    }

    #[test]
    fn test_age_advances_with_clock() {
        let now = Utc.with_ymd_and_hms(2025, 1, 13, 20, 0, 0).unwrap();
        let envelope = ReportEnvelope::seal(sample_report(), now);
        let later = now + chrono::Duration::seconds(3600);
        assert_eq!(envelope.age_seconds(later), 3600);
        // A clock that went backwards never yields a negative age.
        let earlier = now - chrono::Duration::seconds(10);
        assert_eq!(envelope.age_seconds(earlier), 0);
    }

    #[test]
    fn test_checksum_detects_tampering() {
        let now = Utc.with_ymd_and_hms(2025, 1, 13, 20, 0, 0).unwrap();
        let mut envelope = ReportEnvelope::seal(sample_report(), now);
        assert!(envelope.checksum_ok());
        envelope.report.min_altitude_deg = 25.0;
        assert!(!envelope.checksum_ok());
    }

    #[test]
    fn test_checksum_deterministic() {
        assert_eq!(
            report_checksum(&sample_report()),
            report_checksum(&sample_report())
        );
    }

    #[test]
    fn test_envelope_round_trip() {
        let now = Utc.with_ymd_and_hms(2025, 1, 13, 20, 0, 0).unwrap();
        let envelope = ReportEnvelope::seal(sample_report(), now);
        let json = serde_json::to_string(&envelope).unwrap();
        let back: ReportEnvelope = serde_json::from_str(&json).unwrap();
        assert_eq!(back, envelope);
        assert!(back.checksum_ok());
    }
}
