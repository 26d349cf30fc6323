//! File-backed TTL cache for rendered visibility reports.
//!
//! One file per `(profile, date)` key, named
//! `dso_report_<profile>_<date>.json`, holding a [`ReportEnvelope`].
//! Freshness is decided by the envelope's stored `created_at`, not file
//! mtime. A stale entry behaves exactly like an absent one for reads, but
//! its payload stays on disk until the next rebuild overwrites it.
//!
//! Writes go through a temp file plus rename so concurrent readers never
//! observe a torn payload. Two racing writers for the same key are
//! accepted (last writer wins): the engine is pure, so a double compute is
//! wasted work, not a correctness problem.

use chrono::{DateTime, NaiveDate, Utc};
use std::fs;
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::api::{CacheEntryInfo, ReportEnvelope};
use crate::error::{Error, Result};

const ENTRY_PREFIX: &str = "dso_report_";
const ENTRY_EXT: &str = "json";

/// Sequence number for temp-file names. Concurrent writers for the same
/// key run inside one process, so the pid alone does not keep their temp
/// files apart.
static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// A fresh cache read: the stored payload plus its age.
#[derive(Debug, Clone)]
pub struct CachedReport {
    /// The stored payload.
    pub envelope: ReportEnvelope,
    /// Seconds since the payload was computed.
    pub age_seconds: u64,
}

/// TTL-keyed report store in front of the visibility engine.
#[derive(Debug, Clone)]
pub struct ReportCache {
    dir: PathBuf,
    ttl_seconds: u64,
}

impl ReportCache {
    /// Create a cache over the given directory. The directory is created
    /// lazily on the first write, so an unwritable location degrades to
    /// always-miss instead of failing construction.
    pub fn new(dir: impl Into<PathBuf>, ttl_seconds: u64) -> Self {
        Self {
            dir: dir.into(),
            ttl_seconds,
        }
    }

    /// Configured time-to-live in seconds.
    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }

    fn entry_path(&self, profile: &str, date: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("{}{}_{}.{}", ENTRY_PREFIX, profile, date, ENTRY_EXT))
    }

    /// Look up a stored payload. Returns the payload iff it exists, its
    /// checksum verifies, and its age relative to `now` is strictly below
    /// the TTL. Unreadable or corrupted entries count as misses; they are
    /// logged and left for the next overwrite.
    pub fn get(&self, profile: &str, date: NaiveDate, now: DateTime<Utc>) -> Option<CachedReport> {
        let path = self.entry_path(profile, date);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                log::warn!("cache entry {} unreadable: {}", path.display(), e);
                return None;
            }
        };
        let envelope: ReportEnvelope = match serde_json::from_str(&content) {
            Ok(envelope) => envelope,
            Err(e) => {
                log::warn!("cache entry {} corrupted: {}", path.display(), e);
                return None;
            }
        };
        if !envelope.checksum_ok() {
            log::warn!("cache entry {} failed checksum, ignoring", path.display());
            return None;
        }

        let age_seconds = envelope.age_seconds(now);
        if age_seconds >= self.ttl_seconds {
            return None;
        }
        Some(CachedReport {
            envelope,
            age_seconds,
        })
    }

    /// Store a payload, overwriting whatever exists for its key. The write
    /// is atomic: serialize to a temp file in the same directory, then
    /// rename over the entry.
    ///
    /// # Errors
    /// [`Error::CacheUnwritable`] when the storage location rejects the
    /// write. Callers are expected to degrade (log and serve the payload
    /// uncached) rather than fail the request.
    pub fn put(&self, envelope: &ReportEnvelope) -> Result<()> {
        let profile = &envelope.report.profile_name;
        let date = envelope.report.date;
        let path = self.entry_path(profile, date);

        let unwritable = |e: std::io::Error| Error::CacheUnwritable(e.to_string());

        fs::create_dir_all(&self.dir).map_err(unwritable)?;
        let json = serde_json::to_string(envelope)?;
        // Pid plus in-process sequence number keeps racing writers off
        // each other's temp files.
        let tmp = self.dir.join(format!(
            ".{}{}_{}.{}.{}",
            ENTRY_PREFIX,
            profile,
            date,
            process::id(),
            TEMP_SEQ.fetch_add(1, Ordering::Relaxed)
        ));
        fs::write(&tmp, json.as_bytes()).map_err(unwritable)?;
        fs::rename(&tmp, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            unwritable(e)
        })?;
        Ok(())
    }

    /// Remove one entry. Returns `true` if something was deleted; a
    /// missing entry is a no-op, not an error.
    pub fn delete(&self, profile: &str, date: NaiveDate) -> Result<bool> {
        match fs::remove_file(self.entry_path(profile, date)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove all entries; returns the count removed.
    pub fn clear(&self) -> usize {
        let mut removed = 0;
        for (path, _, _) in self.scan_entries() {
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => log::warn!("could not delete cache entry {}: {}", path.display(), e),
            }
        }
        removed
    }

    /// Enumerate all entries for the operator management surface, ordered
    /// by date descending, ties by profile name ascending.
    pub fn list(&self) -> Vec<CacheEntryInfo> {
        let now = Utc::now();
        let mut entries: Vec<CacheEntryInfo> = self
            .scan_entries()
            .into_iter()
            .filter_map(|(path, profile, date)| {
                let meta = match fs::metadata(&path) {
                    Ok(meta) => meta,
                    Err(e) => {
                        log::warn!("cache entry {} unreadable: {}", path.display(), e);
                        return None;
                    }
                };
                let last_modified: DateTime<Utc> = meta
                    .modified()
                    .map(DateTime::<Utc>::from)
                    .unwrap_or(now);
                Some(CacheEntryInfo {
                    profile_name: profile,
                    date,
                    size_bytes: meta.len(),
                    age_seconds: (now - last_modified).num_seconds().max(0) as u64,
                    last_modified,
                })
            })
            .collect();

        entries.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| a.profile_name.cmp(&b.profile_name))
        });
        entries
    }

    /// All entry files currently in the cache directory, with their parsed
    /// keys. Files that do not match the naming scheme are ignored.
    fn scan_entries(&self) -> Vec<(PathBuf, String, NaiveDate)> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                log::warn!("cache directory {} unreadable: {}", self.dir.display(), e);
                return Vec::new();
            }
        };

        entries
            .filter_map(|entry| {
                let path = entry.ok()?.path();
                let name = path.file_name()?.to_str()?;
                let (profile, date) = parse_entry_name(name)?;
                Some((path.clone(), profile, date))
            })
            .collect()
    }
}

/// Parse `dso_report_<profile>_<date>.json` back into its key. Profile
/// names may themselves contain underscores, so the date is taken from the
/// last underscore-separated segment.
fn parse_entry_name(name: &str) -> Option<(String, NaiveDate)> {
    let stem = name
        .strip_prefix(ENTRY_PREFIX)?
        .strip_suffix(&format!(".{}", ENTRY_EXT))?;
    let (profile, date_str) = stem.rsplit_once('_')?;
    let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").ok()?;
    if profile.is_empty() {
        return None;
    }
    Some((profile.to_string(), date))
}
