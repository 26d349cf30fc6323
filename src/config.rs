//! Configuration for the report service.
//!
//! All paths and tuning knobs live in an explicit [`Config`] object passed
//! to the constructors of the cache, profile store, and service; there is
//! no ambient global state. Configuration can be loaded from a TOML file;
//! every field has a serde default so partial files are accepted.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding one report file per (profile, date) key.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    /// Directory holding one JSON file per observer profile.
    #[serde(default = "default_profiles_dir")]
    pub profiles_dir: PathBuf,
    /// Path to the catalog data file (watchlist targets + info entries).
    #[serde(default = "default_catalog_path")]
    pub catalog_path: PathBuf,
    /// Report time-to-live in seconds. Entries at or past this age are
    /// treated as absent for read purposes.
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,
    /// Upper bound on a single visibility computation, in seconds.
    #[serde(default = "default_engine_timeout_seconds")]
    pub engine_timeout_seconds: u64,
    /// Visibility engine tuning.
    #[serde(default)]
    pub engine: EngineSettings,
}

/// Tuning knobs for the visibility engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Scan resolution over the night window, in minutes.
    #[serde(default = "default_sample_step_minutes")]
    pub sample_step_minutes: u32,
    /// Minimum continuous visible span for an object to be reported,
    /// in minutes.
    #[serde(default = "default_min_visible_minutes")]
    pub min_visible_minutes: i64,
    /// Sun altitude (degrees) defining darkness. Astronomical twilight
    /// ends when the Sun sinks below this value.
    #[serde(default = "default_twilight_sun_altitude_deg")]
    pub twilight_sun_altitude_deg: f64,
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("cache")
}

fn default_profiles_dir() -> PathBuf {
    PathBuf::from("profiles")
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("dso_watchlist.json")
}

fn default_ttl_seconds() -> u64 {
    86_400
}

fn default_engine_timeout_seconds() -> u64 {
    120
}

fn default_sample_step_minutes() -> u32 {
    1
}

fn default_min_visible_minutes() -> i64 {
    60
}

fn default_twilight_sun_altitude_deg() -> f64 {
    -18.0
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            sample_step_minutes: default_sample_step_minutes(),
            min_visible_minutes: default_min_visible_minutes(),
            twilight_sun_altitude_deg: default_twilight_sun_altitude_deg(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            profiles_dir: default_profiles_dir(),
            catalog_path: default_catalog_path(),
            ttl_seconds: default_ttl_seconds(),
            engine_timeout_seconds: default_engine_timeout_seconds(),
            engine: EngineSettings::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or does not parse.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::invalid_input(format!("bad config file {}: {}", path.display(), e)))
    }
}
