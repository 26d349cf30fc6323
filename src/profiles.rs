//! Observer profiles: named location + viewing-constraint configurations.
//!
//! Profiles are created by geocoding a human-entered place name; latitude,
//! longitude, and timezone are derived fields and never hand-edited. The
//! name is immutable after creation. A distinguished `default` profile is
//! bootstrapped on first use and cannot be deleted.
//!
//! Storage is one JSON file per profile (`<name>.json`) under a configured
//! directory, written atomically via temp-file-then-rename. The file keys
//! are compatible with the pre-existing profile directory layout.

use async_trait::async_trait;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;

use crate::error::{Error, Result};
use crate::geocode::ResolvedLocation;

/// Name of the protected built-in profile.
pub const DEFAULT_PROFILE_NAME: &str = "default";

/// Maximum profile name length.
pub const MAX_PROFILE_NAME_LEN: usize = 50;

/// Sequence number for temp-file names; keeps concurrent in-process
/// writers off each other's temp files.
static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// A named observer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObserverProfile {
    /// Unique identifier; lowercase letters, digits, underscores.
    pub name: String,
    /// Human-entered place name, as typed.
    pub location: String,
    /// Geocoded latitude, decimal degrees.
    pub latitude: f64,
    /// Geocoded longitude, decimal degrees (east positive).
    pub longitude: f64,
    /// Geocoded IANA timezone.
    pub timezone: Tz,
    /// Objects below this altitude are excluded, degrees in [0, 90].
    #[serde(rename = "min_altitude")]
    pub min_altitude_deg: f64,
    /// Azimuth window start, degrees in [0, 360).
    #[serde(rename = "az_min")]
    pub az_min_deg: f64,
    /// Azimuth window end, degrees in [0, 360). A window with
    /// `az_min > az_max` wraps through North.
    #[serde(rename = "az_max")]
    pub az_max_deg: f64,
    /// Full display name returned by the geocoding provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geocoded_name: Option<String>,
}

impl ObserverProfile {
    /// Built-in `default` profile (Star, Idaho).
    pub fn built_in_default() -> Self {
        Self {
            name: DEFAULT_PROFILE_NAME.to_string(),
            location: "Star, Idaho".to_string(),
            latitude: 43.69,
            longitude: -116.49,
            timezone: chrono_tz::America::Boise,
            min_altitude_deg: 18.0,
            az_min_deg: 10.0,
            az_max_deg: 165.0,
            geocoded_name: None,
        }
    }

    /// Validate name and viewing constraints.
    pub fn validate(&self) -> Result<()> {
        validate_profile_name(&self.name)?;
        validate_viewing_constraints(self.min_altitude_deg, self.az_min_deg, self.az_max_deg)
    }

    /// Replace the derived location fields from a fresh geocoding result.
    pub fn apply_geocode(&mut self, location_text: &str, resolved: &ResolvedLocation) {
        self.location = location_text.to_string();
        self.latitude = resolved.latitude;
        self.longitude = resolved.longitude;
        self.timezone = resolved.timezone;
        self.geocoded_name = Some(resolved.display_name.clone());
    }
}

/// Request to create a profile. Constraint fields default to the same
/// values the built-in profile uses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProfile {
    /// Name for the new profile.
    pub name: String,
    /// Place name to geocode.
    pub location: String,
    /// Minimum altitude, degrees.
    #[serde(default = "default_min_altitude")]
    pub min_altitude_deg: f64,
    /// Azimuth window start, degrees.
    #[serde(default = "default_az_min")]
    pub az_min_deg: f64,
    /// Azimuth window end, degrees.
    #[serde(default = "default_az_max")]
    pub az_max_deg: f64,
}

fn default_min_altitude() -> f64 {
    18.0
}

fn default_az_min() -> f64 {
    10.0
}

fn default_az_max() -> f64 {
    165.0
}

impl NewProfile {
    /// Create a request with default viewing constraints.
    pub fn new(name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
            min_altitude_deg: default_min_altitude(),
            az_min_deg: default_az_min(),
            az_max_deg: default_az_max(),
        }
    }
}

/// Partial update of a profile. The name is never updatable. A new
/// `location` triggers re-geocoding of the derived fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    /// New place name to geocode, if changing location.
    pub location: Option<String>,
    /// New minimum altitude, degrees.
    pub min_altitude_deg: Option<f64>,
    /// New azimuth window start, degrees.
    pub az_min_deg: Option<f64>,
    /// New azimuth window end, degrees.
    pub az_max_deg: Option<f64>,
}

/// Validate a profile name: `^[a-z0-9_]{1,50}$`.
pub fn validate_profile_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > MAX_PROFILE_NAME_LEN {
        return Err(Error::invalid_input(format!(
            "profile name must be 1-{} characters",
            MAX_PROFILE_NAME_LEN
        )));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    {
        return Err(Error::invalid_input(format!(
            "profile name '{}' may only contain lowercase letters, digits, and underscores",
            name
        )));
    }
    Ok(())
}

/// Validate altitude and azimuth constraints.
pub fn validate_viewing_constraints(min_altitude: f64, az_min: f64, az_max: f64) -> Result<()> {
    if !min_altitude.is_finite() || !(0.0..=90.0).contains(&min_altitude) {
        return Err(Error::invalid_input(
            "min_altitude must be between 0 and 90 degrees",
        ));
    }
    for (label, value) in [("az_min", az_min), ("az_max", az_max)] {
        if !value.is_finite() || !(0.0..360.0).contains(&value) {
            return Err(Error::invalid_input(format!(
                "{} must be in [0, 360) degrees",
                label
            )));
        }
    }
    Ok(())
}

/// Storage seam for observer profiles.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Fetch a profile by name.
    ///
    /// # Errors
    /// [`Error::ProfileNotFound`] if no profile is stored under `name`.
    async fn get(&self, name: &str) -> Result<ObserverProfile>;

    /// Store a new profile; fails if the name is already taken.
    async fn insert(&self, profile: &ObserverProfile) -> Result<()>;

    /// Overwrite an existing profile in place.
    async fn store(&self, profile: &ObserverProfile) -> Result<()>;

    /// Delete a profile. Returns `false` if nothing was stored under
    /// `name`; rejects the `default` profile.
    async fn delete(&self, name: &str) -> Result<bool>;

    /// All stored profile names, sorted. Ensures `default` exists.
    async fn list(&self) -> Result<Vec<String>>;
}

/// File-backed profile repository: one JSON document per profile.
#[derive(Debug, Clone)]
pub struct FileProfileRepository {
    dir: PathBuf,
}

impl FileProfileRepository {
    /// Open (and create if needed) a profile directory, bootstrapping the
    /// `default` profile when absent.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let repo = Self { dir: dir.into() };
        fs::create_dir_all(&repo.dir).await?;
        if !repo.profile_path(DEFAULT_PROFILE_NAME).exists() {
            repo.write_profile(&ObserverProfile::built_in_default())
                .await?;
        }
        Ok(repo)
    }

    fn profile_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", name))
    }

    /// Serialize and atomically replace the profile file.
    async fn write_profile(&self, profile: &ObserverProfile) -> Result<()> {
        let json = serde_json::to_string_pretty(profile)?;
        let tmp = self.dir.join(format!(
            ".{}.{}.{}.tmp",
            profile.name,
            std::process::id(),
            TEMP_SEQ.fetch_add(1, Ordering::Relaxed)
        ));
        fs::write(&tmp, json.as_bytes()).await?;
        fs::rename(&tmp, self.profile_path(&profile.name)).await?;
        Ok(())
    }
}

#[async_trait]
impl ProfileRepository for FileProfileRepository {
    async fn get(&self, name: &str) -> Result<ObserverProfile> {
        validate_profile_name(name)?;
        let path = self.profile_path(name);
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // The default profile always exists logically, even if the
                // directory was wiped underneath us.
                if name == DEFAULT_PROFILE_NAME {
                    let profile = ObserverProfile::built_in_default();
                    self.write_profile(&profile).await?;
                    return Ok(profile);
                }
                return Err(Error::ProfileNotFound(name.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        let profile: ObserverProfile = serde_json::from_str(&content)?;
        Ok(profile)
    }

    async fn insert(&self, profile: &ObserverProfile) -> Result<()> {
        profile.validate()?;
        if self.profile_path(&profile.name).exists() {
            return Err(Error::ProfileExists(profile.name.clone()));
        }
        self.write_profile(profile).await
    }

    async fn store(&self, profile: &ObserverProfile) -> Result<()> {
        profile.validate()?;
        if !self.profile_path(&profile.name).exists() {
            return Err(Error::ProfileNotFound(profile.name.clone()));
        }
        self.write_profile(profile).await
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        validate_profile_name(name)?;
        if name == DEFAULT_PROFILE_NAME {
            return Err(Error::DefaultProfileProtected);
        }
        match fs::remove_file(self.profile_path(name)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self) -> Result<Vec<String>> {
        // Bootstrap default if the directory was cleared.
        if !self.profile_path(DEFAULT_PROFILE_NAME).exists() {
            self.write_profile(&ObserverProfile::built_in_default())
                .await?;
        }

        let mut names = Vec::new();
        let mut entries = fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if validate_profile_name(stem).is_ok() {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

/// In-memory profile repository for unit testing and local development.
#[derive(Debug, Default)]
pub struct MemoryProfileRepository {
    profiles: parking_lot::RwLock<std::collections::HashMap<String, ObserverProfile>>,
}

impl MemoryProfileRepository {
    /// Empty store with the `default` profile pre-seeded.
    pub fn new() -> Self {
        let repo = Self::default();
        let default = ObserverProfile::built_in_default();
        repo.profiles
            .write()
            .insert(default.name.clone(), default);
        repo
    }
}

#[async_trait]
impl ProfileRepository for MemoryProfileRepository {
    async fn get(&self, name: &str) -> Result<ObserverProfile> {
        validate_profile_name(name)?;
        self.profiles
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| Error::ProfileNotFound(name.to_string()))
    }

    async fn insert(&self, profile: &ObserverProfile) -> Result<()> {
        profile.validate()?;
        let mut profiles = self.profiles.write();
        if profiles.contains_key(&profile.name) {
            return Err(Error::ProfileExists(profile.name.clone()));
        }
        profiles.insert(profile.name.clone(), profile.clone());
        Ok(())
    }

    async fn store(&self, profile: &ObserverProfile) -> Result<()> {
        profile.validate()?;
        let mut profiles = self.profiles.write();
        if !profiles.contains_key(&profile.name) {
            return Err(Error::ProfileNotFound(profile.name.clone()));
        }
        profiles.insert(profile.name.clone(), profile.clone());
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        validate_profile_name(name)?;
        if name == DEFAULT_PROFILE_NAME {
            return Err(Error::DefaultProfileProtected);
        }
        Ok(self.profiles.write().remove(name).is_some())
    }

    async fn list(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.profiles.read().keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}
