//! Report service: the single entry point combining cache and engine.
//!
//! Control flow for a report request: validate inputs, look the key up in
//! the cache (unless a rebuild is forced), and on a miss run the engine on
//! a blocking worker under a timeout, storing the result back best-effort.
//! Engine failures leave the cache untouched; cache-write failures degrade
//! to always-regenerate with an operator warning, never a caller-visible
//! error. A request abandoned at the timeout leaves the computation
//! running; if it completes it still warms the cache for the next caller.

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use std::time::Duration;

use crate::api::{CacheEntryInfo, CacheStatus, ReportEnvelope, ReportResponse};
use crate::cache::ReportCache;
use crate::catalog::{CatalogSource, JsonCatalog};
use crate::config::{Config, EngineSettings};
use crate::engine::{compute_visibility, ProfileSnapshot};
use crate::error::{Error, Result};
use crate::geocode::Geocoder;
use crate::profiles::{
    FileProfileRepository, NewProfile, ObserverProfile, ProfileRepository, ProfileUpdate,
};

/// Orchestrates the visibility engine, the report cache, and the profile
/// store behind the interface the UI layer consumes.
pub struct ReportService {
    cache: ReportCache,
    catalog: Arc<dyn CatalogSource>,
    profiles: Arc<dyn ProfileRepository>,
    geocoder: Arc<dyn Geocoder>,
    engine_settings: EngineSettings,
    engine_timeout: Duration,
}

impl ReportService {
    /// Assemble a service from explicit collaborators.
    pub fn new(
        config: &Config,
        catalog: Arc<dyn CatalogSource>,
        profiles: Arc<dyn ProfileRepository>,
        geocoder: Arc<dyn Geocoder>,
    ) -> Self {
        Self {
            cache: ReportCache::new(&config.cache_dir, config.ttl_seconds),
            catalog,
            profiles,
            geocoder,
            engine_settings: config.engine.clone(),
            engine_timeout: Duration::from_secs(config.engine_timeout_seconds),
        }
    }

    /// Bootstrap a service from configuration alone: JSON catalog from
    /// `catalog_path`, file-backed profiles under `profiles_dir`.
    pub async fn init(config: &Config, geocoder: Arc<dyn Geocoder>) -> anyhow::Result<Self> {
        let catalog = JsonCatalog::load(&config.catalog_path)
            .with_context(|| format!("loading catalog {}", config.catalog_path.display()))?;
        let profiles = FileProfileRepository::open(&config.profiles_dir)
            .await
            .with_context(|| format!("opening profile store {}", config.profiles_dir.display()))?;
        Ok(Self::new(
            config,
            Arc::new(catalog),
            Arc::new(profiles),
            geocoder,
        ))
    }

    /// Fetch (or compute) the visibility report for a profile and date.
    ///
    /// # Arguments
    /// * `profile_name` - Profile key; validated before any other work
    /// * `date` - `YYYY-MM-DD`
    /// * `force_rebuild` - Bypass the cache read and recompute regardless
    ///   of freshness; the result still overwrites the stored payload
    ///
    /// # Errors
    /// * [`Error::InvalidInput`] / [`Error::InvalidDate`] for malformed
    ///   requests, before any cache or engine work
    /// * [`Error::ProfileNotFound`] for an unknown profile
    /// * [`Error::ComputationTimeout`] / [`Error::ComputationFailure`]
    ///   when the engine fails; the cache is left untouched
    pub async fn get_report(
        &self,
        profile_name: &str,
        date: &str,
        force_rebuild: bool,
    ) -> Result<ReportResponse> {
        crate::profiles::validate_profile_name(profile_name)?;
        let date = parse_report_date(date)?;
        let profile = self.profiles.get(profile_name).await?;

        if !force_rebuild {
            if let Some(cached) = self.cache.get(profile_name, date, Utc::now()) {
                return Ok(ReportResponse {
                    payload: cached.envelope,
                    cache_status: CacheStatus::Hit,
                    age_seconds: cached.age_seconds,
                });
            }
        }

        let snapshot = ProfileSnapshot::from(&profile);
        let envelope = self.compute_and_store(snapshot, date).await?;
        Ok(ReportResponse {
            payload: envelope,
            cache_status: CacheStatus::Miss,
            age_seconds: 0,
        })
    }

    /// Run the engine on a blocking worker under the configured timeout
    /// and store the sealed result best-effort.
    async fn compute_and_store(
        &self,
        snapshot: ProfileSnapshot,
        date: NaiveDate,
    ) -> Result<ReportEnvelope> {
        let catalog = Arc::clone(&self.catalog);
        let settings = self.engine_settings.clone();
        let cache = self.cache.clone();

        let handle = tokio::task::spawn_blocking(move || -> Result<ReportEnvelope> {
            let report = compute_visibility(&snapshot, date, catalog.as_ref(), &settings)?;
            let envelope = ReportEnvelope::seal(report, Utc::now());
            // Best-effort write: an unwritable cache degrades the system
            // to always-regenerate, it never fails the request.
            if let Err(e) = cache.put(&envelope) {
                log::warn!("serving report uncached: {}", e);
            }
            Ok(envelope)
        });

        match tokio::time::timeout(self.engine_timeout, handle).await {
            // Dropping the join handle leaves the computation running; a
            // late completion still populates the cache.
            Err(_) => Err(Error::ComputationTimeout(self.engine_timeout.as_secs())),
            Ok(Err(join_err)) => Err(Error::ComputationFailure(join_err.to_string())),
            Ok(Ok(result)) => result,
        }
    }

    /// Enumerate cache entries for the management surface.
    pub fn list_cache_entries(&self) -> Vec<CacheEntryInfo> {
        self.cache.list()
    }

    /// Delete one cache entry; `true` if something was deleted.
    pub fn delete_cache_entry(&self, profile_name: &str, date: &str) -> Result<bool> {
        crate::profiles::validate_profile_name(profile_name)?;
        let date = parse_report_date(date)?;
        self.cache.delete(profile_name, date)
    }

    /// Delete all cache entries; returns the count removed.
    pub fn clear_cache(&self) -> usize {
        self.cache.clear()
    }

    /// Create a profile by geocoding its location. Nothing is persisted
    /// when geocoding fails.
    pub async fn create_profile(&self, request: NewProfile) -> Result<ObserverProfile> {
        crate::profiles::validate_profile_name(&request.name)?;
        crate::profiles::validate_viewing_constraints(
            request.min_altitude_deg,
            request.az_min_deg,
            request.az_max_deg,
        )?;
        match self.profiles.get(&request.name).await {
            Ok(_) => return Err(Error::ProfileExists(request.name)),
            Err(Error::ProfileNotFound(_)) => {}
            Err(e) => return Err(e),
        }

        let resolved = self.geocoder.resolve(&request.location).await?;
        let mut profile = ObserverProfile {
            name: request.name,
            location: String::new(),
            latitude: 0.0,
            longitude: 0.0,
            timezone: resolved.timezone,
            min_altitude_deg: request.min_altitude_deg,
            az_min_deg: request.az_min_deg,
            az_max_deg: request.az_max_deg,
            geocoded_name: None,
        };
        profile.apply_geocode(&request.location, &resolved);
        self.profiles.insert(&profile).await?;
        Ok(profile)
    }

    /// Update a profile's location and/or viewing constraints. The name is
    /// immutable; a new location re-runs geocoding. The update is atomic:
    /// a geocode failure persists nothing.
    pub async fn update_profile(
        &self,
        name: &str,
        update: ProfileUpdate,
    ) -> Result<ObserverProfile> {
        let mut profile = self.profiles.get(name).await?;

        if let Some(location) = update.location.as_deref() {
            let resolved = self.geocoder.resolve(location).await?;
            profile.apply_geocode(location, &resolved);
        }
        if let Some(min_altitude) = update.min_altitude_deg {
            profile.min_altitude_deg = min_altitude;
        }
        if let Some(az_min) = update.az_min_deg {
            profile.az_min_deg = az_min;
        }
        if let Some(az_max) = update.az_max_deg {
            profile.az_max_deg = az_max;
        }

        profile.validate()?;
        self.profiles.store(&profile).await?;
        Ok(profile)
    }

    /// Delete a profile; rejects `default` with a distinct error.
    pub async fn delete_profile(&self, name: &str) -> Result<bool> {
        self.profiles.delete(name).await
    }

    /// All profile names, sorted.
    pub async fn list_profiles(&self) -> Result<Vec<String>> {
        self.profiles.list().await
    }

    /// Fetch one profile.
    pub async fn get_profile(&self, name: &str) -> Result<ObserverProfile> {
        self.profiles.get(name).await
    }
}

/// Parse a `YYYY-MM-DD` report date.
pub fn parse_report_date(date: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| Error::InvalidDate(date.to_string()))
}
