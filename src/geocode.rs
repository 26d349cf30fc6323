//! Geocoding collaborator seam.
//!
//! Profile creation resolves a human-entered place name into coordinates
//! and an IANA timezone exactly once; the resulting fields are derived
//! data, refreshed only by re-running geocoding. A network-backed provider
//! (Nominatim or similar) lives outside this crate behind the [`Geocoder`]
//! trait. [`StaticGeocoder`] is a deterministic in-memory provider for
//! offline use and tests.

use async_trait::async_trait;
use chrono_tz::Tz;
use std::collections::HashMap;

use crate::error::{Error, Result};

/// Outcome of resolving a location query.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLocation {
    /// Latitude in decimal degrees (-90 to 90).
    pub latitude: f64,
    /// Longitude in decimal degrees (-180 to 180, east positive).
    pub longitude: f64,
    /// IANA timezone at the resolved coordinates.
    pub timezone: Tz,
    /// Full display name returned by the provider.
    pub display_name: String,
}

/// Location resolution provider.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolve a place-name query, e.g. "Star, Idaho" or "London, UK".
    ///
    /// # Errors
    /// Returns [`Error::Geocode`] when the query cannot be resolved.
    async fn resolve(&self, query: &str) -> Result<ResolvedLocation>;
}

/// Deterministic geocoder backed by a fixed lookup table.
///
/// Queries are matched case-insensitively on the trimmed input.
#[derive(Debug, Default)]
pub struct StaticGeocoder {
    entries: HashMap<String, ResolvedLocation>,
}

impl StaticGeocoder {
    /// Empty table; every query fails.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resolvable location.
    pub fn with_location(mut self, query: &str, location: ResolvedLocation) -> Self {
        self.entries.insert(Self::key(query), location);
        self
    }

    fn key(query: &str) -> String {
        query.trim().to_lowercase()
    }
}

#[async_trait]
impl Geocoder for StaticGeocoder {
    async fn resolve(&self, query: &str) -> Result<ResolvedLocation> {
        self.entries
            .get(&Self::key(query))
            .cloned()
            .ok_or_else(|| Error::geocode(query, "no match in location table"))
    }
}
