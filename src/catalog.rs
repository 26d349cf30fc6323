//! Catalog data source: watchlist targets and descriptive info entries.
//!
//! The catalog is an external, periodically-updated data set. This module
//! defines the [`CatalogSource`] seam the engine reads through, a JSON-file
//! implementation, and the lookup rules for descriptive entries:
//!
//! - Keys are canonical catalog ids (uppercase, no internal spaces).
//! - An entry may redirect to another via its `See` field; consumers follow
//!   exactly one level of redirection, never chains.
//! - A pure redirect stub (a name and a `See` field, nothing else) is never
//!   returned as content; if its target is missing the lookup yields
//!   "no info".

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// Descriptive information for one catalog object.
///
/// Field names match the watchlist info JSON produced by the catalog
/// maintenance tooling (PascalCase keys).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct DsoInfo {
    /// Common name, e.g. "Crab Nebula".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub common_name: Option<String>,
    /// Alternate designations.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub other_names: Vec<String>,
    /// Host constellation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constellation: Option<String>,
    /// Object type, e.g. "Supernova Remnant".
    #[serde(rename = "Type", skip_serializing_if = "Option::is_none")]
    pub type_desc: Option<String>,
    /// Distance description, e.g. "6,500 light-years".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<String>,
    /// Angular size description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    /// Physical composition description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub composition: Option<String>,
    /// Trivia shown alongside the object.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fun_facts: Vec<String>,
    /// Redirect to another catalog id carrying the actual content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub see: Option<String>,
}

impl DsoInfo {
    /// True when this entry carries no descriptive content of its own and
    /// only points at another entry.
    pub fn is_pure_redirect(&self) -> bool {
        self.see.is_some()
            && self.other_names.is_empty()
            && self.fun_facts.is_empty()
            && self.constellation.is_none()
            && self.type_desc.is_none()
            && self.distance.is_none()
            && self.size.is_none()
            && self.composition.is_none()
    }
}

/// One row of the observing watchlist: a target the engine checks for
/// visibility each night.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistTarget {
    /// Catalog designation, e.g. "M1".
    #[serde(rename = "Name")]
    pub name: String,
    /// Friendly name, e.g. "Crab Nebula".
    #[serde(rename = "Aka", default)]
    pub aka: String,
    /// Object type description.
    #[serde(rename = "TypeDesc", default)]
    pub type_desc: String,
    /// Host constellation.
    #[serde(rename = "Constellation", default)]
    pub constellation: String,
    /// ICRS right ascension, degrees.
    #[serde(rename = "RaDeg")]
    pub ra_deg: f64,
    /// ICRS declination, degrees.
    #[serde(rename = "DecDeg")]
    pub dec_deg: f64,
    /// Apparent size in square arcminutes.
    #[serde(rename = "SqArcMins", default)]
    pub size_sq_arcmin: f64,
    /// Visual magnitude.
    #[serde(rename = "Mag", default)]
    pub magnitude: f64,
    /// Priority flag: the operator wants a better capture of this target.
    #[serde(rename = "WantBetter", default)]
    pub want_better: bool,
}

/// Read-only catalog seam consumed by the visibility engine and the
/// gallery/UI layer.
pub trait CatalogSource: Send + Sync {
    /// Watchlist targets, in catalog file order.
    fn targets(&self) -> &[WatchlistTarget];

    /// Raw info entry for a catalog id, without redirection.
    fn info(&self, catalog_id: &str) -> Option<&DsoInfo>;
}

/// Look up descriptive info for a catalog id, following at most one level
/// of `See` redirection.
///
/// Returns `None` ("no info") when the id is unknown, or when the entry is
/// a pure redirect whose target is missing.
pub fn resolve_info<'a>(source: &'a dyn CatalogSource, catalog_id: &str) -> Option<&'a DsoInfo> {
    let entry = source.info(catalog_id)?;

    if let Some(target) = entry.see.as_deref() {
        if let Some(resolved) = source.info(target) {
            return Some(resolved);
        }
    }

    if entry.is_pure_redirect() {
        return None;
    }
    Some(entry)
}

/// Extract the canonical catalog id from an associated filename.
///
/// The id is the stem's substring before the first underscore, uppercased,
/// with spaces stripped: `M1_20250113_annotated_full.jpg` -> `M1`,
/// `SH2-308_20250113_full.jpg` -> `SH2-308`.
pub fn catalog_id_from_filename(filename: &str) -> Option<String> {
    let stem = Path::new(filename).file_stem()?.to_str()?;
    let head = stem.split('_').next()?;
    let id: String = head
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}

/// Normalize a watchlist name into a canonical catalog id (uppercase, no
/// spaces).
pub fn normalize_catalog_id(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}

/// On-disk catalog file layout.
#[derive(Debug, Serialize, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    targets: Vec<WatchlistTarget>,
    #[serde(default)]
    info: HashMap<String, DsoInfo>,
}

/// Catalog backed by a single JSON file.
#[derive(Debug)]
pub struct JsonCatalog {
    targets: Vec<WatchlistTarget>,
    info: HashMap<String, DsoInfo>,
}

impl JsonCatalog {
    /// Load a catalog from a JSON file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if a
    /// target carries non-finite coordinates.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let file: CatalogFile = serde_json::from_str(&content)?;
        Self::new(file.targets, file.info)
    }

    /// Build a catalog from already-parsed parts. Info keys are normalized
    /// to canonical ids.
    pub fn new(targets: Vec<WatchlistTarget>, info: HashMap<String, DsoInfo>) -> Result<Self> {
        for target in &targets {
            if !target.ra_deg.is_finite() || !target.dec_deg.is_finite() {
                return Err(Error::invalid_input(format!(
                    "watchlist target '{}' has non-finite coordinates",
                    target.name
                )));
            }
        }
        let info = info
            .into_iter()
            .map(|(k, v)| (normalize_catalog_id(&k), v))
            .collect();
        Ok(Self { targets, info })
    }
}

impl CatalogSource for JsonCatalog {
    fn targets(&self) -> &[WatchlistTarget] {
        &self.targets
    }

    fn info(&self, catalog_id: &str) -> Option<&DsoInfo> {
        self.info.get(catalog_id)
    }
}
