//! Nightly deep-sky visibility reports for amateur observers.
//!
//! Given an observer profile (location, timezone, altitude and azimuth
//! constraints) and a calendar date, the engine computes which watchlist
//! objects are observable during astronomical darkness for at least an
//! hour, and for what span. Reports are sealed with a checksum and served
//! through a file-backed cache with a 24-hour TTL, so repeated requests
//! for the same profile and night are answered without recomputation.
//!
//! - [`service::ReportService`] is the main entry point
//! - [`engine::compute_visibility`] is the pure computation
//! - [`cache::ReportCache`] stores sealed report envelopes on disk
//! - [`profiles`] and [`catalog`] hold the observer and object data

pub mod api;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod geocode;
pub mod profiles;
pub mod render;
pub mod service;

pub use api::{CacheStatus, ReportEnvelope, ReportResponse, VisibilityReport, VisibleObject};
pub use config::{Config, EngineSettings};
pub use error::{Error, ErrorKind, Result};
pub use service::ReportService;
