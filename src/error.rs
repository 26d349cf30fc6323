//! Error types for report, cache, and profile operations.
//!
//! The taxonomy distinguishes three caller-visible categories: bad input
//! (fix the request), not found, and upstream failures (retry later).
//! Storage degradation (`CacheUnwritable`) is internal; the service layer
//! logs it and keeps serving regenerated reports.

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Crate-wide error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed profile name, out-of-range altitude/azimuth, or other
    /// request-level problem. Rejected before any cache or engine work.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Date string that does not parse as `YYYY-MM-DD`.
    #[error("invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    /// Profile coordinates are absent or outside valid ranges, so the
    /// engine cannot place the observer.
    #[error("profile '{0}' has no usable geocoded coordinates")]
    GeocodeUnresolved(String),

    /// The geocoding provider could not resolve a location query.
    #[error("could not geocode '{query}': {message}")]
    Geocode { query: String, message: String },

    /// No profile stored under the given name.
    #[error("profile not found: {0}")]
    ProfileNotFound(String),

    /// A profile with this name already exists.
    #[error("profile already exists: {0}")]
    ProfileExists(String),

    /// The built-in `default` profile cannot be deleted.
    #[error("the default profile cannot be deleted")]
    DefaultProfileProtected,

    /// The visibility engine did not return within the configured bound.
    /// The cache is left untouched.
    #[error("visibility computation exceeded {0} seconds")]
    ComputationTimeout(u64),

    /// The visibility engine exited abnormally or could not produce a
    /// report (e.g. no astronomical darkness at the site on that date).
    #[error("visibility computation failed: {0}")]
    ComputationFailure(String),

    /// The cache storage location rejected a write. Never surfaced to
    /// report callers; the service degrades to always-regenerate.
    #[error("report cache unwritable: {0}")]
    CacheUnwritable(String),

    /// Filesystem error outside the cache write path.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode/decode failure for profiles, catalog, or payloads.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Coarse classification of an [`Error`] for callers that only need to
/// decide between fixing the request, retrying, or giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request itself was malformed; retrying unchanged cannot help.
    BadInput,
    /// The named entity does not exist.
    NotFound,
    /// An upstream computation or collaborator failed; retry later.
    Upstream,
    /// Internal storage or encoding problem.
    Internal,
}

impl Error {
    /// Build an [`Error::InvalidInput`] from any displayable message.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Error::InvalidInput(message.into())
    }

    /// Build an [`Error::Geocode`] for a failed location query.
    pub fn geocode(query: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Geocode {
            query: query.into(),
            message: message.into(),
        }
    }

    /// Classify this error for user-facing handling.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidInput(_)
            | Error::InvalidDate(_)
            | Error::ProfileExists(_)
            | Error::DefaultProfileProtected => ErrorKind::BadInput,
            Error::ProfileNotFound(_) => ErrorKind::NotFound,
            Error::GeocodeUnresolved(_)
            | Error::Geocode { .. }
            | Error::ComputationTimeout(_)
            | Error::ComputationFailure(_) => ErrorKind::Upstream,
            Error::CacheUnwritable(_) | Error::Io(_) | Error::Serialization(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Whether retrying the same request later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::ComputationTimeout(_) | Error::ComputationFailure(_) | Error::Geocode { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(
            Error::invalid_input("bad azimuth").kind(),
            ErrorKind::BadInput
        );
        assert_eq!(
            Error::ProfileNotFound("backyard".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(Error::ComputationTimeout(120).kind(), ErrorKind::Upstream);
        assert_eq!(
            Error::CacheUnwritable("read-only".into()).kind(),
            ErrorKind::Internal
        );
        assert_eq!(Error::DefaultProfileProtected.kind(), ErrorKind::BadInput);
    }

    #[test]
    fn test_retryable() {
        assert!(Error::ComputationTimeout(120).is_retryable());
        assert!(Error::geocode("Nowhere", "provider down").is_retryable());
        assert!(!Error::InvalidDate("13-01-2025".into()).is_retryable());
        assert!(!Error::DefaultProfileProtected.is_retryable());
    }
}
