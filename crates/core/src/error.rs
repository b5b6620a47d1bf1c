//! Error model.
//!
//! Two layers:
//! - [`DomainError`]: deterministic data/invariant failures (malformed ids,
//!   duplicate catalog entries).
//! - [`ScanError`]: the operational taxonomy surfaced to callers of the scan
//!   workflow. None of these are fatal to the process.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Result type used by the scan workflow.
pub type ScanResult<T> = Result<T, ScanError>;

/// Domain-level error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. empty).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A requested item was not found.
    #[error("not found")]
    NotFound,

    /// A conflict occurred (e.g. duplicate identifier).
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }
}

/// Scan workflow error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScanError {
    /// The camera stream could not be acquired (permission denied, no device).
    /// The scan loop stays idle; the user may retry.
    #[error("camera unavailable: {0}")]
    CameraUnavailable(String),

    /// The detection capability is missing or supports none of the required
    /// symbol formats. Permanent for the session.
    #[error("barcode detection unsupported: {0}")]
    DetectionUnsupported(String),

    /// A single detection cycle failed. Logged; the loop keeps running.
    #[error("detection failed: {0}")]
    DetectionTransient(String),

    /// The catalog could not be loaded at startup. The store stays empty until
    /// a reload succeeds.
    #[error("catalog unavailable: {0}")]
    CatalogFetch(String),

    /// Scanner settings that cannot run (e.g. a zero poll interval).
    #[error("invalid scanner configuration: {0}")]
    InvalidConfig(String),
}

impl ScanError {
    pub fn camera_unavailable(msg: impl Into<String>) -> Self {
        Self::CameraUnavailable(msg.into())
    }

    pub fn detection_unsupported(msg: impl Into<String>) -> Self {
        Self::DetectionUnsupported(msg.into())
    }

    pub fn detection_transient(msg: impl Into<String>) -> Self {
        Self::DetectionTransient(msg.into())
    }

    pub fn catalog_fetch(msg: impl Into<String>) -> Self {
        Self::CatalogFetch(msg.into())
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Whether a user action (retry start, reload catalog) can recover from this error.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            ScanError::DetectionUnsupported(_) | ScanError::InvalidConfig(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_detection_and_bad_config_are_permanent() {
        assert!(ScanError::camera_unavailable("denied").is_recoverable());
        assert!(ScanError::detection_transient("blurry").is_recoverable());
        assert!(ScanError::catalog_fetch("404").is_recoverable());
        assert!(!ScanError::detection_unsupported("no formats").is_recoverable());
        assert!(!ScanError::invalid_config("zero poll interval").is_recoverable());
    }

    #[test]
    fn messages_carry_context() {
        assert_eq!(
            ScanError::camera_unavailable("permission denied").to_string(),
            "camera unavailable: permission denied"
        );
        assert_eq!(
            DomainError::conflict("duplicate item id 7").to_string(),
            "conflict: duplicate item id 7"
        );
    }
}
