//! Core error types for distrack-core.
//!
//! The store has exactly one domain failure, [`StoreError::NotFound`].
//! Everything else here wraps infrastructure failures (disk, SQLite,
//! configuration, HTTP) so callers can propagate them with `?`.

use std::path::PathBuf;
use thiserror::Error;

/// Errors returned by [`crate::store::ChallengeStore`] operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The referenced challenge does not exist in the collection.
    #[error("Challenge not found: {id}")]
    NotFound { id: String },

    /// The persisted document could not be read or written.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl StoreError {
    pub fn not_found(id: impl Into<String>) -> Self {
        StoreError::NotFound { id: id.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Errors from the persisted document backends.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to determine or create the data directory
    #[error("Cannot resolve data directory: {0}")]
    DataDir(String),

    /// File read/write failed
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Stored document is not valid JSON for the expected shape
    #[error("Corrupt document at {location}: {source}")]
    Corrupt {
        location: String,
        #[source]
        source: serde_json::Error,
    },

    /// Failed to serialize the document
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// SQLite backend failure
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Key does not exist in the configuration tree
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Update checker errors.
#[derive(Error, Debug)]
pub enum UpdateError {
    /// No release feed configured
    #[error("Update feed URL is not configured")]
    NotConfigured,

    /// Feed URL could not be parsed
    #[error("Invalid update feed URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// HTTP transport failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("Update server returned HTTP {status}")]
    Status { status: u16 },

    /// Release manifest is malformed
    #[error("Invalid release manifest: {0}")]
    Manifest(String),

    /// Version string is not semver
    #[error("Invalid version '{version}': {source}")]
    Version {
        version: String,
        #[source]
        source: semver::Error,
    },

    /// Downloaded file does not match the manifest digest
    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    Checksum { expected: String, actual: String },

    /// Writing the downloaded installer failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_the_id() {
        let err = StoreError::not_found("abc");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Challenge not found: abc");
    }

    #[test]
    fn storage_failure_passes_through_store_error() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: StoreError = StorageError::Json(source).into();
        assert!(!err.is_not_found());
        assert!(err.to_string().starts_with("JSON error:"));
    }
}
