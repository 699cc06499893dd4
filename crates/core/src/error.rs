//! Error types for readmark operations.
//!
//! The extraction pipeline itself is total: [`crate::extract`] never fails.
//! [`ReadmarkError`] covers the fallible edges around it, such as loading a
//! configuration file, parsing a source URL, or a caller that wants resource
//! guard trips reported as hard failures.
//!
//! # Example
//!
//! ```rust
//! use readmark_core::{Extractor, ReadmarkError};
//!
//! let extraction = Extractor::new().run("<p>Hello</p>", "https://example.com/hello");
//! match extraction.into_strict() {
//!     Ok(result) => println!("{}", result.content),
//!     Err(ReadmarkError::ResourceGuardTripped(trip)) => eprintln!("truncated: {trip}"),
//!     Err(e) => eprintln!("{e}"),
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

use crate::dom_tree::GuardTrip;

/// Main error type for readmark.
#[derive(Error, Debug)]
pub enum ReadmarkError {
    /// Invalid URL provided.
    ///
    /// Returned when a source URL cannot be used as a base for link resolution.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Input size or nesting depth exceeded a configured cap.
    ///
    /// The pipeline never raises this on its own; it truncates and keeps going.
    /// Callers opt in through [`crate::Extraction::into_strict`].
    #[error("Resource guard tripped: {0}")]
    ResourceGuardTripped(GuardTrip),

    /// Configuration errors.
    ///
    /// Returned when a configuration document is malformed or holds unknown keys.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Output serialization errors.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for ReadmarkError {
    fn from(err: toml::de::Error) -> Self {
        ReadmarkError::ConfigError(err.to_string())
    }
}

impl From<serde_json::Error> for ReadmarkError {
    fn from(err: serde_json::Error) -> Self {
        ReadmarkError::Serialization(err.to_string())
    }
}

/// Result type alias for ReadmarkError.
pub type Result<T> = std::result::Result<T, ReadmarkError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom_tree::Guard;

    #[test]
    fn test_error_display() {
        let err = ReadmarkError::InvalidUrl("not a url".to_string());
        assert!(err.to_string().contains("Invalid URL"));
    }

    #[test]
    fn test_guard_trip_error() {
        let err = ReadmarkError::ResourceGuardTripped(GuardTrip { guard: Guard::NestingDepth, limit: 512 });
        assert!(err.to_string().contains("nesting depth"));
        assert!(err.to_string().contains("512"));
    }

    #[test]
    fn test_toml_error_conversion() {
        let err: ReadmarkError = toml::from_str::<toml::Value>("= broken").unwrap_err().into();
        assert!(matches!(err, ReadmarkError::ConfigError(_)));
    }
}
