//! Error types and error handling for the CourseAlign retrieval core.
//!
//! This module defines the error types used throughout the
//! application. Adapters decide how each class is presented
//! (HTTP status, exit code, etc) using the classification helpers.

use thiserror::Error;

/// Result type alias for CourseAlign operations
pub type Result<T> = std::result::Result<T, CourseAlignError>;

/// Main error type for the CourseAlign core
#[derive(Error, Debug)]
pub enum CourseAlignError {
    #[error("Extraction failed: {0}")]
    Extraction(String),

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    #[error("Collection corrupt: {0}")]
    CollectionCorrupt(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Invalid collection: {0}")]
    InvalidCollection(String),

    #[error("Build already in progress for collection: {0}")]
    BuildInProgress(String),

    #[error("Build cancelled: {0}")]
    BuildCancelled(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),
}

impl CourseAlignError {
    /// Get user-friendly error message
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Missing or corrupt collection (not-found class)
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CourseAlignError::CollectionNotFound(_) | CourseAlignError::CollectionCorrupt(_)
        )
    }

    /// Check if this is a conflict error (build already running)
    pub fn is_conflict(&self) -> bool {
        matches!(self, CourseAlignError::BuildInProgress(_))
    }

    /// Malformed input document, query or configuration
    pub fn is_bad_request(&self) -> bool {
        matches!(
            self,
            CourseAlignError::Extraction(_)
                | CourseAlignError::InvalidQuery(_)
                | CourseAlignError::InvalidCollection(_)
                | CourseAlignError::ConfigError(_)
        )
    }

    /// Provider or internal failure
    pub fn is_server_error(&self) -> bool {
        !(self.is_not_found() || self.is_conflict() || self.is_bad_request())
    }
}
