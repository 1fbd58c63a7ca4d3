//! Error types for the filmi2k scraper
//!
//! Every failure inside the pipeline is one of these variants. None of them
//! leave the public operations: they are logged and turned into empty
//! results at the boundary of the smallest unit of work.

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Error type for all filmi2k scraper operations
#[derive(Error, Debug)]
pub enum Filmi2kError {
    /// HTTP request failed (connection, timeout, body decoding)
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("Unexpected status {status} for {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// Redirect chain exceeded the configured depth
    #[error("Too many redirects: {0}")]
    TooManyRedirects(String),

    /// Response body did not have the expected structure
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Invalid URL format
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Catalog identifier is not part of the category table
    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Serialize for Filmi2kError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Result type alias for filmi2k operations
pub type Result<T> = std::result::Result<T, Filmi2kError>;
