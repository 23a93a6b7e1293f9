//! Error types for formfill operations

use thiserror::Error;

/// Errors that can occur across the autofill pipeline.
#[derive(Error, Debug)]
pub enum FormfillError {
    /// The chat endpoint answered with a non-success status.
    #[error("API request failed: {status} - {body}")]
    ApiStatus { status: u16, body: String },

    /// Transport-level HTTP failure, including timeouts.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The model's reply could not be used.
    #[error("failed to parse model response: {0}")]
    ResponseParse(String),

    #[error("API key not configured; set FORMFILL_API_KEY")]
    MissingApiKey,

    #[error("no active profile")]
    NoActiveProfile,

    #[error("profile not found: {0}")]
    ProfileNotFound(String),

    /// Store-level failure that is not plain I/O or JSON.
    #[error("store error: {0}")]
    Store(String),

    #[error("failed to parse page snapshot: {0}")]
    SnapshotParse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for formfill operations.
pub type Result<T> = std::result::Result<T, FormfillError>;
