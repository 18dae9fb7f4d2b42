//! Error types for the batch client

use thiserror::Error;

/// Batch client error
#[derive(Debug, Error)]
pub enum ApiError {
    /// The API reply did not contain the expected results container,
    /// or the exchange itself failed. The whole batch cycle is lost.
    #[error("API reply carried no results container")]
    HttpFetchNoResult,

    /// A stored response for this handle was internally flagged invalid.
    /// The responses table should only ever hold valid entries, so hitting
    /// this means a backend served a poisoned entry.
    #[error("faulty response for handle {handle}")]
    FaultyResponse { handle: u64 },

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server returned a non-success status
    #[error("server error {status}: {message}")]
    Server { status: u16, message: String },

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for batch client operations
pub type Result<T> = std::result::Result<T, ApiError>;
