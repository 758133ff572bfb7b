//! Error types for the REST API adapter and the scan directory.

use thiserror::Error;

/// Errors raised while talking to the appliance REST API.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Response had an unexpected status code or an undecodable body
    #[error("protocol error from {url}: {reason}")]
    Protocol {
        /// Requested URL
        url: String,
        /// What was wrong with the response
        reason: String,
    },

    /// No scan with this name exists on the appliance
    #[error("scan not found: {0}")]
    ScanNotFound(String),

    /// Transport failure (connect, TLS, timeout)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Client could not be constructed
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias for API operations.
pub type Result<T> = std::result::Result<T, ApiError>;
