use nessus_api::ApiError;
use nessus_browser::BrowserError;
use nessus_core::ScanStatus;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("scan not found: {0}")]
    ScanNotFound(String),

    #[error("protocol error from {url}: {reason}")]
    Protocol { url: String, reason: String },

    #[error("element not visible: {0}")]
    ElementNotVisible(String),

    #[error("scan {name} did not start running within {waited:?}")]
    ScanStartTimeout { name: String, waited: Duration },

    #[error("cannot start scan {name}: currently {status}")]
    InvalidState { name: String, status: ScanStatus },

    #[error("operation cancelled")]
    Cancelled,

    #[error("API error: {0}")]
    Api(ApiError),

    #[error("Browser error: {0}")]
    Browser(BrowserError),
}

impl From<ApiError> for ScanError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::ScanNotFound(name) => Self::ScanNotFound(name),
            ApiError::Protocol { url, reason } => Self::Protocol { url, reason },
            other => Self::Api(other),
        }
    }
}

impl From<BrowserError> for ScanError {
    fn from(err: BrowserError) -> Self {
        match err {
            BrowserError::ElementNotVisible(selector) => Self::ElementNotVisible(selector),
            other => Self::Browser(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;
