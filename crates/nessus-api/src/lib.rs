//! Nessus API - REST adapter and scan directory.
//!
//! [`HttpClient`] talks to the appliance with the fixed header set the REST
//! API expects (JSON content type, user agent, `X-ApiKeys`). [`ScanDirectory`]
//! layers read-only queries on top: folders, scans, lookup by name.
//!
//! # Example
//!
//! ```rust,ignore
//! use nessus_api::{HttpClient, ScanDirectory};
//! use std::sync::Arc;
//!
//! let client = HttpClient::new(&config.appliance, &config.credentials, &config.api)?;
//! let directory = ScanDirectory::new(Arc::new(client));
//! let status = directory.get_status("Weekly external").await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod client;
pub mod directory;
pub mod error;

// Re-export commonly used types
pub use client::{HttpClient, NessusApi, RawScan, ScansPayload};
pub use directory::ScanDirectory;
pub use error::{ApiError, Result};
