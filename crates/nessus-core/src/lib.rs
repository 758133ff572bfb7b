//! Nessus Core - Foundation crate for Nessus scan automation.
//!
//! This crate provides the shared scan types, configuration management and
//! configuration errors that all other crates in the workspace depend on.
//!
//! # Modules
//!
//! - [`error`] - Configuration error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths and env overrides
//! - [`types`] - Scan snapshots (`ScanFolder`, `ScanSummary`) and the open `ScanStatus` enum
//!
//! # Example
//!
//! ```rust
//! use nessus_core::{AppConfig, ScanStatus};
//!
//! let config = AppConfig::default();
//! assert_eq!(config.lifecycle.start_timeout_secs, 900);
//! assert!(!ScanStatus::from("paused").is_startable());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{
    ApiConfig, AppConfig, ApplianceConfig, BrowserConfig, Credentials, LifecycleConfig, RunConfig,
};
pub use error::{ConfigError, ConfigResult};
pub use types::{ScanFolder, ScanStatus, ScanSummary};
