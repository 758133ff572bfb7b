//! Nessus Scanner - Scan lifecycle control.
//!
//! This crate launches a named scan and waits for it to finish. Launches go
//! through the REST API first; when the appliance answers 412 (the endpoint
//! is locked on its licensing tier) the web console is driven instead.
//!
//! # Features
//!
//! - Refuses to launch scans that are already busy (running, paused, ...)
//! - API launch with web console substitution on feature lock
//! - Bounded two-phase completion polling (await start, await terminal)
//! - Injectable clock and cancellation token for the polling loops
//!
//! # Example
//!
//! ```rust,ignore
//! use nessus_scanner::{ApiLauncher, ScanController, WebFallbackDriver};
//! use std::sync::Arc;
//!
//! let controller = ScanController::new(
//!     directory.clone(),
//!     Arc::new(ApiLauncher::new(api)),
//!     Arc::new(WebFallbackDriver::new(directory, page, credentials)),
//! );
//!
//! controller.start_scan("Weekly external", &[]).await?;
//! let finished = controller.wait_for_completion("Weekly external").await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod clock;
pub mod controller;
#[allow(missing_docs)]
pub mod error;
pub mod launcher;
pub mod web;

// Re-export commonly used types
pub use clock::{Clock, TokioClock};
pub use controller::{LaunchOutcome, ScanController};
pub use error::{Result, ScanError};
pub use launcher::{ApiLauncher, LaunchResult, ScanLauncher};
pub use web::{folder_slug, format_targets, WebFallbackDriver};
