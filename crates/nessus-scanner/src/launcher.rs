//! Scan launch strategies.
//!
//! The REST API is tried first. A 412 answer means the launch endpoint is
//! locked on this product tier, which the controller treats as a signal to
//! substitute the web console launcher.

use crate::error::{Result, ScanError};
use async_trait::async_trait;
use nessus_api::NessusApi;
use nessus_core::ScanSummary;
use std::sync::Arc;

/// HTTP status returned by the launch endpoint on success.
pub const STATUS_LAUNCHED: u16 = 200;

/// HTTP status returned when the launch endpoint is feature locked.
pub const STATUS_FEATURE_LOCKED: u16 = 412;

/// What a launcher managed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchResult {
    /// The scan was launched
    Started,
    /// This channel is not available on the appliance
    FeatureLocked,
}

/// One way of launching a scan.
#[async_trait]
pub trait ScanLauncher: Send + Sync {
    /// Launch `scan`, optionally overriding its targets.
    async fn launch(&self, scan: &ScanSummary, targets: &[String]) -> Result<LaunchResult>;
}

/// Launches through `POST /scans/{id}/launch`.
pub struct ApiLauncher {
    api: Arc<dyn NessusApi>,
}

impl ApiLauncher {
    /// Create a launcher over the given API client.
    #[must_use]
    pub fn new(api: Arc<dyn NessusApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ScanLauncher for ApiLauncher {
    async fn launch(&self, scan: &ScanSummary, targets: &[String]) -> Result<LaunchResult> {
        let status = self.api.launch(scan.id, targets).await?;

        match status {
            STATUS_LAUNCHED => Ok(LaunchResult::Started),
            STATUS_FEATURE_LOCKED => Ok(LaunchResult::FeatureLocked),
            other => Err(ScanError::Protocol {
                url: format!("{}/scans/{}/launch", self.api.base_url(), scan.id),
                reason: format!("unexpected status {other} when launching \"{}\"", scan.name),
            }),
        }
    }
}
