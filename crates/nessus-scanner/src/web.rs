//! Web console fallback.
//!
//! Launches a scan by driving the product's web UI, for appliances where
//! the REST launch endpoint is feature locked.

use crate::clock::{Clock, TokioClock};
use crate::error::{Result, ScanError};
use crate::launcher::{LaunchResult, ScanLauncher};
use async_trait::async_trait;
use nessus_api::ScanDirectory;
use nessus_browser::{wait_visible, BrowserActions};
use nessus_core::{Credentials, LifecycleConfig, ScanSummary};
use std::sync::Arc;
use std::time::Duration;

/// Console route listing the scans of one folder.
pub const SCAN_FOLDERS_RESOURCE: &str = "/#/scans/folders/";

const LOGIN_USERNAME: &str = ".login-username";
const LOGIN_PASSWORD: &str = ".login-password";
const SIGN_IN: &str = "text=Sign In";
const LAUNCH_DROPDOWN: &str = "#launch-dropdown";
const LAUNCH: &str = "text=Launch";
const DEFAULT_TARGETS: &str = "text=Default";
const CUSTOM_TARGETS: &str = "text=Custom";
const CUSTOM_TARGETS_INPUT: &str = "#custom-launch-targets";
const CUSTOM_TARGETS_LAUNCH: &str = "#custom-targets-launch";

/// Console slug for a folder name: lowercase, whitespace runs become one
/// hyphen. `"All Scans"` becomes `"all-scans"`.
#[must_use]
pub fn folder_slug(folder_name: &str) -> String {
    folder_name
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}

/// Text typed into the custom targets field.
#[must_use]
pub fn format_targets(targets: &[String]) -> String {
    targets.join(", ")
}

/// Drives the web console to launch scans.
pub struct WebFallbackDriver {
    directory: ScanDirectory,
    page: Arc<dyn BrowserActions>,
    credentials: Credentials,
    clock: Arc<dyn Clock>,
    element_timeout_secs: u32,
    settle: Duration,
}

impl WebFallbackDriver {
    /// Create a driver that logs in with the web console credentials.
    #[must_use]
    pub fn new(
        directory: ScanDirectory,
        page: Arc<dyn BrowserActions>,
        credentials: Credentials,
    ) -> Self {
        Self::with_config(directory, page, credentials, &LifecycleConfig::default())
    }

    /// Create a driver using the element and settle budgets from `config`.
    #[must_use]
    pub fn with_config(
        directory: ScanDirectory,
        page: Arc<dyn BrowserActions>,
        credentials: Credentials,
        config: &LifecycleConfig,
    ) -> Self {
        Self {
            directory,
            page,
            credentials,
            clock: Arc::new(TokioClock),
            element_timeout_secs: config.element_timeout_secs,
            settle: Duration::from_secs(config.launch_settle_secs),
        }
    }

    /// Replace the clock used for the post-launch settle pause.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Launch `scan_name` from the folder view, with the scan's default
    /// targets when `targets` is empty.
    pub async fn start_scan(
        &self,
        scan_name: &str,
        folder_name: &str,
        targets: &[String],
    ) -> Result<()> {
        self.directory.assert_scan_exists(scan_name).await?;

        let resource = format!("{SCAN_FOLDERS_RESOURCE}{}", folder_slug(folder_name));
        self.login(&resource).await?;

        let scan_row = format!("text={scan_name}");
        if let Err(e) = self.wait(&scan_row).await {
            tracing::error!("Failed to start the scan \"{}\": {}", scan_name, e);
            return Err(e);
        }
        self.page.click(&scan_row).await?;

        self.wait(LAUNCH_DROPDOWN).await?;
        self.page.click(LAUNCH).await?;

        if targets.is_empty() {
            self.wait(DEFAULT_TARGETS).await?;
            self.page.click(DEFAULT_TARGETS).await?;
        } else {
            self.wait(CUSTOM_TARGETS).await?;
            self.page.click(CUSTOM_TARGETS).await?;
            self.wait(CUSTOM_TARGETS_INPUT).await?;
            self.page
                .fill_field(CUSTOM_TARGETS_INPUT, &format_targets(targets))
                .await?;
            self.page.click(CUSTOM_TARGETS_LAUNCH).await?;
        }

        // Give the console time to register the launch
        self.clock.sleep(self.settle).await;
        tracing::info!("Scan \"{}\" launched from the web console", scan_name);
        Ok(())
    }

    /// Open `resource` and sign in if the login form shows up.
    async fn login(&self, resource: &str) -> Result<()> {
        tracing::info!("Attempting to login to the web console");

        let api = self.directory.api();
        api.check_resource(resource).await?;
        self.page
            .navigate(&format!("{}{}", api.base_url(), resource))
            .await?;

        match self.sign_in().await {
            Ok(()) => {
                tracing::info!("Logged in to the web console");
                Ok(())
            }
            Err(ScanError::ElementNotVisible(selector)) => {
                tracing::warn!(
                    "Login form not visible ({}), assuming an existing session",
                    selector
                );
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn sign_in(&self) -> Result<()> {
        self.wait(LOGIN_USERNAME).await?;
        self.page
            .fill_field(LOGIN_USERNAME, &self.credentials.username)
            .await?;
        self.page
            .fill_field(LOGIN_PASSWORD, &self.credentials.password)
            .await?;
        self.wait(SIGN_IN).await?;
        self.page.click(SIGN_IN).await?;
        Ok(())
    }

    async fn wait(&self, selector: &str) -> Result<()> {
        wait_visible(self.page.as_ref(), selector, self.element_timeout_secs).await?;
        Ok(())
    }
}

#[async_trait]
impl ScanLauncher for WebFallbackDriver {
    async fn launch(&self, scan: &ScanSummary, targets: &[String]) -> Result<LaunchResult> {
        let folder_name = scan.folder_name.as_deref().ok_or_else(|| ScanError::Protocol {
            url: format!("{}/scans", self.directory.api().base_url()),
            reason: format!(
                "folder {} of scan \"{}\" is not listed",
                scan.folder_id, scan.name
            ),
        })?;

        self.start_scan(&scan.name, folder_name, targets).await?;
        Ok(LaunchResult::Started)
    }
}
