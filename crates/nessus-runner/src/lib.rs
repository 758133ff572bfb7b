//! Nessus Pilot runner
//!
//! Thin entry point: loads configuration, launches the configured scan and
//! blocks until it finishes. Lifecycle logic lives in `nessus-scanner`.

use anyhow::{bail, Context};
use nessus_api::{HttpClient, NessusApi, ScanDirectory};
use nessus_browser::{BrowserActions, BrowserEngine};
use nessus_core::AppConfig;
use nessus_scanner::{ApiLauncher, ScanController, WebFallbackDriver};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Exit code when the scan finished.
pub const EXIT_COMPLETED: u8 = 0;
/// Exit code for any failure.
pub const EXIT_FAILED: u8 = 1;
/// Exit code when the scan was still running at the completion timeout.
pub const EXIT_TIMED_OUT: u8 = 2;

/// File name of the screenshot saved after a failed run.
pub const FAILURE_SCREENSHOT: &str = "nessus-pilot-failure.png";

/// Initialize tracing subscriber for logging
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,nessus=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();
}

/// Map the outcome of a run to a process exit code.
#[must_use]
pub fn exit_code(result: &anyhow::Result<bool>) -> u8 {
    match result {
        Ok(true) => EXIT_COMPLETED,
        Ok(false) => EXIT_TIMED_OUT,
        Err(_) => EXIT_FAILED,
    }
}

/// Run one scan end to end and return the process exit code.
pub async fn run() -> u8 {
    init_tracing();
    info!("Starting Nessus Pilot v{}", env!("CARGO_PKG_VERSION"));

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling");
            on_signal.cancel();
        }
    });

    let result = run_with(cancel).await;
    match &result {
        Ok(true) => info!("Scan completed"),
        Ok(false) => warn!("Scan still running at the completion timeout"),
        Err(e) => error!("{:#}", e),
    }
    exit_code(&result)
}

async fn run_with(cancel: CancellationToken) -> anyhow::Result<bool> {
    let config = AppConfig::load_with_env().context("loading configuration")?;
    config.validate().context("validating configuration")?;
    if config.run.scan_name.is_empty() {
        bail!("no scan configured: set run.scan_name or NESSUS_SCAN_NAME");
    }

    let api: Arc<dyn NessusApi> = Arc::new(
        HttpClient::new(&config.appliance, &config.credentials, &config.api)
            .context("creating API client")?,
    );

    let browser = Arc::new(
        BrowserEngine::launch(&config.browser)
            .await
            .context("launching browser")?,
    );

    let result = drive(&config, api, browser.clone(), cancel).await;

    if let (Err(_), Some(dir)) = (&result, &config.browser.screenshot_dir) {
        match save_screenshot(&*browser, dir).await {
            Ok(path) => info!("Saved failure screenshot to {}", path.display()),
            Err(e) => warn!("{:#}", e),
        }
    }

    // The controller is gone, so this is the last reference
    match Arc::try_unwrap(browser) {
        Ok(engine) => {
            if let Err(e) = engine.close().await {
                warn!("Failed to close browser: {}", e);
            }
        }
        Err(_) => warn!("Browser still referenced, leaving it to drop"),
    }

    result
}

/// Save a PNG of the current page as [`FAILURE_SCREENSHOT`] under `dir`.
pub async fn save_screenshot(page: &dyn BrowserActions, dir: &Path) -> anyhow::Result<PathBuf> {
    let png = page.screenshot().await.context("capturing screenshot")?;
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("creating {}", dir.display()))?;
    let path = dir.join(FAILURE_SCREENSHOT);
    tokio::fs::write(&path, png)
        .await
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

async fn drive(
    config: &AppConfig,
    api: Arc<dyn NessusApi>,
    browser: Arc<BrowserEngine>,
    cancel: CancellationToken,
) -> anyhow::Result<bool> {
    let directory = ScanDirectory::new(api.clone());
    let fallback = WebFallbackDriver::with_config(
        directory.clone(),
        browser,
        config.credentials.clone(),
        &config.lifecycle,
    );

    let controller = ScanController::new(
        directory,
        Arc::new(ApiLauncher::new(api)),
        Arc::new(fallback),
    )
    .with_config(config.lifecycle.clone())
    .with_cancellation(cancel);

    let name = &config.run.scan_name;
    let outcome = controller
        .start_scan(name, &config.run.targets)
        .await
        .with_context(|| format!("starting scan \"{name}\""))?;
    info!("Scan \"{}\" launched ({:?})", name, outcome);

    controller
        .wait_for_completion(name)
        .await
        .with_context(|| format!("waiting for scan \"{name}\""))
}
