//! Scan lifecycle controller.
//!
//! Drives one named scan from idle to launched to terminal: resolve it,
//! refuse to launch it from a busy state, launch via the REST API with the
//! web console as substitute, then poll until it stops running.

use crate::clock::{Clock, TokioClock};
use crate::error::{Result, ScanError};
use crate::launcher::{LaunchResult, ScanLauncher};
use nessus_api::ScanDirectory;
use nessus_core::{LifecycleConfig, ScanStatus};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// How a scan was launched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// The REST API accepted the launch
    Api,
    /// The API was feature locked and the web console was used
    WebFallback,
}

/// Orchestrates existence checks, launch and completion polling.
pub struct ScanController {
    directory: ScanDirectory,
    api_launcher: Arc<dyn ScanLauncher>,
    ui_launcher: Arc<dyn ScanLauncher>,
    clock: Arc<dyn Clock>,
    config: LifecycleConfig,
    cancel: CancellationToken,
}

impl ScanController {
    /// Create a controller with the default budgets and the real clock.
    #[must_use]
    pub fn new(
        directory: ScanDirectory,
        api_launcher: Arc<dyn ScanLauncher>,
        ui_launcher: Arc<dyn ScanLauncher>,
    ) -> Self {
        Self {
            directory,
            api_launcher,
            ui_launcher,
            clock: Arc::new(TokioClock),
            config: LifecycleConfig::default(),
            cancel: CancellationToken::new(),
        }
    }

    /// Use polling budgets from configuration.
    #[must_use]
    pub fn with_config(mut self, config: LifecycleConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the clock used between polls.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Abort waits and polls once `token` is cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// The scan directory this controller queries.
    #[must_use]
    pub fn directory(&self) -> &ScanDirectory {
        &self.directory
    }

    /// Launch the named scan, optionally against `targets` instead of its
    /// configured targets.
    ///
    /// # Errors
    /// - [`ScanError::ScanNotFound`] if no scan has this name
    /// - [`ScanError::InvalidState`] if the scan is busy; nothing is launched
    /// - [`ScanError::Protocol`] if the API answers anything but 200 or 412
    /// - any error of the web console fallback
    pub async fn start_scan(&self, name: &str, targets: &[String]) -> Result<LaunchOutcome> {
        self.check_cancelled()?;
        let scan = self.directory.find_scan(name).await?;

        if !scan.status.is_startable() {
            tracing::error!("Cannot start scan {}: currently {}", name, scan.status);
            return Err(ScanError::InvalidState {
                name: name.to_string(),
                status: scan.status,
            });
        }

        match self.api_launcher.launch(&scan, targets).await? {
            LaunchResult::Started => {
                tracing::info!("Scan \"{}\" started through the API", name);
                Ok(LaunchOutcome::Api)
            }
            LaunchResult::FeatureLocked => {
                tracing::warn!(
                    "Launch endpoint is feature locked, falling back to the web console for \"{}\"",
                    name
                );
                match self.ui_launcher.launch(&scan, targets).await? {
                    LaunchResult::Started => Ok(LaunchOutcome::WebFallback),
                    LaunchResult::FeatureLocked => Err(ScanError::Protocol {
                        url: format!("{}/scans/{}/launch", self.directory.api().base_url(), scan.id),
                        reason: "no launch channel available".to_string(),
                    }),
                }
            }
        }
    }

    /// Block until the named scan finishes, using the configured budgets.
    pub async fn wait_for_completion(&self, name: &str) -> Result<bool> {
        self.block_until_complete(
            name,
            self.config.completion_timeout_minutes,
            self.config.poll_interval_minutes,
        )
        .await
    }

    /// Block until the named scan leaves `running`.
    ///
    /// First waits for the scan to reach `running` (polling every
    /// `start_poll_secs`, bounded by `start_timeout_secs`), then polls every
    /// `interval_minutes` while it runs. Returns `Ok(false)` if it is still
    /// running once `timeout_minutes` have been spent, `Ok(true)` otherwise.
    /// An interval of zero is treated as one minute.
    ///
    /// # Errors
    /// - [`ScanError::ScanNotFound`] if no scan has this name
    /// - [`ScanError::ScanStartTimeout`] if it never starts running
    /// - [`ScanError::Cancelled`] if the cancellation token fires
    pub async fn block_until_complete(
        &self,
        name: &str,
        timeout_minutes: u64,
        interval_minutes: u64,
    ) -> Result<bool> {
        let mut status = self.poll(name).await?;

        let start_budget = Duration::from_secs(self.config.start_timeout_secs);
        let start_poll = Duration::from_secs(self.config.start_poll_secs.max(1));
        let mut start_left = start_budget;
        while !status.is_running() {
            if start_left.is_zero() {
                tracing::error!("Scan \"{}\" unable to start (last status {})", name, status);
                return Err(ScanError::ScanStartTimeout {
                    name: name.to_string(),
                    waited: start_budget,
                });
            }
            tracing::info!(
                "Waiting for \"{}\" to start, sleeping {} seconds",
                name,
                start_poll.as_secs()
            );
            self.pause(start_poll).await?;
            start_left = start_left.saturating_sub(start_poll);
            status = self.poll(name).await?;
        }

        let interval = interval_minutes.max(1);
        let mut minutes_left = timeout_minutes;
        while status.is_running() {
            if minutes_left == 0 {
                tracing::error!("Scan \"{}\" timed out after {} minutes", name, timeout_minutes);
                return Ok(false);
            }
            tracing::info!("\"{}\" is running, sleeping {} minutes", name, interval);
            self.pause(Duration::from_secs(interval * 60)).await?;
            minutes_left = minutes_left.saturating_sub(interval);
            status = self.poll(name).await?;
        }

        tracing::info!("Scan \"{}\" finished with status {}", name, status);
        Ok(true)
    }

    async fn poll(&self, name: &str) -> Result<ScanStatus> {
        self.check_cancelled()?;
        let status = self.directory.get_status(name).await?;
        tracing::debug!("Scan \"{}\" status: {}", name, status);
        Ok(status)
    }

    async fn pause(&self, duration: Duration) -> Result<()> {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(ScanError::Cancelled),
            () = self.clock.sleep(duration) => Ok(()),
        }
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            Err(ScanError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use nessus_api::{NessusApi, RawScan, ScansPayload};
    use nessus_core::{ScanFolder, ScanSummary};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Serves one status per `GET /scans`, repeating the last one.
    struct StatusSequence {
        statuses: Mutex<VecDeque<&'static str>>,
        polls: Mutex<usize>,
    }

    impl StatusSequence {
        fn new(statuses: &[&'static str]) -> Arc<Self> {
            Arc::new(Self {
                statuses: Mutex::new(statuses.iter().copied().collect()),
                polls: Mutex::new(0),
            })
        }

        fn polls(&self) -> usize {
            *self.polls.lock().unwrap()
        }
    }

    #[async_trait]
    impl NessusApi for StatusSequence {
        async fn list_scans(&self) -> nessus_api::Result<ScansPayload> {
            *self.polls.lock().unwrap() += 1;
            let mut statuses = self.statuses.lock().unwrap();
            let status = if statuses.len() > 1 {
                statuses.pop_front().unwrap_or("empty")
            } else {
                statuses.front().copied().unwrap_or("empty")
            };
            Ok(ScansPayload {
                folders: vec![ScanFolder {
                    name: "My Scans".to_string(),
                    id: 3,
                }],
                scans: Some(vec![RawScan {
                    name: "Weekly".to_string(),
                    id: 42,
                    folder_id: 3,
                    status: ScanStatus::from(status),
                    last_modification_date: None,
                }]),
            })
        }

        async fn launch(&self, _scan_id: i64, _targets: &[String]) -> nessus_api::Result<u16> {
            unreachable!("launch goes through the launchers")
        }

        async fn check_resource(&self, _resource: &str) -> nessus_api::Result<()> {
            Ok(())
        }

        fn base_url(&self) -> &str {
            "https://nessus.test"
        }
    }

    struct FakeLauncher {
        result: std::result::Result<LaunchResult, u16>,
        calls: Mutex<Vec<(Option<String>, Vec<String>)>>,
    }

    impl FakeLauncher {
        fn new(result: std::result::Result<LaunchResult, u16>) -> Arc<Self> {
            Arc::new(Self {
                result,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<(Option<String>, Vec<String>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ScanLauncher for FakeLauncher {
        async fn launch(&self, scan: &ScanSummary, targets: &[String]) -> Result<LaunchResult> {
            self.calls
                .lock()
                .unwrap()
                .push((scan.folder_name.clone(), targets.to_vec()));
            self.result.map_err(|code| ScanError::Protocol {
                url: "launch".to_string(),
                reason: format!("unexpected status {code}"),
            })
        }
    }

    #[derive(Default)]
    struct RecordingClock(Mutex<Vec<Duration>>);

    impl RecordingClock {
        fn sleeps(&self) -> Vec<Duration> {
            self.0.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Clock for RecordingClock {
        async fn sleep(&self, duration: Duration) {
            self.0.lock().unwrap().push(duration);
        }
    }

    fn controller(
        api: Arc<StatusSequence>,
        api_launcher: Arc<FakeLauncher>,
        ui_launcher: Arc<FakeLauncher>,
        clock: Arc<RecordingClock>,
    ) -> ScanController {
        ScanController::new(ScanDirectory::new(api), api_launcher, ui_launcher).with_clock(clock)
    }

    fn targets() -> Vec<String> {
        vec!["10.0.0.1".to_string(), "10.0.0.2".to_string()]
    }

    #[tokio::test]
    async fn test_start_rejects_non_startable_states() {
        for state in [
            "running", "stopping", "imported", "pausing", "paused", "pending", "resuming",
        ] {
            let api_launcher = FakeLauncher::new(Ok(LaunchResult::Started));
            let ui_launcher = FakeLauncher::new(Ok(LaunchResult::Started));
            let ctl = controller(
                StatusSequence::new(&[state]),
                api_launcher.clone(),
                ui_launcher.clone(),
                Arc::default(),
            );

            let err = ctl.start_scan("Weekly", &[]).await.unwrap_err();
            assert!(
                matches!(&err, ScanError::InvalidState { status, .. } if status.as_str() == state)
            );
            assert!(api_launcher.calls().is_empty(), "{state} must not launch");
            assert!(ui_launcher.calls().is_empty());
        }
    }

    #[tokio::test]
    async fn test_start_unknown_scan() {
        let launcher = FakeLauncher::new(Ok(LaunchResult::Started));
        let ctl = controller(
            StatusSequence::new(&["completed"]),
            launcher.clone(),
            launcher.clone(),
            Arc::default(),
        );

        let err = ctl.start_scan("Missing", &[]).await.unwrap_err();
        assert!(matches!(err, ScanError::ScanNotFound(_)));
        assert!(launcher.calls().is_empty());
    }

    #[tokio::test]
    async fn test_start_via_api_skips_fallback() {
        let api_launcher = FakeLauncher::new(Ok(LaunchResult::Started));
        let ui_launcher = FakeLauncher::new(Ok(LaunchResult::Started));
        let ctl = controller(
            StatusSequence::new(&["completed"]),
            api_launcher.clone(),
            ui_launcher.clone(),
            Arc::default(),
        );

        let outcome = ctl.start_scan("Weekly", &targets()).await.expect("start");
        assert_eq!(outcome, LaunchOutcome::Api);
        assert_eq!(api_launcher.calls().len(), 1);
        assert!(ui_launcher.calls().is_empty());
    }

    #[tokio::test]
    async fn test_feature_lock_falls_back_once() {
        let api_launcher = FakeLauncher::new(Ok(LaunchResult::FeatureLocked));
        let ui_launcher = FakeLauncher::new(Ok(LaunchResult::Started));
        let ctl = controller(
            StatusSequence::new(&["canceled"]),
            api_launcher.clone(),
            ui_launcher.clone(),
            Arc::default(),
        );

        let outcome = ctl.start_scan("Weekly", &targets()).await.expect("start");
        assert_eq!(outcome, LaunchOutcome::WebFallback);
        assert_eq!(
            ui_launcher.calls(),
            vec![(Some("My Scans".to_string()), targets())]
        );
    }

    #[tokio::test]
    async fn test_unexpected_status_does_not_fall_back() {
        let api_launcher = FakeLauncher::new(Err(500));
        let ui_launcher = FakeLauncher::new(Ok(LaunchResult::Started));
        let ctl = controller(
            StatusSequence::new(&["completed"]),
            api_launcher,
            ui_launcher.clone(),
            Arc::default(),
        );

        let err = ctl.start_scan("Weekly", &[]).await.unwrap_err();
        assert!(matches!(err, ScanError::Protocol { .. }));
        assert!(ui_launcher.calls().is_empty());
    }

    #[tokio::test]
    async fn test_block_until_complete_follows_status_sequence() {
        let api = StatusSequence::new(&["pending", "pending", "running", "running", "completed"]);
        let clock = Arc::new(RecordingClock::default());
        let launcher = FakeLauncher::new(Ok(LaunchResult::Started));
        let ctl = controller(api.clone(), launcher.clone(), launcher, clock.clone());

        let finished = ctl.block_until_complete("Weekly", 360, 5).await.expect("block");

        assert!(finished);
        assert_eq!(api.polls(), 5);
        assert_eq!(
            clock.sleeps(),
            vec![
                Duration::from_secs(15),
                Duration::from_secs(15),
                Duration::from_secs(300),
                Duration::from_secs(300),
            ]
        );
    }

    #[tokio::test]
    async fn test_block_until_complete_times_out_while_running() {
        let api = StatusSequence::new(&["running"]);
        let clock = Arc::new(RecordingClock::default());
        let launcher = FakeLauncher::new(Ok(LaunchResult::Started));
        let ctl = controller(api.clone(), launcher.clone(), launcher, clock.clone());

        let finished = ctl.block_until_complete("Weekly", 10, 5).await.expect("block");

        assert!(!finished);
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(300); 2]);
        assert_eq!(api.polls(), 3);
    }

    #[tokio::test]
    async fn test_uneven_interval_still_bounded() {
        let api = StatusSequence::new(&["running"]);
        let clock = Arc::new(RecordingClock::default());
        let launcher = FakeLauncher::new(Ok(LaunchResult::Started));
        let ctl = controller(api, launcher.clone(), launcher, clock.clone());

        assert!(!ctl.block_until_complete("Weekly", 7, 5).await.expect("block"));
        assert_eq!(clock.sleeps().len(), 2);
    }

    #[tokio::test]
    async fn test_scan_that_never_starts() {
        let api = StatusSequence::new(&["pending"]);
        let clock = Arc::new(RecordingClock::default());
        let launcher = FakeLauncher::new(Ok(LaunchResult::Started));
        let ctl = controller(api, launcher.clone(), launcher, clock.clone());

        let err = ctl.block_until_complete("Weekly", 360, 5).await.unwrap_err();
        assert!(matches!(err, ScanError::ScanStartTimeout { waited, .. } if waited == Duration::from_secs(900)));
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(15); 60]);
    }

    #[tokio::test]
    async fn test_configured_budgets() {
        let api = StatusSequence::new(&["pending", "running", "aborted"]);
        let clock = Arc::new(RecordingClock::default());
        let launcher = FakeLauncher::new(Ok(LaunchResult::Started));
        let config = LifecycleConfig {
            start_poll_secs: 5,
            poll_interval_minutes: 1,
            ..LifecycleConfig::default()
        };
        let ctl = controller(api, launcher.clone(), launcher, clock.clone()).with_config(config);

        assert!(ctl.wait_for_completion("Weekly").await.expect("block"));
        assert_eq!(
            clock.sleeps(),
            vec![Duration::from_secs(5), Duration::from_secs(60)]
        );
    }

    #[tokio::test]
    async fn test_cancellation_stops_polling() {
        let api = StatusSequence::new(&["running"]);
        let launcher = FakeLauncher::new(Ok(LaunchResult::Started));
        let token = CancellationToken::new();
        let ctl = controller(api.clone(), launcher.clone(), launcher, Arc::default())
            .with_cancellation(token.clone());

        token.cancel();
        let err = ctl.block_until_complete("Weekly", 360, 5).await.unwrap_err();
        assert!(matches!(err, ScanError::Cancelled));
        assert_eq!(api.polls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_interrupts_running_wait() {
        let api = StatusSequence::new(&["running"]);
        let launcher = FakeLauncher::new(Ok(LaunchResult::Started));
        let token = CancellationToken::new();
        let ctl = ScanController::new(ScanDirectory::new(api.clone()), launcher.clone(), launcher)
            .with_cancellation(token.clone());

        let started = tokio::time::Instant::now();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(12 * 60)).await;
            token.cancel();
        });

        let err = ctl.block_until_complete("Weekly", 360, 5).await.unwrap_err();
        assert!(matches!(err, ScanError::Cancelled));
        // polled at 0, 5 and 10 minutes; the third pause is cut short
        assert_eq!(api.polls(), 3);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(12 * 60) && elapsed < Duration::from_secs(15 * 60));
    }
}
