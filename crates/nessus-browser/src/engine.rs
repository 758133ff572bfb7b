use crate::actions::{BrowserActions, Selector};
use crate::error::{BrowserError, Result};
use chromiumoxide::browser::{Browser, BrowserConfig as ChromiumConfig};
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures_util::stream::StreamExt;
use nessus_core::BrowserConfig;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Poll period used while waiting for a selector.
const VISIBILITY_POLL: Duration = Duration::from_millis(100);

/// Browser automation engine.
///
/// Owns exactly one browser process and one page. Call [`BrowserEngine::close`]
/// when done; dropping the engine only stops the event handler.
pub struct BrowserEngine {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    navigation_timeout: Duration,
}

impl BrowserEngine {
    /// Launch a browser with default settings
    pub async fn new() -> Result<Self> {
        Self::launch(&BrowserConfig::default()).await
    }

    /// Launch a browser and open its single working page
    pub async fn launch(config: &BrowserConfig) -> Result<Self> {
        let mut builder = ChromiumConfig::builder()
            .no_sandbox()
            .window_size(config.window_width, config.window_height)
            .request_timeout(Duration::from_secs(config.navigation_timeout_secs));

        if !config.headless {
            builder = builder.with_head();
        }
        if config.ignore_https_errors {
            builder = builder.arg("--ignore-certificate-errors");
        }

        let chromium_config = builder.build().map_err(BrowserError::ChromiumError)?;

        let (browser, mut handler) = Browser::launch(chromium_config).await?;

        // Spawn browser handler
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("chromium handler event error: {}", e);
                }
            }
        });

        let page = browser.new_page("about:blank").await?;
        tracing::debug!("Browser launched (headless: {})", config.headless);

        Ok(Self {
            browser,
            page,
            handler,
            navigation_timeout: Duration::from_secs(config.navigation_timeout_secs),
        })
    }

    /// Close the browser and wait for the process to exit
    pub async fn close(mut self) -> Result<()> {
        self.browser.close().await?;
        self.browser.wait().await.map_err(|e| {
            BrowserError::ChromiumError(format!("waiting for browser exit: {e}"))
        })?;
        self.handler.abort();
        tracing::debug!("Browser closed");
        Ok(())
    }

    async fn eval_bool(&self, script: String) -> Result<bool> {
        self.page
            .evaluate(script)
            .await?
            .into_value::<bool>()
            .map_err(|e| BrowserError::ChromiumError(format!("unexpected script result: {e}")))
    }

    async fn is_visible(&self, selector: &Selector) -> Result<bool> {
        self.eval_bool(selector.js_is_visible()).await
    }
}

/// Run `probe` every [`VISIBILITY_POLL`] until it reports `true` or
/// `timeout_ms` elapses.
///
/// A failed probe counts as "not visible yet": script evaluation fails while
/// the console tears down its execution context during a re-render.
async fn poll_until_visible<F, Fut>(
    selector: &str,
    timeout_ms: u64,
    mut probe: F,
) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let deadline = Instant::now() + Duration::from_millis(timeout_ms);

    loop {
        match probe().await {
            Ok(true) => return Ok(()),
            Ok(false) => {}
            Err(e) => tracing::trace!("visibility check for {} failed: {}", selector, e),
        }
        if Instant::now() >= deadline {
            return Err(BrowserError::Timeout(format!(
                "{selector} not visible after {timeout_ms} ms"
            )));
        }
        tokio::time::sleep(VISIBILITY_POLL).await;
    }
}

impl Drop for BrowserEngine {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

#[async_trait::async_trait]
impl BrowserActions for BrowserEngine {
    async fn navigate(&self, url: &str) -> Result<()> {
        tracing::debug!("Navigating to {}", url);
        tokio::time::timeout(self.navigation_timeout, self.page.goto(url))
            .await
            .map_err(|_| BrowserError::Timeout(format!("navigation to {url}")))?
            .map_err(|e| BrowserError::NavigationError(e.to_string()))?;
        Ok(())
    }

    async fn fill_field(&self, selector: &str, value: &str) -> Result<()> {
        if self.eval_bool(Selector::parse(selector).js_fill(value)).await? {
            Ok(())
        } else {
            Err(BrowserError::SelectorNotFound(selector.to_string()))
        }
    }

    async fn click(&self, selector: &str) -> Result<()> {
        if self.eval_bool(Selector::parse(selector).js_click()).await? {
            Ok(())
        } else {
            Err(BrowserError::SelectorNotFound(selector.to_string()))
        }
    }

    async fn wait_for_selector(&self, selector: &str, timeout_ms: u64) -> Result<()> {
        let parsed = Selector::parse(selector);
        poll_until_visible(selector, timeout_ms, || self.is_visible(&parsed)).await
    }

    async fn extract_text(&self, selector: &str) -> Result<String> {
        self.page
            .evaluate(Selector::parse(selector).js_text())
            .await?
            .into_value::<Option<String>>()
            .map_err(|e| BrowserError::ChromiumError(format!("unexpected script result: {e}")))?
            .ok_or_else(|| BrowserError::SelectorNotFound(selector.to_string()))
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        let png = self
            .page
            .screenshot(ScreenshotParams::builder().full_page(true).build())
            .await?;
        Ok(png)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_failed_checks_are_retried_within_attempt() {
        let calls = AtomicU32::new(0);
        poll_until_visible("text=Sign In", 1000, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(BrowserError::ChromiumError(
                        "Execution context was destroyed".to_string(),
                    ))
                } else {
                    Ok(true)
                }
            }
        })
        .await
        .expect("visible after re-render");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_persistent_failure_times_out() {
        let err = poll_until_visible(".login-username", 1000, || async {
            Err(BrowserError::ChromiumError("target closed".to_string()))
        })
        .await
        .unwrap_err();
        assert!(matches!(err, BrowserError::Timeout(s) if s.contains(".login-username")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hidden_element_times_out() {
        let calls = AtomicU32::new(0);
        let err = poll_until_visible("#launch-dropdown", 1000, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(false) }
        })
        .await
        .unwrap_err();
        assert!(matches!(err, BrowserError::Timeout(_)));
        // polled every 100 ms until the deadline
        assert!(calls.load(Ordering::SeqCst) >= 10);
    }
}
