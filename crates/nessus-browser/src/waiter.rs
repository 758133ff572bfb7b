//! Element-visibility waiting with a small, bounded retry count.

use crate::actions::BrowserActions;
use crate::error::{BrowserError, Result};

/// Per-attempt wait, in milliseconds.
pub const ATTEMPT_TIMEOUT_MS: u64 = 1000;

/// Default retry budget, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u32 = 5;

/// Block until `selector` is visible on `page`.
///
/// Makes up to `timeout_secs` attempts of [`ATTEMPT_TIMEOUT_MS`] each. Every
/// attempt looks the selector up again rather than reusing an element
/// handle, since handles go stale while the console re-renders. Only
/// timeouts are retried; any other browser error is returned as is. The
/// engine already folds failed lookups within an attempt into its timeout.
pub async fn wait_visible<B>(page: &B, selector: &str, timeout_secs: u32) -> Result<()>
where
    B: BrowserActions + ?Sized,
{
    let mut retries = timeout_secs;

    while retries > 0 {
        match page.wait_for_selector(selector, ATTEMPT_TIMEOUT_MS).await {
            Ok(()) => return Ok(()),
            Err(BrowserError::Timeout(_)) => {
                retries -= 1;
                tracing::trace!("{} not visible yet, {} attempts left", selector, retries);
            }
            Err(e) => return Err(e),
        }
    }

    Err(BrowserError::ElementNotVisible(selector.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Page whose selector becomes visible on the given attempt (1-based).
    struct FakePage {
        visible_on: Option<u32>,
        fail_with_chromium: bool,
        attempts: Mutex<Vec<(String, u64)>>,
    }

    impl FakePage {
        fn new(visible_on: Option<u32>) -> Self {
            Self {
                visible_on,
                fail_with_chromium: false,
                attempts: Mutex::new(Vec::new()),
            }
        }

        fn attempts(&self) -> usize {
            self.attempts.lock().unwrap().len()
        }
    }

    #[async_trait::async_trait]
    impl BrowserActions for FakePage {
        async fn navigate(&self, _url: &str) -> Result<()> {
            Ok(())
        }

        async fn fill_field(&self, _selector: &str, _value: &str) -> Result<()> {
            Ok(())
        }

        async fn click(&self, _selector: &str) -> Result<()> {
            Ok(())
        }

        async fn wait_for_selector(&self, selector: &str, timeout_ms: u64) -> Result<()> {
            let mut attempts = self.attempts.lock().unwrap();
            attempts.push((selector.to_string(), timeout_ms));
            if self.fail_with_chromium {
                return Err(BrowserError::ChromiumError("target closed".to_string()));
            }
            match self.visible_on {
                Some(n) if attempts.len() as u32 >= n => Ok(()),
                _ => Err(BrowserError::Timeout(selector.to_string())),
            }
        }

        async fn extract_text(&self, _selector: &str) -> Result<String> {
            Ok(String::new())
        }

        async fn screenshot(&self) -> Result<Vec<u8>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_never_visible_exhausts_retries() {
        let page = FakePage::new(None);
        let err = wait_visible(&page, "text=Sign In", 5).await.unwrap_err();

        assert!(matches!(err, BrowserError::ElementNotVisible(s) if s == "text=Sign In"));
        assert_eq!(page.attempts(), 5);
        assert!(page
            .attempts
            .lock()
            .unwrap()
            .iter()
            .all(|(sel, ms)| sel == "text=Sign In" && *ms == ATTEMPT_TIMEOUT_MS));
    }

    #[tokio::test]
    async fn test_returns_as_soon_as_visible() {
        let page = FakePage::new(Some(3));
        wait_visible(&page, ".login-username", DEFAULT_TIMEOUT_SECS)
            .await
            .expect("visible on third attempt");
        assert_eq!(page.attempts(), 3);
    }

    #[tokio::test]
    async fn test_zero_timeout_fails_without_polling() {
        let page = FakePage::new(Some(1));
        let err = wait_visible(&page, "#launch-dropdown", 0).await.unwrap_err();
        assert!(matches!(err, BrowserError::ElementNotVisible(_)));
        assert_eq!(page.attempts(), 0);
    }

    #[tokio::test]
    async fn test_non_timeout_errors_propagate() {
        let mut page = FakePage::new(None);
        page.fail_with_chromium = true;
        let err = wait_visible(&page, "#launch-dropdown", 5).await.unwrap_err();
        assert!(matches!(err, BrowserError::ChromiumError(_)));
        assert_eq!(page.attempts(), 1);
    }
}
