use crate::error::Result;

/// Browser actions for automation
#[async_trait::async_trait]
pub trait BrowserActions: Send + Sync {
    /// Navigate to a URL
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Fill a form field by selector
    async fn fill_field(&self, selector: &str, value: &str) -> Result<()>;

    /// Click an element by selector
    async fn click(&self, selector: &str) -> Result<()>;

    /// Wait for a selector to become visible, failing with
    /// [`BrowserError::Timeout`](crate::BrowserError::Timeout) after `timeout_ms`
    async fn wait_for_selector(&self, selector: &str, timeout_ms: u64) -> Result<()>;

    /// Extract the rendered text of an element
    async fn extract_text(&self, selector: &str) -> Result<String>;

    /// Take a PNG screenshot of the page
    async fn screenshot(&self) -> Result<Vec<u8>>;
}

/// A parsed element selector.
///
/// Plain strings are CSS selectors. A `text=` prefix selects the innermost
/// element whose whitespace-normalized, trimmed text equals the rest; the
/// web console exposes several controls only by their label.
///
/// When several elements match, a visible one wins over document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// CSS selector
    Css(String),
    /// Exact text match
    Text(String),
}

/// JavaScript predicate for a rendered element.
const JS_VISIBLE: &str = r"el => {
        const rect = el.getBoundingClientRect();
        const style = window.getComputedStyle(el);
        return rect.width > 0 && rect.height > 0 && style.visibility !== 'hidden' && style.display !== 'none';
    }";

impl Selector {
    /// Parse a selector string.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.strip_prefix("text=") {
            Some(text) => Self::Text(text.split_whitespace().collect::<Vec<_>>().join(" ")),
            None => Self::Css(raw.to_string()),
        }
    }

    /// JavaScript expression evaluating to every matching element.
    fn js_candidates(&self) -> String {
        match self {
            Self::Css(css) => format!("Array.from(document.querySelectorAll({}))", js_string(css)),
            Self::Text(text) => format!(
                r"(() => {{
        const needle = {};
        const skip = ['SCRIPT', 'STYLE', 'NOSCRIPT', 'TEMPLATE'];
        const norm = el => (el.textContent || '').replace(/\s+/g, ' ').trim();
        const matches = el => !skip.includes(el.tagName) && norm(el) === needle;
        return Array.from(document.querySelectorAll('body *'))
            .filter(matches)
            .filter(el => !Array.from(el.children).some(matches));
    }})()",
                js_string(text)
            ),
        }
    }

    /// JavaScript expression evaluating to the element or `null`.
    #[must_use]
    pub fn js_lookup(&self) -> String {
        format!(
            r"(() => {{
    const visible = {JS_VISIBLE};
    const candidates = {};
    return candidates.find(visible) || candidates[0] || null;
}})()",
            self.js_candidates()
        )
    }

    /// Script returning whether the element exists and is rendered.
    #[must_use]
    pub fn js_is_visible(&self) -> String {
        format!(
            r"(() => {{
    const visible = {JS_VISIBLE};
    return {}.some(visible);
}})()",
            self.js_candidates()
        )
    }

    /// Script clicking the element; evaluates to `false` if it is missing.
    #[must_use]
    pub fn js_click(&self) -> String {
        format!(
            r"(() => {{
    const el = {};
    if (!el) return false;
    el.scrollIntoView({{ block: 'center' }});
    el.click();
    return true;
}})()",
            self.js_lookup()
        )
    }

    /// Script replacing the element's value and firing input events;
    /// evaluates to `false` if it is missing.
    #[must_use]
    pub fn js_fill(&self, value: &str) -> String {
        format!(
            r"(() => {{
    const el = {};
    if (!el) return false;
    el.focus();
    el.value = {};
    el.dispatchEvent(new Event('input', {{ bubbles: true }}));
    el.dispatchEvent(new Event('change', {{ bubbles: true }}));
    return true;
}})()",
            self.js_lookup(),
            js_string(value)
        )
    }

    /// Script returning the element's rendered text, or `null` if missing.
    #[must_use]
    pub fn js_text(&self) -> String {
        format!(
            r"(() => {{
    const el = {};
    return el ? (el.innerText || el.textContent || '') : null;
}})()",
            self.js_lookup()
        )
    }
}

/// Quote a string as a JavaScript literal.
fn js_string(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}
