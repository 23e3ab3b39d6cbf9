use std::sync::Arc;
use std::time::Duration;

use headless_chrome::util::Wait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use tracing::debug;

use super::Driver;
use crate::error::NavError;

/// A Chrome process with one tab. The process is killed when this is dropped.
pub struct ChromeDriver {
    // Held for the tab's lifetime; dropping it ends the process.
    _browser: Browser,
    tab: Arc<Tab>,
}

impl ChromeDriver {
    /// `idle_timeout` must outlast the longest stretch without page events,
    /// such as a publication fetch, or the connection to Chrome is dropped.
    pub fn launch(headless: bool, idle_timeout: Duration) -> Result<Self, NavError> {
        let options = LaunchOptions::default_builder()
            .headless(headless)
            .idle_browser_timeout(idle_timeout)
            .build()
            .map_err(|e| NavError::Browser(e.to_string()))?;
        let browser = Browser::new(options).map_err(browser_error)?;
        let tab = browser.new_tab().map_err(browser_error)?;
        debug!(headless, ?idle_timeout, "Chrome launched");
        Ok(Self {
            _browser: browser,
            tab,
        })
    }
}

impl Driver for ChromeDriver {
    fn goto(&mut self, url: &str) -> Result<(), NavError> {
        self.tab
            .navigate_to(url)
            .and_then(|tab| tab.wait_until_navigated())
            .map_err(browser_error)?;
        Ok(())
    }

    fn click_link(&mut self, text: &str, timeout: Duration) -> Result<(), NavError> {
        let what = format!("link containing {:?}", text);
        let xpath = format!("//a[contains(normalize-space(.), {})]", xpath_literal(text));
        let link = self
            .tab
            .wait_for_xpath_with_custom_timeout(&xpath, timeout)
            .map_err(|e| wait_error(e, what, timeout))?;
        link.click().map_err(browser_error)?;
        Ok(())
    }

    fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<(), NavError> {
        self.tab
            .wait_for_element_with_custom_timeout(selector, timeout)
            .map_err(|e| wait_error(e, format!("element {:?}", selector), timeout))?;
        Ok(())
    }

    fn back(&mut self, timeout: Duration) -> Result<(), NavError> {
        // `wait_until_navigated` only tracks `navigate_to`, so a script-driven
        // traversal is detected by the URL changing.
        let before = self.tab.get_url();
        self.tab
            .evaluate("window.history.back()", false)
            .map_err(browser_error)?;
        Wait::with_timeout(timeout)
            .until(|| (self.tab.get_url() != before).then_some(()))
            .map_err(|_| NavError::Timeout {
                what: format!("history to leave {}", before),
                after: timeout,
            })?;
        self.tab.wait_until_navigated().map_err(browser_error)?;
        Ok(())
    }

    fn current_url(&self) -> Result<String, NavError> {
        Ok(self.tab.get_url())
    }
}

fn browser_error(err: anyhow::Error) -> NavError {
    NavError::Browser(err.to_string())
}

fn wait_error(err: anyhow::Error, what: String, after: Duration) -> NavError {
    if err.downcast_ref::<headless_chrome::util::Timeout>().is_some() {
        NavError::Timeout { what, after }
    } else {
        browser_error(err)
    }
}

/// Quote `text` as an XPath 1.0 string literal. XPath has no escapes, so
/// text holding both quote kinds is spliced with `concat()`.
fn xpath_literal(text: &str) -> String {
    if !text.contains('"') {
        format!("\"{}\"", text)
    } else if !text.contains('\'') {
        format!("'{}'", text)
    } else {
        let parts: Vec<String> = text.split('"').map(|p| format!("\"{}\"", p)).collect();
        format!("concat({})", parts.join(", '\"', "))
    }
}

#[cfg(test)]
mod tests {
    use super::xpath_literal;

    #[test]
    fn plain_text_uses_double_quotes() {
        assert_eq!(xpath_literal("Kowalski"), "\"Kowalski\"");
    }

    #[test]
    fn apostrophe_is_kept_inside_double_quotes() {
        assert_eq!(xpath_literal("O'Brien"), "\"O'Brien\"");
    }

    #[test]
    fn double_quote_switches_to_single_quotes() {
        assert_eq!(xpath_literal("say \"hi\""), "'say \"hi\"'");
    }

    #[test]
    fn both_quotes_use_concat() {
        assert_eq!(
            xpath_literal("a\"b'c"),
            "concat(\"a\", '\"', \"b'c\")"
        );
    }
}
