//! Browser automation seam.
//!
//! Extractors drive pages through [`BrowsingSession`] so the scrape pipeline can
//! run against headless Chrome in production and canned HTML in tests. A run
//! owns exactly one session, wrapped in a [`SessionGuard`] so it is released
//! whatever happens to the extractors.

use anyhow::{Context, Result};
use headless_chrome::protocol::cdp::Page;
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::ScrapeError;

/// One controlled browser tab, used strictly sequentially.
pub trait BrowsingSession {
    /// Load `url` and block until the navigation settles.
    fn navigate(&mut self, url: &str) -> Result<()>;

    /// Best-effort wait for `selector` to appear. Returns whether it did.
    fn wait_for(&mut self, selector: &str, timeout: Duration) -> bool;

    /// Rendered HTML of the current document.
    fn current_html(&mut self) -> Result<String>;

    /// Click the `index`-th element (document order) matching a CSS selector.
    fn click_nth(&mut self, selector: &str, index: usize) -> Result<()>;

    /// Click the `index`-th link whose visible text contains `text`, then wait
    /// for the resulting navigation.
    fn click_link_by_partial_text(&mut self, text: &str, index: usize) -> Result<()>;

    /// Step back one entry in the session history.
    fn go_back(&mut self) -> Result<()>;

    /// Release the browser. Called once per run by [`SessionGuard`].
    fn close(&mut self) -> Result<()>;
}

/// Opens fresh sessions; one per scrape run.
pub trait SessionLauncher {
    type Session: BrowsingSession;

    fn open(&self, headless: bool) -> Result<Self::Session>;
}

// ============================================================================
// Scoped release
// ============================================================================

/// Owns a session for the length of a run and closes it exactly once, either
/// through [`SessionGuard::close`] or on drop (including while unwinding).
pub struct SessionGuard<S: BrowsingSession> {
    session: S,
    closed: bool,
}

impl<S: BrowsingSession> SessionGuard<S> {
    pub fn new(session: S) -> Self {
        Self { session, closed: false }
    }

    /// Close now and surface the error instead of only logging it.
    pub fn close(mut self) -> Result<()> {
        self.closed = true;
        self.session.close()
    }
}

impl<S: BrowsingSession> Deref for SessionGuard<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.session
    }
}

impl<S: BrowsingSession> DerefMut for SessionGuard<S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut self.session
    }
}

impl<S: BrowsingSession> Drop for SessionGuard<S> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.session.close() {
            warn!(error = %e, "Failed to close browsing session");
        }
    }
}

// ============================================================================
// Headless Chrome
// ============================================================================

/// Launch settings for [`ChromeSession`]
#[derive(Debug, Clone, Default)]
pub struct ChromeLauncher {
    /// Explicit Chrome/Chromium binary; auto-detected when `None`
    pub chrome_path: Option<PathBuf>,
}

impl ChromeLauncher {
    pub fn new(chrome_path: Option<PathBuf>) -> Self {
        Self { chrome_path }
    }
}

impl SessionLauncher for ChromeLauncher {
    type Session = ChromeSession;

    fn open(&self, headless: bool) -> Result<ChromeSession> {
        let user_agent = crate::crawler::random_user_agent();

        let mut args = vec![
            std::ffi::OsStr::new("--disable-blink-features=AutomationControlled"),
            std::ffi::OsStr::new("--no-sandbox"),
            std::ffi::OsStr::new("--disable-dev-shm-usage"),
            std::ffi::OsStr::new("--disable-infobars"),
        ];
        let ua_arg = format!("--user-agent={}", user_agent);
        args.push(std::ffi::OsStr::new(&ua_arg));

        // Modern headless mode goes through args, so the launcher flag stays off
        if headless {
            args.push(std::ffi::OsStr::new("--headless=new"));
        }

        let browser = Browser::new(LaunchOptions {
            headless: false,
            window_size: Some((1920, 1080)),
            path: self.chrome_path.clone(),
            args,
            ..Default::default()
        })
        .context("failed to launch Chrome")?;

        let tab = browser.new_tab().context("failed to open Chrome tab")?;
        debug!(headless, "Chrome session opened");

        Ok(ChromeSession {
            browser: Some(browser),
            tab,
        })
    }
}

pub struct ChromeSession {
    // Dropping the browser kills the Chrome process
    browser: Option<Browser>,
    tab: Arc<Tab>,
}

impl BrowsingSession for ChromeSession {
    fn navigate(&mut self, url: &str) -> Result<()> {
        debug!(%url, "Navigating");
        self.tab.navigate_to(url)?;
        self.tab.wait_until_navigated()?;
        Ok(())
    }

    fn wait_for(&mut self, selector: &str, timeout: Duration) -> bool {
        match self.tab.wait_for_element_with_custom_timeout(selector, timeout) {
            Ok(_) => true,
            Err(e) => {
                debug!(%selector, error = %e, "Selector did not appear in time");
                false
            }
        }
    }

    fn current_html(&mut self) -> Result<String> {
        self.tab.get_content()
    }

    fn click_nth(&mut self, selector: &str, index: usize) -> Result<()> {
        let elements = self.tab.wait_for_elements(selector)?;
        nth_match(&elements, selector, index)?.click()?;
        Ok(())
    }

    fn click_link_by_partial_text(&mut self, text: &str, index: usize) -> Result<()> {
        let xpath = partial_text_xpath(text);
        // Polls until the page has rendered at least one match
        let links = self.tab.wait_for_elements_by_xpath(&xpath)?;
        nth_match(&links, &xpath, index)?.click()?;
        self.tab.wait_until_navigated()?;
        Ok(())
    }

    fn go_back(&mut self) -> Result<()> {
        let history = self.tab.call_method(Page::GetNavigationHistory(None))?;
        let current = history.current_index as usize;
        let previous = current
            .checked_sub(1)
            .and_then(|i| history.entries.get(i))
            .ok_or_else(|| anyhow::anyhow!("no previous history entry to go back to"))?;

        self.tab.call_method(Page::NavigateToHistoryEntry {
            entry_id: previous.id,
        })?;
        self.tab.wait_until_navigated()?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        let Some(browser) = self.browser.take() else {
            return Ok(());
        };
        let result = self.tab.close(false);
        drop(browser);
        debug!("Chrome session closed");
        result.map(|_| ())
    }
}

/// The `index`-th of the elements found for `selector`.
fn nth_match<'a, T>(found: &'a [T], selector: &str, index: usize) -> Result<&'a T, ScrapeError> {
    found.get(index).ok_or_else(|| ScrapeError::NotEnoughElements {
        selector: selector.to_string(),
        index,
        found: found.len(),
    })
}

/// XPath for links whose normalized text contains `text`, in document order.
pub fn partial_text_xpath(text: &str) -> String {
    format!("//a[contains(normalize-space(.), {})]", xpath_literal(text))
}

fn xpath_literal(text: &str) -> String {
    if !text.contains('"') {
        return format!("\"{}\"", text);
    }
    if !text.contains('\'') {
        return format!("'{}'", text);
    }
    // Both quote kinds present: stitch the pieces together with concat()
    let parts: Vec<String> = text
        .split('"')
        .map(|part| format!("\"{}\"", part))
        .collect();
    format!("concat({})", parts.join(", '\"', "))
}
