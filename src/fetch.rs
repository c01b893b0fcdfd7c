use anyhow::Result;
use std::time::Duration;
use tracing::debug;

/// Plain HTTP page retrieval for pages that need no browser.
pub trait PageFetcher {
    fn fetch_html(&self, url: &str) -> Result<String>;
}

/// Blocking reqwest fetcher. A client is built per request so it is never
/// created or dropped inside an async runtime.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    pub timeout: Duration,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch_html(&self, url: &str) -> Result<String> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(crate::crawler::random_user_agent())
            .redirect(reqwest::redirect::Policy::limited(10))
            .timeout(self.timeout)
            .build()?;

        let resp = client
            .get(url)
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()?
            .error_for_status()?;

        let html = resp.text()?;
        debug!(%url, bytes = html.len(), "Fetched page");
        Ok(html)
    }
}
