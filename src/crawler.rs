use anyhow::{Context, Result};
use chrono::Utc;
use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use tracing::{info, warn};

use crate::browser::{SessionGuard, SessionLauncher};
use crate::extract;
use crate::fetch::PageFetcher;
use crate::models::ScrapeRecord;

static USER_AGENTS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Edge/123.0.0.0 Safari/537.36",
    ]
});

pub fn random_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36")
}

// ============================================================================
// Upstream Pages
// ============================================================================

/// The fixed pages a scrape run visits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sites {
    pub news_url: String,
    /// Gallery page; also the base for the relative featured image path
    pub image_gallery_url: String,
    pub facts_url: String,
    /// Hemisphere index; also the base for the detail pages' image links
    pub hemispheres_url: String,
}

impl Default for Sites {
    fn default() -> Self {
        Self {
            news_url: "https://redplanetscience.com".to_string(),
            image_gallery_url: "https://spaceimages-mars.com".to_string(),
            facts_url: "https://galaxyfacts-mars.com".to_string(),
            hemispheres_url: "https://marshemispheres.com".to_string(),
        }
    }
}

impl Sites {
    pub fn image_base(&self) -> &str {
        self.image_gallery_url.trim_end_matches('/')
    }

    pub fn hemisphere_base(&self) -> &str {
        self.hemispheres_url.trim_end_matches('/')
    }
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Runs every extractor in a fixed order against one browsing session.
pub struct MarsCrawler<L, F> {
    launcher: L,
    fetcher: F,
    sites: Sites,
    headless: bool,
}

impl<L: SessionLauncher, F: PageFetcher> MarsCrawler<L, F> {
    pub fn new(launcher: L, fetcher: F) -> Self {
        Self {
            launcher,
            fetcher,
            sites: Sites::default(),
            headless: true,
        }
    }

    pub fn with_sites(mut self, sites: Sites) -> Self {
        self.sites = sites;
        self
    }

    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Scrape every field into a fresh record.
    ///
    /// Only failing to open the session is an error; individual fields come
    /// back absent instead. The session is closed before returning, and on
    /// unwinding if an extractor panics.
    pub fn scrape_all(&self) -> Result<ScrapeRecord> {
        info!(headless = self.headless, "Starting Mars scrape run");

        let session = self
            .launcher
            .open(self.headless)
            .context("failed to open browsing session")?;
        let mut session = SessionGuard::new(session);

        let (news_title, news_paragraph) = extract::mars_news(&mut *session, &self.sites);
        let featured_image = extract::featured_image(&mut *session, &self.sites);
        let facts = extract::mars_facts(&self.fetcher, &self.sites);
        let hemispheres = match extract::hemispheres(&mut *session, &self.sites) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(field = "hemispheres", error = %format!("{:#}", e), "Hemisphere collection failed");
                Vec::new()
            }
        };

        let record = ScrapeRecord {
            news_title,
            news_paragraph,
            featured_image,
            facts,
            hemispheres,
            last_modified: Utc::now(),
        };

        if let Err(e) = session.close() {
            warn!(error = %e, "Browsing session did not close cleanly");
        }

        info!(
            news = record.news_title.is_some(),
            featured_image = record.featured_image.is_some(),
            facts = record.facts.as_ref().map(|f| f.len()).unwrap_or(0),
            hemispheres = record.hemispheres.len(),
            "Scrape run finished"
        );
        Ok(record)
    }
}
