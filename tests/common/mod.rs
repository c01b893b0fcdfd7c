#![allow(dead_code)]

//! In-memory stand-ins for the browser and the facts fetcher, plus canned
//! upstream pages.

use anyhow::{anyhow, Result};
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use mars_scraper::browser::{BrowsingSession, SessionLauncher};
use mars_scraper::crawler::{MarsCrawler, Sites};
use mars_scraper::fetch::PageFetcher;

pub const NEWS_URL: &str = "https://redplanetscience.com";
pub const GALLERY_URL: &str = "https://spaceimages-mars.com";
pub const FACTS_URL: &str = "https://galaxyfacts-mars.com";
pub const HEMISPHERES_URL: &str = "https://marshemispheres.com";

pub const NEWS_HTML: &str = r#"
<html><body>
  <div id="news">
    <div class="col-md-12">
      <div class="list_text">
        <div class="list_date">February 18, 2021</div>
        <div class="content_title">NASA's Perseverance Rover Lands Safely on Mars</div>
        <div class="article_teaser_body">The agency's latest rover touched down in Jezero Crater after a seven-month journey.</div>
      </div>
      <div class="list_text">
        <div class="content_title">Second story</div>
        <div class="article_teaser_body">Second teaser.</div>
      </div>
    </div>
  </div>
</body></html>
"#;

pub const NEWS_WITHOUT_TEASER_HTML: &str = r#"
<html><body><div id="news"><p>Nothing to see</p></div></body></html>
"#;

pub const GALLERY_HTML: &str = r#"
<html><body>
  <div class="header">
    <button class="btn btn-outline-light">Menu</button>
    <img class="headerimage fade-in" src="image/featured/mars3.jpg">
    <button class="btn btn-outline-light">FULL IMAGE</button>
  </div>
</body></html>
"#;

pub const GALLERY_OPEN_HTML: &str = r#"
<html><body>
  <div class="header">
    <button class="btn btn-outline-light">Menu</button>
    <button class="btn btn-outline-light">FULL IMAGE</button>
  </div>
  <div class="fancybox-container">
    <div class="fancybox-content">
      <img class="fancybox-image" src="image/mars1.jpg" alt="">
    </div>
  </div>
</body></html>
"#;

pub const GALLERY_ONE_BUTTON_HTML: &str = r#"
<html><body><button>FULL IMAGE</button></body></html>
"#;

pub const FACTS_HTML: &str = r#"
<html><body>
  <table class="table">
    <tbody>
      <tr><th>Mars - Earth Comparison</th><th>Mars</th><th>Earth</th></tr>
      <tr><td>Equatorial Diameter</td><td>6,792 km</td><td>12,756 km</td></tr>
      <tr><td>Polar Diameter</td><td>6,752 km</td><td>12,714 km</td></tr>
    </tbody>
  </table>
  <table><tr><td>Second</td><td>table</td><td>ignored</td></tr></table>
</body></html>
"#;

pub const HEMISPHERE_PAGES: [(&str, &str, &str); 4] = [
    ("cerberus.html", "Cerberus Hemisphere Enhanced", "images/cerberus_enhanced.tif_full.jpg"),
    ("schiaparelli.html", "Schiaparelli Hemisphere Enhanced", "images/schiaparelli_enhanced.tif_full.jpg"),
    ("syrtis.html", "Syrtis Major Hemisphere Enhanced", "images/syrtis_major_enhanced.tif_full.jpg"),
    ("valles.html", "Valles Marineris Hemisphere Enhanced", "images/valles_marineris_enhanced.tif_full.jpg"),
];

/// Hemisphere index linking to the first `count` detail pages. Each item has a
/// text-less thumbnail link ahead of its titled link, like the real page.
pub fn hemisphere_index_html(count: usize) -> String {
    let items: String = HEMISPHERE_PAGES
        .iter()
        .take(count)
        .map(|(page, title, _)| {
            format!(
                r#"<div class="item">
  <a href="{page}" class="itemLink product-item"><img class="thumb" src="images/thumb.png"></a>
  <div class="description">
    <a href="{page}" class="itemLink product-item"><h3>{title}</h3></a>
  </div>
</div>
"#
            )
        })
        .collect();
    format!(
        r#"<html><body><div class="collapsible results">{}</div><a href="https://astrogeology.usgs.gov">USGS</a></body></html>"#,
        items
    )
}

pub fn hemisphere_detail_html(title: &str, image: &str) -> String {
    format!(
        r#"<html><body>
  <div class="cover">
    <h2 class="title">{title}</h2>
    <div class="downloads">
      <ul>
        <li><a target="_blank" href="{image}">Sample</a> (jpg) 1024px wide</li>
        <li><a target="_blank" href="images/original.tif">Original</a> (tif)</li>
      </ul>
    </div>
  </div>
  <a href="index.html">Back</a>
</body></html>"#
    )
}

// ============================================================================
// Fake upstream web
// ============================================================================

/// Canned pages keyed by URL, plus the markup a page shows after one of its
/// buttons is clicked.
#[derive(Debug, Clone, Default)]
pub struct FakeWeb {
    pages: HashMap<String, String>,
    after_click: HashMap<String, String>,
}

impl FakeWeb {
    /// Every upstream page in its healthy state.
    pub fn mars() -> Self {
        let mut web = FakeWeb::default()
            .page(NEWS_URL, NEWS_HTML)
            .page(GALLERY_URL, GALLERY_HTML)
            .on_click(GALLERY_URL, GALLERY_OPEN_HTML)
            .page(HEMISPHERES_URL, &hemisphere_index_html(4));
        for (page, title, image) in HEMISPHERE_PAGES {
            web = web.page(
                &format!("{}/{}", HEMISPHERES_URL, page),
                &hemisphere_detail_html(title, image),
            );
        }
        web
    }

    pub fn page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    pub fn on_click(mut self, url: &str, html: &str) -> Self {
        self.after_click.insert(url.to_string(), html.to_string());
        self
    }
}

/// What the crawler did to its sessions.
#[derive(Debug, Default)]
pub struct Recorder {
    pub opens: AtomicUsize,
    pub closes: AtomicUsize,
    pub events: Mutex<Vec<String>>,
}

impl Recorder {
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn log(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Fault {
    /// Panic on the first `go_back`, like a driver crash mid-collection
    PanicOnGoBack,
    /// `navigate` to this URL fails
    Unreachable(String),
    /// The n-th `go_back` of a session (counting from 1) fails
    FailGoBackOn(usize),
}

pub struct FakeLauncher {
    web: Arc<FakeWeb>,
    pub recorder: Arc<Recorder>,
    fault: Option<Fault>,
    fail_open: bool,
}

impl FakeLauncher {
    pub fn new(web: FakeWeb) -> Self {
        Self {
            web: Arc::new(web),
            recorder: Arc::new(Recorder::default()),
            fault: None,
            fail_open: false,
        }
    }

    pub fn with_fault(mut self, fault: Fault) -> Self {
        self.fault = Some(fault);
        self
    }

    pub fn failing_to_open(mut self) -> Self {
        self.fail_open = true;
        self
    }
}

impl SessionLauncher for FakeLauncher {
    type Session = FakeSession;

    fn open(&self, _headless: bool) -> Result<FakeSession> {
        if self.fail_open {
            return Err(anyhow!("chrome binary not found"));
        }
        self.recorder.opens.fetch_add(1, Ordering::SeqCst);
        Ok(FakeSession {
            web: self.web.clone(),
            recorder: self.recorder.clone(),
            fault: self.fault.clone(),
            history: Vec::new(),
            overlay: None,
            backs: 0,
        })
    }
}

pub struct FakeSession {
    web: Arc<FakeWeb>,
    recorder: Arc<Recorder>,
    fault: Option<Fault>,
    history: Vec<String>,
    overlay: Option<String>,
    backs: usize,
}

impl FakeSession {
    fn current_url(&self) -> Result<&str> {
        self.history
            .last()
            .map(|s| s.as_str())
            .ok_or_else(|| anyhow!("no page loaded"))
    }

    fn load(&mut self, url: &str) -> Result<()> {
        if self.fault == Some(Fault::Unreachable(url.to_string())) {
            return Err(anyhow!("net::ERR_NAME_NOT_RESOLVED at {}", url));
        }
        if !self.web.pages.contains_key(url) {
            return Err(anyhow!("404 for {}", url));
        }
        self.history.push(url.to_string());
        self.overlay = None;
        Ok(())
    }

    fn resolve(&self, href: &str) -> Result<String> {
        if href.contains("://") {
            return Ok(href.to_string());
        }
        let current = self.current_url()?;
        let scheme_end = current.find("://").map(|i| i + 3).unwrap_or(0);
        let origin_end = current[scheme_end..]
            .find('/')
            .map(|i| scheme_end + i)
            .unwrap_or(current.len());
        Ok(format!("{}/{}", &current[..origin_end], href.trim_start_matches('/')))
    }
}

impl BrowsingSession for FakeSession {
    fn navigate(&mut self, url: &str) -> Result<()> {
        self.recorder.log(format!("navigate {}", url));
        self.load(url)
    }

    fn wait_for(&mut self, selector: &str, _timeout: Duration) -> bool {
        let Ok(html) = self.current_html() else {
            return false;
        };
        let selector = Selector::parse(selector).unwrap();
        let found = Html::parse_document(&html).select(&selector).next().is_some();
        found
    }

    fn current_html(&mut self) -> Result<String> {
        if let Some(overlay) = &self.overlay {
            return Ok(overlay.clone());
        }
        let url = self.current_url()?;
        Ok(self.web.pages[url].clone())
    }

    fn click_nth(&mut self, selector: &str, index: usize) -> Result<()> {
        let html = self.current_html()?;
        let parsed = Selector::parse(selector).unwrap();
        let document = Html::parse_document(&html);
        let elements: Vec<_> = document.select(&parsed).collect();
        let element = elements
            .get(index)
            .ok_or_else(|| anyhow!("only {} `{}` elements", elements.len(), selector))?;

        let href = element.value().attr("href").map(|s| s.to_string());
        match href {
            Some(href) => {
                let target = self.resolve(&href)?;
                self.recorder.log(format!("click {}", target));
                self.load(&target)
            }
            None => {
                let url = self.current_url()?.to_string();
                self.recorder.log(format!("click {}[{}] on {}", selector, index, url));
                if let Some(next) = self.web.after_click.get(&url) {
                    self.overlay = Some(next.clone());
                }
                Ok(())
            }
        }
    }

    fn click_link_by_partial_text(&mut self, text: &str, index: usize) -> Result<()> {
        let html = self.current_html()?;
        let anchors = Selector::parse("a").unwrap();
        let document = Html::parse_document(&html);
        let hrefs: Vec<String> = document
            .select(&anchors)
            .filter(|a| a.text().collect::<String>().contains(text))
            .filter_map(|a| a.value().attr("href").map(|s| s.to_string()))
            .collect();
        let href = hrefs
            .get(index)
            .ok_or_else(|| anyhow!("only {} links containing {:?}", hrefs.len(), text))?
            .clone();

        let target = self.resolve(&href)?;
        self.recorder.log(format!("click {}", target));
        self.load(&target)
    }

    fn go_back(&mut self) -> Result<()> {
        if self.fault == Some(Fault::PanicOnGoBack) {
            panic!("browser crashed while going back");
        }
        self.backs += 1;
        if self.fault == Some(Fault::FailGoBackOn(self.backs)) {
            return Err(anyhow!("Page.navigateToHistoryEntry timed out"));
        }
        if self.history.len() < 2 {
            return Err(anyhow!("no previous page"));
        }
        self.history.pop();
        self.overlay = None;
        let url = self.current_url()?.to_string();
        self.recorder.log(format!("back {}", url));
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.recorder.closes.fetch_add(1, Ordering::SeqCst);
        self.recorder.log("close".to_string());
        Ok(())
    }
}

// ============================================================================
// Facts fetcher
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct StaticFetcher {
    pages: HashMap<String, String>,
}

impl StaticFetcher {
    pub fn mars() -> Self {
        Self::default().page(FACTS_URL, FACTS_HTML)
    }

    pub fn page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }
}

impl PageFetcher for StaticFetcher {
    fn fetch_html(&self, url: &str) -> Result<String> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("connection refused: {}", url))
    }
}

pub fn crawler(launcher: FakeLauncher, fetcher: StaticFetcher) -> MarsCrawler<FakeLauncher, StaticFetcher> {
    MarsCrawler::new(launcher, fetcher).with_sites(Sites::default())
}
