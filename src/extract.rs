//! Page-specific field extractors.
//!
//! Each extractor owns one field of the [`ScrapeRecord`](crate::models::ScrapeRecord)
//! and turns its own failures into absence, so one broken page never costs the
//! other fields. The HTML parsing halves are plain functions over markup.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::browser::BrowsingSession;
use crate::crawler::Sites;
use crate::error::ScrapeError;
use crate::fetch::PageFetcher;
use crate::models::{FactRow, FactsTable, HemisphereEntry};

/// Bounded wait for the news list to render before reading it.
pub const NEWS_WAIT: Duration = Duration::from_secs(1);

/// Bounded wait for the lightbox image after clicking the full-image button.
pub const FANCYBOX_WAIT: Duration = Duration::from_secs(1);

/// The hemisphere index always carries four enhanced images.
pub const HEMISPHERE_COUNT: usize = 4;

pub const ENHANCED_LINK_TEXT: &str = "Enhanced";

/// Second `<button>` on the gallery page opens the full-size image.
pub const FULL_IMAGE_BUTTON_INDEX: usize = 1;

static LIST_TEXT: Lazy<Selector> = Lazy::new(|| Selector::parse("div.list_text").unwrap());
static CONTENT_TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("div.content_title").unwrap());
static TEASER_BODY: Lazy<Selector> = Lazy::new(|| Selector::parse("div.article_teaser_body").unwrap());
static FANCYBOX_IMAGE: Lazy<Selector> = Lazy::new(|| Selector::parse("img.fancybox-image").unwrap());
static TABLE: Lazy<Selector> = Lazy::new(|| Selector::parse("table").unwrap());
static TABLE_ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").unwrap());
static HEMISPHERE_TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("h2.title").unwrap());
static LIST_ITEM: Lazy<Selector> = Lazy::new(|| Selector::parse("li").unwrap());
static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());

fn element_text(el: ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

// ============================================================================
// News
// ============================================================================

/// Latest news headline and teaser. Both are absent if either is missing.
pub fn mars_news<S: BrowsingSession + ?Sized>(
    session: &mut S,
    sites: &Sites,
) -> (Option<String>, Option<String>) {
    let html = match load_news_page(session, &sites.news_url) {
        Ok(html) => html,
        Err(e) => {
            warn!(field = "news", error = %e, "News page unavailable");
            return (None, None);
        }
    };

    match parse_news(&html) {
        Ok((title, paragraph)) => {
            debug!(%title, "Extracted news teaser");
            (Some(title), Some(paragraph))
        }
        Err(e) => {
            warn!(field = "news", error = %e, "News teaser not found");
            (None, None)
        }
    }
}

fn load_news_page<S: BrowsingSession + ?Sized>(session: &mut S, url: &str) -> Result<String> {
    session.navigate(url)?;
    // Optional delay; the list renders client-side
    session.wait_for("div.list_text", NEWS_WAIT);
    session.current_html()
}

/// Title and teaser text of the first `div.list_text` container.
pub fn parse_news(html: &str) -> Result<(String, String), ScrapeError> {
    let document = Html::parse_document(html);
    let slide = document
        .select(&LIST_TEXT)
        .next()
        .ok_or_else(|| ScrapeError::MissingElement("div.list_text".into()))?;

    let title = slide
        .select(&CONTENT_TITLE)
        .next()
        .map(element_text)
        .ok_or_else(|| ScrapeError::MissingElement("div.content_title".into()))?;
    let paragraph = slide
        .select(&TEASER_BODY)
        .next()
        .map(element_text)
        .ok_or_else(|| ScrapeError::MissingElement("div.article_teaser_body".into()))?;

    Ok((title, paragraph))
}

// ============================================================================
// Featured image
// ============================================================================

/// Absolute URL of the full-size featured image, opened through the gallery's
/// second button.
pub fn featured_image<S: BrowsingSession + ?Sized>(session: &mut S, sites: &Sites) -> Option<String> {
    let html = match open_full_image(session, &sites.image_gallery_url) {
        Ok(html) => html,
        Err(e) => {
            warn!(field = "featured_image", error = %format!("{:#}", e), "Could not open full-size image");
            return None;
        }
    };

    match parse_fancybox_src(&html) {
        Ok(rel) => Some(format!("{}/{}", sites.image_base(), rel)),
        Err(e) => {
            warn!(field = "featured_image", error = %e, "Featured image not found");
            None
        }
    }
}

fn open_full_image<S: BrowsingSession + ?Sized>(session: &mut S, url: &str) -> Result<String> {
    session.navigate(url)?;
    session
        .click_nth("button", FULL_IMAGE_BUTTON_INDEX)
        .context("full image button")?;
    session.wait_for("img.fancybox-image", FANCYBOX_WAIT);
    session.current_html()
}

/// Relative `src` of the lightbox image, exactly as written in the markup.
pub fn parse_fancybox_src(html: &str) -> Result<String, ScrapeError> {
    let document = Html::parse_document(html);
    document
        .select(&FANCYBOX_IMAGE)
        .next()
        .ok_or_else(|| ScrapeError::MissingElement("img.fancybox-image".into()))?
        .value()
        .attr("src")
        .map(|s| s.to_string())
        .ok_or_else(|| ScrapeError::MissingElement("img.fancybox-image[src]".into()))
}

// ============================================================================
// Facts
// ============================================================================

/// Mars/Earth comparison from the first table on the facts page. Any failure,
/// network or markup, leaves the field absent.
pub fn mars_facts<F: PageFetcher + ?Sized>(fetcher: &F, sites: &Sites) -> Option<FactsTable> {
    let html = match fetcher.fetch_html(&sites.facts_url) {
        Ok(html) => html,
        Err(e) => {
            warn!(field = "facts", url = %sites.facts_url, error = %e, "Facts page fetch failed");
            return None;
        }
    };

    match parse_facts_table(&html) {
        Ok(table) => {
            debug!(rows = table.len(), "Extracted facts table");
            Some(table)
        }
        Err(e) => {
            warn!(field = "facts", error = %e, "Facts table unusable");
            None
        }
    }
}

/// Parse the first `<table>` into `description, Mars, Earth` rows.
///
/// Header rows (inside `<thead>`, or leading rows made only of `<th>`) are
/// dropped. A cell with `colspan` fills every column it spans and short rows
/// are padded with empty cells; the table as a whole must be three columns
/// wide.
pub fn parse_facts_table(html: &str) -> Result<FactsTable, ScrapeError> {
    let document = Html::parse_document(html);
    let table = document
        .select(&TABLE)
        .next()
        .ok_or_else(|| ScrapeError::MissingElement("table".into()))?;

    let mut width = 0;
    let mut body: Vec<Vec<String>> = Vec::new();
    for row in table.select(&TABLE_ROW) {
        if !owned_by(row, table) {
            continue;
        }

        let cells: Vec<ElementRef> = row
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|c| matches!(c.value().name(), "th" | "td"))
            .collect();
        if cells.is_empty() {
            continue;
        }

        let expanded = expand_cells(&cells);
        width = width.max(expanded.len());

        let all_headers = cells.iter().all(|c| c.value().name() == "th");
        if in_thead(row, table) || (body.is_empty() && all_headers) {
            continue;
        }
        body.push(expanded);
    }

    if width != 3 {
        return Err(ScrapeError::MalformedTable(format!(
            "expected 3 columns, table has {}",
            width
        )));
    }
    if body.is_empty() {
        return Err(ScrapeError::MalformedTable("no data rows".into()));
    }

    let rows = body
        .into_iter()
        .map(|mut cells| {
            cells.resize(3, String::new());
            let earth = cells.pop().unwrap_or_default();
            let mars = cells.pop().unwrap_or_default();
            let description = cells.pop().unwrap_or_default();
            FactRow {
                description,
                mars,
                earth,
            }
        })
        .collect();
    Ok(FactsTable { rows })
}

/// Cell texts with each cell repeated across the columns it spans.
fn expand_cells(cells: &[ElementRef]) -> Vec<String> {
    let mut out = Vec::new();
    for cell in cells {
        let span = cell
            .value()
            .attr("colspan")
            .and_then(|s| s.trim().parse::<usize>().ok())
            .unwrap_or(1)
            .max(1);
        let text = element_text(*cell);
        out.extend(std::iter::repeat(text).take(span));
    }
    out
}

/// Whether `row` belongs to `table` itself rather than a nested table.
fn owned_by(row: ElementRef, table: ElementRef) -> bool {
    row.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|a| a.value().name() == "table")
        .map(|a| a == table)
        .unwrap_or(false)
}

fn in_thead(row: ElementRef, table: ElementRef) -> bool {
    row.ancestors()
        .filter_map(ElementRef::wrap)
        .take_while(|a| *a != table)
        .any(|a| a.value().name() == "thead")
}

// ============================================================================
// Hemispheres
// ============================================================================

/// Title and full-resolution URL for each of the four hemispheres.
///
/// All-or-nothing: any failed iteration fails the whole collection. A failed
/// back step after the last detail page is only logged.
pub fn hemispheres<S: BrowsingSession + ?Sized>(
    session: &mut S,
    sites: &Sites,
) -> Result<Vec<HemisphereEntry>> {
    session
        .navigate(&sites.hemispheres_url)
        .context("hemisphere index")?;

    let base = sites.hemisphere_base();
    let mut entries = Vec::with_capacity(HEMISPHERE_COUNT);

    for index in 0..HEMISPHERE_COUNT {
        // Re-queried every pass: going back reloads the index document
        session
            .click_link_by_partial_text(ENHANCED_LINK_TEXT, index)
            .with_context(|| format!("opening enhanced link {}", index))?;

        let html = session.current_html()?;
        let (title, href) =
            parse_hemisphere_detail(&html).with_context(|| format!("hemisphere detail {}", index))?;

        entries.push(HemisphereEntry {
            title,
            img_url: format!("{}/{}", base, href),
        });

        let back = session
            .go_back()
            .with_context(|| format!("returning from hemisphere {}", index));
        match back {
            Ok(()) => {}
            // Nothing reads the index after the last detail page
            Err(e) if index + 1 == HEMISPHERE_COUNT => {
                warn!(error = %format!("{:#}", e), "Final back navigation failed");
            }
            Err(e) => return Err(e),
        }
    }

    info!(count = entries.len(), "Collected hemisphere images");
    Ok(entries)
}

/// `h2.title` text and the first list item's link target on a detail page.
pub fn parse_hemisphere_detail(html: &str) -> Result<(String, String), ScrapeError> {
    let document = Html::parse_document(html);

    let title = document
        .select(&HEMISPHERE_TITLE)
        .next()
        .map(element_text)
        .ok_or_else(|| ScrapeError::MissingElement("h2.title".into()))?;

    let first_item = document
        .select(&LIST_ITEM)
        .next()
        .ok_or_else(|| ScrapeError::MissingElement("li".into()))?;
    let href = first_item
        .select(&ANCHOR)
        .next()
        .and_then(|a| a.value().attr("href"))
        .ok_or_else(|| ScrapeError::MissingElement("li a[href]".into()))?;

    Ok((title, href.to_string()))
}
