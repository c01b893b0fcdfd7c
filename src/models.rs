use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ============================================================================
// Aggregate Scrape Document
// ============================================================================

/// Everything one scrape run harvested. Built fresh per run and stored
/// wholesale, replacing the previous document.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct ScrapeRecord {
    /// Headline of the latest news teaser
    pub news_title: Option<String>,
    /// Teaser body of the same news item
    pub news_paragraph: Option<String>,
    /// Absolute URL of the full-size featured image
    pub featured_image: Option<String>,
    /// Mars/Earth comparison table
    pub facts: Option<FactsTable>,
    /// Hemisphere images in page traversal order (empty when collection failed)
    pub hemispheres: Vec<HemisphereEntry>,
    pub last_modified: DateTime<Utc>,
}

/// One enhanced hemisphere image and its caption
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, ToSchema)]
pub struct HemisphereEntry {
    pub title: String,
    pub img_url: String,
}

/// Planetary comparison keyed by the description column.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default, ToSchema)]
pub struct FactsTable {
    pub rows: Vec<FactRow>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, ToSchema)]
pub struct FactRow {
    pub description: String,
    #[serde(rename = "Mars")]
    pub mars: String,
    #[serde(rename = "Earth")]
    pub earth: String,
}

impl FactsTable {
    /// Row keys in table order
    pub fn descriptions(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|r| r.description.as_str())
    }

    pub fn get(&self, description: &str) -> Option<&FactRow> {
        self.rows.iter().find(|r| r.description == description)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
