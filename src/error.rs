use thiserror::Error;

/// Why a single field could not be extracted.
///
/// These never escape an extractor on their own; they are logged and the
/// field becomes absent.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("element not found: {0}")]
    MissingElement(String),

    #[error("expected more than {index} elements matching `{selector}`, found {found}")]
    NotEnoughElements {
        selector: String,
        index: usize,
        found: usize,
    },

    #[error("malformed facts table: {0}")]
    MalformedTable(String),
}
