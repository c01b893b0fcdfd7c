use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

/// Runtime settings, read from the environment (and `.env` when present).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub bind_addr: String,
    pub headless: bool,
    pub chrome_path: Option<PathBuf>,
    /// Six-field cron expression; no periodic scraping when unset
    pub scrape_schedule: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let headless = match non_empty("HEADLESS") {
            Some(raw) => parse_bool(&raw).with_context(|| format!("invalid HEADLESS value: {}", raw))?,
            None => true,
        };

        Ok(Self {
            database_url: non_empty("DATABASE_URL"),
            bind_addr: non_empty("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            headless,
            chrome_path: non_empty("CHROME_PATH").map(PathBuf::from),
            scrape_schedule: non_empty("SCRAPE_SCHEDULE"),
        })
    }

    /// The server cannot run without a database.
    pub fn require_database_url(&self) -> Result<&str> {
        self.database_url
            .as_deref()
            .context("DATABASE_URL must be set")
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
