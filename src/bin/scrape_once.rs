use anyhow::Result;

use mars_scraper::browser::ChromeLauncher;
use mars_scraper::config::Config;
use mars_scraper::crawler::MarsCrawler;
use mars_scraper::fetch::HttpFetcher;

/// Run one scrape without touching the database and print the document.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env()?;
    let crawler = MarsCrawler::new(ChromeLauncher::new(config.chrome_path.clone()), HttpFetcher::default())
        .headless(config.headless);

    let record = crawler.scrape_all()?;
    println!("{}", serde_json::to_string_pretty(&record)?);

    Ok(())
}
