use axum::{routing::get, Router};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use mars_scraper::api::{self, ApiDoc, AppState};
use mars_scraper::browser::ChromeLauncher;
use mars_scraper::config::Config;
use mars_scraper::crawler::MarsCrawler;
use mars_scraper::fetch::HttpFetcher;
use mars_scraper::{db, scheduler};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(config.require_database_url()?)
        .await?;

    db::init_db(&pool).await?;

    let crawler = MarsCrawler::new(ChromeLauncher::new(config.chrome_path.clone()), HttpFetcher::default())
        .headless(config.headless);
    let state = Arc::new(AppState::new(pool, crawler));

    // Kept alive for the lifetime of the server
    let _scheduler = match config.scrape_schedule.as_deref() {
        Some(schedule) => Some(scheduler::start(state.clone(), schedule).await?),
        None => None,
    };

    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/", get(api::index))
        .route("/scrape", get(api::scrape))
        .route("/api/mars", get(api::get_mars))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "Listening");
    axum::serve(listener, app).await?;

    Ok(())
}
