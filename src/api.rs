use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    Json,
};
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};
use utoipa::OpenApi;

use crate::browser::ChromeLauncher;
use crate::crawler::MarsCrawler;
use crate::db;
use crate::fetch::HttpFetcher;
use crate::models::{FactRow, FactsTable, HemisphereEntry, ScrapeRecord};
use crate::render;

pub type Crawler = MarsCrawler<ChromeLauncher, HttpFetcher>;

pub struct AppState {
    pub pool: PgPool,
    pub crawler: Arc<Crawler>,
    /// Held for the whole of a refresh so scrape runs never overlap
    pub scrape_lock: Mutex<()>,
}

impl AppState {
    pub fn new(pool: PgPool, crawler: Crawler) -> Self {
        Self {
            pool,
            crawler: Arc::new(crawler),
            scrape_lock: Mutex::new(()),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(get_mars),
    components(schemas(ScrapeRecord, HemisphereEntry, FactsTable, FactRow)),
    tags((name = "mars", description = "Scraped Mars data"))
)]
pub struct ApiDoc;

/// Scrape everything on a blocking thread and replace the stored document.
pub async fn refresh(state: &AppState) -> anyhow::Result<ScrapeRecord> {
    let _running = state.scrape_lock.lock().await;

    let crawler = state.crawler.clone();
    let record = tokio::task::spawn_blocking(move || crawler.scrape_all()).await??;

    db::upsert_record(&state.pool, &record).await?;
    info!(last_modified = %record.last_modified, "Stored fresh Mars document");
    Ok(record)
}

/// Home page built from the stored document.
pub async fn index(State(state): State<Arc<AppState>>) -> Result<Html<String>, StatusCode> {
    let record = db::load_record(&state.pool).await.map_err(|e| {
        error!(error = %e, "Failed to load Mars document");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Html(render::index_page(record.as_ref())))
}

/// Re-scrape, store, then send the browser back home.
pub async fn scrape(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, StatusCode> {
    refresh(&state).await.map_err(|e| {
        error!(error = %format!("{:#}", e), "Scrape request failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok((StatusCode::FOUND, [(header::LOCATION, "/")]))
}

#[utoipa::path(
    get,
    path = "/api/mars",
    tag = "mars",
    responses(
        (status = 200, description = "Current Mars document", body = ScrapeRecord),
        (status = 404, description = "Nothing has been scraped yet")
    )
)]
pub async fn get_mars(State(state): State<Arc<AppState>>) -> Result<Json<ScrapeRecord>, StatusCode> {
    let record = db::load_record(&state.pool)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    match record {
        Some(record) => Ok(Json(record)),
        None => Err(StatusCode::NOT_FOUND),
    }
}
