//! Mission to Mars scraper.
//!
//! Harvests the latest Mars news teaser, the featured gallery image, the
//! Mars/Earth facts table and the four hemisphere images into one
//! [`ScrapeRecord`](models::ScrapeRecord), stored as a single Postgres document
//! and rendered by a small axum front end.

pub mod api;
pub mod browser;
pub mod config;
pub mod crawler;
pub mod db;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod models;
pub mod render;
pub mod scheduler;
