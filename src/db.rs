use anyhow::Result;
use sqlx::{postgres::PgPool, types::Json, Row};

use crate::models::ScrapeRecord;

pub async fn init_db(pool: &PgPool) -> Result<()> {
    // Single-document collection: the CHECK keeps it to one row
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS mars (
            id SMALLINT PRIMARY KEY DEFAULT 1 CHECK (id = 1),
            document JSONB NOT NULL,
            last_modified TIMESTAMPTZ NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Replace the stored document with `record`, creating it on first use.
pub async fn upsert_record(pool: &PgPool, record: &ScrapeRecord) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO mars (id, document, last_modified)
        VALUES (1, $1, $2)
        ON CONFLICT (id) DO UPDATE
        SET document = EXCLUDED.document,
            last_modified = EXCLUDED.last_modified
        "#,
    )
    .bind(Json(record))
    .bind(record.last_modified)
    .execute(pool)
    .await?;

    Ok(())
}

/// The current document, or `None` before the first scrape.
pub async fn load_record(pool: &PgPool) -> Result<Option<ScrapeRecord>> {
    let row = sqlx::query("SELECT document FROM mars WHERE id = 1")
        .fetch_optional(pool)
        .await?;

    Ok(match row {
        Some(row) => {
            let Json(record): Json<ScrapeRecord> = row.try_get("document")?;
            Some(record)
        }
        None => None,
    })
}
