//! Database schema management for the PostgreSQL reading source.
//!
//! Ensures the readings table and its lookup index exist before the first
//! cycle runs. Applied once on startup from [`super::PostgresSource::connect`].

use anyhow::Result;
use sqlx::PgPool;

// ---

/// Create the readings schema (idempotent).
///
/// Creates the `traffic_readings` table the ingestion side writes into, plus
/// an index matching the "latest readings of one station" query. Safe to call
/// on every startup; no-op if objects already exist.
///
/// Errors are propagated if any SQL execution fails.
pub async fn create_schema(pool: &PgPool) -> Result<()> {
    // ---
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS traffic_readings (
            id          BIGSERIAL PRIMARY KEY,
            station_id  TEXT             NOT NULL,
            recorded_at TIMESTAMPTZ      NOT NULL DEFAULT now(),
            value       DOUBLE PRECISION NOT NULL
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_traffic_readings_station_time
            ON traffic_readings (station_id, recorded_at DESC);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
