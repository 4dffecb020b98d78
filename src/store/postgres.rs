//! PostgreSQL reading source.

use std::time::Duration;

use anyhow::Result;
use sqlx::{postgres::PgPoolOptions, PgPool};

use super::{schema, ReadingSource};

// ---

#[derive(Debug, Clone)]
pub struct PostgresSource {
    pool: PgPool,
    lookback: Duration,
}

impl PostgresSource {
    /// Connect, then make sure the readings table exists.
    pub async fn connect(db_url: &str, max_connections: u32, lookback: Duration) -> Result<Self> {
        // ---
        tracing::info!("Attempting to connect to database");

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(db_url)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;

        tracing::info!("Successfully connected to database");

        schema::create_schema(&pool).await?;
        Ok(Self::from_pool(pool, lookback))
    }

    pub fn from_pool(pool: PgPool, lookback: Duration) -> Self {
        Self { pool, lookback }
    }
}

impl ReadingSource for PostgresSource {
    async fn fetch_sensor_ids(&self) -> Result<Vec<String>> {
        // ---
        let ids = sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT station_id
            FROM traffic_readings
            ORDER BY station_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    async fn fetch_window(&self, sensor_id: &str, n: usize) -> Result<Vec<f64>> {
        // ---
        let values = sqlx::query_scalar::<_, f64>(
            r#"
            SELECT value
            FROM traffic_readings
            WHERE station_id = $1
              AND recorded_at >= now() - ($2 * interval '1 second')
            ORDER BY recorded_at DESC
            LIMIT $3
            "#,
        )
        .bind(sensor_id)
        .bind(self.lookback.as_secs_f64())
        .bind(i64::try_from(n).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        Ok(values)
    }
}
