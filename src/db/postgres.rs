use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;

/// Creates a PostgreSQL connection pool for the product catalog
///
/// The catalog is only read on the recommendation path, so the pool is sized
/// for concurrent requests rather than write throughput. Connection acquisition
/// shares the repository timeout so an exhausted pool fails fast into the
/// fallback chain instead of queueing indefinitely.
pub async fn create_pool(
    database_url: &str,
    max_connections: u32,
    acquire_timeout: Duration,
) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(acquire_timeout)
        .connect(database_url)
        .await?;

    Ok(pool)
}
