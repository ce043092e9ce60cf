//! Postgres pool construction.

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::sync::Arc;

/// Shared handle to the Postgres pool. Cloning is cheap; every service and
/// repository borrows connections from the same pool.
pub type DbPool = Arc<PgPool>;

pub async fn create_pool(database_url: &str) -> anyhow::Result<DbPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;
    Ok(Arc::new(pool))
}
