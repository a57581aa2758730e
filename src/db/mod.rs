pub mod migrate;

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::PgExecutor;

use crate::error::AppResult;
use crate::models::Item;

/// Also used verbatim as the `query` label on `db_query_duration_seconds`.
pub const ITEMS_QUERY: &str = "SELECT id, name, price FROM items";

pub async fn connect(options: PgConnectOptions) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new().connect_with(options).await
}

/// All items in the store's scan order.
pub async fn fetch_all_items<'e, E>(executor: E) -> AppResult<Vec<Item>>
where
    E: PgExecutor<'e>,
{
    let items = sqlx::query_as::<_, Item>(ITEMS_QUERY)
        .fetch_all(executor)
        .await?;
    Ok(items)
}

/// Connections currently checked out of the pool.
pub fn active_connections(pool: &PgPool) -> i64 {
    (pool.size() as usize).saturating_sub(pool.num_idle()) as i64
}
