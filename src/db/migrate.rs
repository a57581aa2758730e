use std::collections::HashSet;
use std::path::Path;

use sqlx::migrate::{Migrate, MigrateError, Migrator};
use sqlx::PgPool;
use tracing::info;

use crate::metrics::Metrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationOutcome {
    Applied(usize),
    NoChange,
}

/// Applies every pending up migration found in `dir`, each in its own
/// transaction under sqlx's advisory lock. sqlx's own checks always run, so a
/// dirty or edited migration is an error even when nothing is pending. Only
/// migrations that were actually applied are added to `db_migrations_total`.
pub async fn run_migrations(
    pool: &PgPool,
    dir: &Path,
    metrics: &Metrics,
) -> Result<MigrationOutcome, MigrateError> {
    let migrator = Migrator::new(dir).await?;

    let before = applied_versions(pool).await?;
    let pending = pending_versions(&migrator, before.iter().copied());
    if !pending.is_empty() {
        info!(count = pending.len(), versions = ?pending, "Applying migrations");
    }

    migrator.run(pool).await?;

    let after = applied_versions(pool).await?;
    let applied = after.difference(&before).count();
    if applied == 0 {
        info!("No pending migrations");
        return Ok(MigrationOutcome::NoChange);
    }

    metrics.record_migrations(applied as u64);
    Ok(MigrationOutcome::Applied(applied))
}

async fn applied_versions(pool: &PgPool) -> Result<HashSet<i64>, MigrateError> {
    let mut conn = pool.acquire().await?;
    conn.ensure_migrations_table().await?;
    let applied = conn.list_applied_migrations().await?;
    Ok(applied.into_iter().map(|m| m.version).collect())
}

/// Up migrations from `migrator` whose version is not in `applied`, in the
/// migrator's (ascending) order.
pub fn pending_versions<I>(migrator: &Migrator, applied: I) -> Vec<i64>
where
    I: IntoIterator<Item = i64>,
{
    let applied: HashSet<i64> = applied.into_iter().collect();
    migrator
        .iter()
        .filter(|m| !m.migration_type.is_down_migration())
        .map(|m| m.version)
        .filter(|v| !applied.contains(v))
        .collect()
}
