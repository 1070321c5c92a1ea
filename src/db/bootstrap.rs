//! Startup database preparation.
//!
//! Runs the embedded schema for the active backend, then an optional operator
//! SQL script, then logs dataset statistics. Only the schema step is fatal.

use crate::db::store::BeanStore;
use crate::error::{BeanError, BeanResult};
use crate::models::DatabaseType;
use std::path::Path;
use tracing::{info, warn};

const POSTGRES_SCHEMA: &str = include_str!("sql/postgres.sql");
const SQLITE_SCHEMA: &str = include_str!("sql/sqlite.sql");

/// Idempotent schema for a backend.
pub fn schema_sql(db_type: DatabaseType) -> &'static str {
    match db_type {
        DatabaseType::PostgreSQL => POSTGRES_SCHEMA,
        DatabaseType::SQLite => SQLITE_SCHEMA,
    }
}

/// Create the table and index when missing.
pub async fn ensure_schema(store: &BeanStore) -> BeanResult<()> {
    let db_type = store.db_type();
    store
        .executor()
        .execute_script(store.pool(), schema_sql(db_type))
        .await?;
    info!(db_type = %db_type, "Schema ready");
    Ok(())
}

/// Execute an operator-supplied SQL script.
pub async fn run_script(store: &BeanStore, path: &Path) -> BeanResult<u64> {
    let sql = tokio::fs::read_to_string(path).await.map_err(|e| {
        BeanError::internal(format!(
            "Failed to read bootstrap script {}: {}",
            path.display(),
            e
        ))
    })?;
    let rows = store.executor().execute_script(store.pool(), &sql).await?;
    info!(script = %path.display(), rows = rows, "Bootstrap script executed");
    Ok(rows)
}

/// Log total rows, distinct classes and per-class counts.
pub async fn log_stats(store: &BeanStore) -> BeanResult<()> {
    let stats = store.stats().await?;
    info!(
        total = stats.total,
        distinct_classes = stats.distinct_classes(),
        "Dataset statistics"
    );
    for class in &stats.classes {
        info!(bean_class = %class.bean_class, count = class.count, "Class count");
    }
    Ok(())
}

/// Full startup sequence.
///
/// A schema failure aborts startup; script and statistics failures are logged.
pub async fn bootstrap(store: &BeanStore, script: Option<&Path>) -> BeanResult<()> {
    ensure_schema(store).await?;

    if let Some(path) = script {
        if let Err(e) = run_script(store, path).await {
            warn!(script = %path.display(), error = %e, "Bootstrap script failed");
        }
    }

    if let Err(e) = log_stats(store).await {
        warn!(error = %e, "Failed to collect dataset statistics");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_is_idempotent_and_checked() {
        for db_type in [DatabaseType::PostgreSQL, DatabaseType::SQLite] {
            let sql = schema_sql(db_type);
            assert!(sql.contains("CREATE TABLE IF NOT EXISTS dry_beans"));
            assert!(sql.contains("CREATE INDEX IF NOT EXISTS"));
            assert!(sql.contains("'BOMBAY'"));
            assert!(sql.contains("version"));
        }
        assert!(schema_sql(DatabaseType::PostgreSQL).contains("GENERATED BY DEFAULT AS IDENTITY"));
        assert!(schema_sql(DatabaseType::SQLite).contains("INTEGER PRIMARY KEY AUTOINCREMENT"));
    }
}
