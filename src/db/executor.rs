//! Statement execution engine.
//!
//! This module runs [`Statement`]s against the pool or an open transaction:
//! - Parameters are bound from the statement's `QueryParam` list
//! - Every round trip runs under the configured query timeout
//! - Rows decode straight into model types through `sqlx::FromRow`
//!
//! # Architecture
//!
//! The executor uses database-specific implementations organized in submodules:
//! - `postgres`: PostgreSQL fetch and write operations
//! - `sqlite`: SQLite fetch and write operations
//!
//! Each submodule provides identical functionality adapted to the database's type system.
//! They take a plain connection, so the same code serves a connection checked
//! out of the pool and the one held by a transaction.

use crate::db::params::{postgres_arguments, sqlite_arguments};
use crate::db::pool::DbPool;
use crate::db::statement::Statement;
use crate::db::transaction::DbTransaction;
use crate::error::{BeanError, BeanResult};
use sqlx::postgres::PgRow;
use sqlx::sqlite::SqliteRow;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::debug;

/// A row type both backends can decode.
pub trait FromDbRow:
    for<'r> sqlx::FromRow<'r, PgRow> + for<'r> sqlx::FromRow<'r, SqliteRow> + Send + Unpin
{
}

impl<T> FromDbRow for T where
    T: for<'r> sqlx::FromRow<'r, PgRow> + for<'r> sqlx::FromRow<'r, SqliteRow> + Send + Unpin
{
}

/// Executes statements under a timeout.
#[derive(Debug, Clone, Copy)]
pub struct QueryExecutor {
    query_timeout: Duration,
}

impl QueryExecutor {
    /// Create a new query executor.
    pub fn new(query_timeout: Duration) -> Self {
        Self { query_timeout }
    }

    pub fn query_timeout(&self) -> Duration {
        self.query_timeout
    }

    /// Fetch every row of a read statement.
    pub async fn fetch_all<T: FromDbRow>(
        &self,
        pool: &DbPool,
        statement: &Statement,
    ) -> BeanResult<Vec<T>> {
        let start = Instant::now();
        let rows = crate::impl_db_dispatch!(pool, {
            Postgres(p) => {
                let mut conn = p.acquire().await?;
                postgres::fetch_all(&mut conn, statement, self.query_timeout).await?
            },
            SQLite(p) => {
                let mut conn = p.acquire().await?;
                sqlite::fetch_all(&mut conn, statement, self.query_timeout).await?
            },
        });
        log_statement(statement, rows.len() as u64, start);
        Ok(rows)
    }

    /// Fetch at most one row of a read statement.
    pub async fn fetch_optional<T: FromDbRow>(
        &self,
        pool: &DbPool,
        statement: &Statement,
    ) -> BeanResult<Option<T>> {
        let start = Instant::now();
        let row = crate::impl_db_dispatch!(pool, {
            Postgres(p) => {
                let mut conn = p.acquire().await?;
                postgres::fetch_optional(&mut conn, statement, self.query_timeout).await?
            },
            SQLite(p) => {
                let mut conn = p.acquire().await?;
                sqlite::fetch_optional(&mut conn, statement, self.query_timeout).await?
            },
        });
        log_statement(statement, row.is_some() as u64, start);
        Ok(row)
    }

    /// Fetch exactly one row of a read statement.
    pub async fn fetch_one<T: FromDbRow>(
        &self,
        pool: &DbPool,
        statement: &Statement,
    ) -> BeanResult<T> {
        self.fetch_optional(pool, statement)
            .await?
            .ok_or_else(|| BeanError::database("No rows returned", None))
    }

    /// Fetch at most one row inside a transaction.
    pub async fn fetch_optional_in<T: FromDbRow>(
        &self,
        tx: &mut DbTransaction,
        statement: &Statement,
    ) -> BeanResult<Option<T>> {
        let start = Instant::now();
        let row = crate::impl_tx_dispatch!(tx, {
            Postgres(t) => postgres::fetch_optional(&mut **t, statement, self.query_timeout).await?,
            SQLite(t) => sqlite::fetch_optional(&mut **t, statement, self.query_timeout).await?,
        });
        log_statement(statement, row.is_some() as u64, start);
        Ok(row)
    }

    /// Run a write statement inside a transaction and return affected rows.
    pub async fn execute_in(&self, tx: &mut DbTransaction, statement: &Statement) -> BeanResult<u64> {
        let start = Instant::now();
        let rows_affected = crate::impl_tx_dispatch!(tx, {
            Postgres(t) => postgres::execute(&mut **t, statement, self.query_timeout).await?,
            SQLite(t) => sqlite::execute(&mut **t, statement, self.query_timeout).await?,
        });
        log_statement(statement, rows_affected, start);
        Ok(rows_affected)
    }

    /// Run a parameterless, possibly multi-statement SQL script on the pool.
    pub async fn execute_script(&self, pool: &DbPool, sql: &str) -> BeanResult<u64> {
        let result = crate::impl_db_dispatch!(pool, {
            Postgres(p) => {
                timeout(self.query_timeout, sqlx::raw_sql(sql).execute(p))
                    .await
                    .map(|r| r.map(|done| done.rows_affected()))
            },
            SQLite(p) => {
                timeout(self.query_timeout, sqlx::raw_sql(sql).execute(p))
                    .await
                    .map(|r| r.map(|done| done.rows_affected()))
            },
        });

        match result {
            Ok(Ok(rows)) => Ok(rows),
            Ok(Err(e)) => Err(BeanError::from(e)),
            Err(_) => Err(timeout_error("script execution", self.query_timeout)),
        }
    }
}

fn log_statement(statement: &Statement, rows: u64, start: Instant) {
    debug!(
        sql = %statement.sql,
        params = statement.params.len(),
        rows = rows,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Executed statement"
    );
}

fn timeout_error(operation: &str, timeout: Duration) -> BeanError {
    BeanError::timeout(operation, timeout.as_secs())
}

// =============================================================================
// Database-Specific Implementations
// =============================================================================
//
// Each module below provides the same interface adapted to its database type.
// The code structure is intentionally parallel to make differences obvious.

mod postgres {
    use super::*;
    use sqlx::PgConnection;

    pub async fn fetch_all<T: FromDbRow>(
        conn: &mut PgConnection,
        statement: &Statement,
        query_timeout: Duration,
    ) -> BeanResult<Vec<T>> {
        let args = postgres_arguments(&statement.params)?;
        let query = sqlx::query_as_with::<_, T, _>(&statement.sql, args);
        match timeout(query_timeout, query.fetch_all(conn)).await {
            Ok(result) => result.map_err(BeanError::from),
            Err(_) => Err(timeout_error("query execution", query_timeout)),
        }
    }

    pub async fn fetch_optional<T: FromDbRow>(
        conn: &mut PgConnection,
        statement: &Statement,
        query_timeout: Duration,
    ) -> BeanResult<Option<T>> {
        let args = postgres_arguments(&statement.params)?;
        let query = sqlx::query_as_with::<_, T, _>(&statement.sql, args);
        match timeout(query_timeout, query.fetch_optional(conn)).await {
            Ok(result) => result.map_err(BeanError::from),
            Err(_) => Err(timeout_error("query execution", query_timeout)),
        }
    }

    pub async fn execute(
        conn: &mut PgConnection,
        statement: &Statement,
        query_timeout: Duration,
    ) -> BeanResult<u64> {
        let args = postgres_arguments(&statement.params)?;
        let query = sqlx::query_with(&statement.sql, args);
        match timeout(query_timeout, query.execute(conn)).await {
            Ok(Ok(r)) => Ok(r.rows_affected()),
            Ok(Err(e)) => Err(BeanError::from(e)),
            Err(_) => Err(timeout_error("write operation", query_timeout)),
        }
    }
}

mod sqlite {
    use super::*;
    use sqlx::SqliteConnection;

    pub async fn fetch_all<T: FromDbRow>(
        conn: &mut SqliteConnection,
        statement: &Statement,
        query_timeout: Duration,
    ) -> BeanResult<Vec<T>> {
        let args = sqlite_arguments(&statement.params)?;
        let query = sqlx::query_as_with::<_, T, _>(&statement.sql, args);
        match timeout(query_timeout, query.fetch_all(conn)).await {
            Ok(result) => result.map_err(BeanError::from),
            Err(_) => Err(timeout_error("query execution", query_timeout)),
        }
    }

    pub async fn fetch_optional<T: FromDbRow>(
        conn: &mut SqliteConnection,
        statement: &Statement,
        query_timeout: Duration,
    ) -> BeanResult<Option<T>> {
        let args = sqlite_arguments(&statement.params)?;
        let query = sqlx::query_as_with::<_, T, _>(&statement.sql, args);
        match timeout(query_timeout, query.fetch_optional(conn)).await {
            Ok(result) => result.map_err(BeanError::from),
            Err(_) => Err(timeout_error("query execution", query_timeout)),
        }
    }

    pub async fn execute(
        conn: &mut SqliteConnection,
        statement: &Statement,
        query_timeout: Duration,
    ) -> BeanResult<u64> {
        let args = sqlite_arguments(&statement.params)?;
        let query = sqlx::query_with(&statement.sql, args);
        match timeout(query_timeout, query.execute(conn)).await {
            Ok(Ok(r)) => Ok(r.rows_affected()),
            Ok(Err(e)) => Err(BeanError::from(e)),
            Err(_) => Err(timeout_error("write operation", query_timeout)),
        }
    }
}
