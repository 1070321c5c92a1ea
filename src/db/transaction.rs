//! Explicit transactions for mutating requests.
//!
//! A mutation opens a [`DbTransaction`] on a pooled connection, runs its
//! statements, then reaches exactly one terminal state through
//! [`DbTransaction::finish`]. A transaction dropped without either (client
//! disconnect, panic) is rolled back by sqlx when the connection returns to
//! the pool.

use crate::db::pool::DbPool;
use crate::error::{BeanError, BeanResult};
use crate::models::DatabaseType;
use sqlx::{Postgres, Sqlite, Transaction};
use tracing::{debug, warn};

/// Database-specific transaction wrapper.
pub enum DbTransaction {
    /// PostgreSQL transaction
    Postgres(Transaction<'static, Postgres>),
    /// SQLite transaction
    SQLite(Transaction<'static, Sqlite>),
}

impl DbTransaction {
    /// Check out a connection and issue `BEGIN`.
    pub async fn begin(pool: &DbPool) -> BeanResult<Self> {
        let tx = crate::impl_db_dispatch!(pool, {
            Postgres(p) => DbTransaction::Postgres(p.begin().await.map_err(BeanError::from)?),
            SQLite(p) => DbTransaction::SQLite(p.begin().await.map_err(BeanError::from)?),
        });
        debug!(db_type = %tx.db_type(), "Transaction started");
        Ok(tx)
    }

    /// Get the database type for this transaction.
    pub fn db_type(&self) -> DatabaseType {
        match self {
            DbTransaction::Postgres(_) => DatabaseType::PostgreSQL,
            DbTransaction::SQLite(_) => DatabaseType::SQLite,
        }
    }

    /// Commit the transaction.
    pub async fn commit(self) -> BeanResult<()> {
        crate::impl_tx_dispatch!(self, {
            Postgres(tx) => tx.commit().await.map_err(BeanError::from),
            SQLite(tx) => tx.commit().await.map_err(BeanError::from),
        })?;
        debug!("Transaction committed");
        Ok(())
    }

    /// Rollback the transaction.
    pub async fn rollback(self) -> BeanResult<()> {
        crate::impl_tx_dispatch!(self, {
            Postgres(tx) => tx.rollback().await.map_err(BeanError::from),
            SQLite(tx) => tx.rollback().await.map_err(BeanError::from),
        })?;
        debug!("Transaction rolled back");
        Ok(())
    }

    /// Commit when `result` is `Ok`, roll back otherwise.
    ///
    /// The original error wins over a failed rollback; the rollback failure is
    /// only logged.
    pub async fn finish<T>(self, result: BeanResult<T>) -> BeanResult<T> {
        match result {
            Ok(value) => {
                self.commit().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = self.rollback().await {
                    warn!(error = %rollback_err, "Rollback failed");
                }
                Err(err)
            }
        }
    }
}

impl std::fmt::Debug for DbTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("DbTransaction").field(&self.db_type()).finish()
    }
}
