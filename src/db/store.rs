//! Record access layer for the `dry_beans` table.
//!
//! Each operation builds one [`Statement`], runs it on a pooled connection
//! and returns decoded rows or a definitive [`BeanError`]. Mutations run in an
//! explicit transaction and commit or roll back before returning.

use crate::db::executor::QueryExecutor;
use crate::db::pool::DbPool;
use crate::db::statement::{Statement, column_names};
use crate::db::transaction::DbTransaction;
use crate::error::{BeanError, BeanResult};
use crate::models::{
    Bean, BeanFilter, BeanPatch, BeanStats, BeanSummary, ClassCount, DatabaseType, DbProbe,
    NewBean, SUMMARY_LIMIT,
};
use chrono::Utc;
use std::time::Duration;
use tracing::{debug, info};

const DUPLICATE_ID: &str = "Bean with this ID already exists";
const DUPLICATE_UPDATE: &str = "Update would create duplicate data";

/// CRUD operations over bean records.
#[derive(Debug, Clone)]
pub struct BeanStore {
    pool: DbPool,
    executor: QueryExecutor,
}

impl BeanStore {
    pub fn new(pool: DbPool, query_timeout: Duration) -> Self {
        Self {
            pool,
            executor: QueryExecutor::new(query_timeout),
        }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub fn db_type(&self) -> DatabaseType {
        self.pool.db_type()
    }

    pub fn executor(&self) -> &QueryExecutor {
        &self.executor
    }

    /// Beans matching `filter`, ordered by id.
    pub async fn list(&self, filter: &BeanFilter) -> BeanResult<Vec<Bean>> {
        let statement = Statement::select_list(filter);
        let beans: Vec<Bean> = self.executor.fetch_all(&self.pool, &statement).await?;
        debug!(
            bean_class = ?filter.bean_class,
            page = ?filter.page.map(|p| p.page),
            rows = beans.len(),
            "Listed beans"
        );
        Ok(beans)
    }

    /// The first rows of the table as `{id, bean_class}` pairs.
    pub async fn list_summaries(&self) -> BeanResult<Vec<BeanSummary>> {
        let statement = Statement::select_summaries(SUMMARY_LIMIT);
        self.executor.fetch_all(&self.pool, &statement).await
    }

    pub async fn get(&self, id: i64) -> BeanResult<Bean> {
        let statement = Statement::select_by_id(id);
        self.executor
            .fetch_optional(&self.pool, &statement)
            .await?
            .ok_or_else(|| BeanError::not_found(id))
    }

    /// Insert a validated bean and return the stored row.
    pub async fn create(&self, bean: &NewBean) -> BeanResult<Bean> {
        let statement = Statement::insert(bean, Utc::now());

        let mut tx = DbTransaction::begin(&self.pool).await?;
        let result = self.insert_in(&mut tx, bean, &statement).await;
        let created = tx.finish(result).await?;

        info!(
            id = created.id,
            bean_class = %created.bean_class,
            columns = %column_names(bean.fields().iter().map(|(c, _)| c)),
            "Bean created"
        );
        Ok(created)
    }

    async fn insert_in(
        &self,
        tx: &mut DbTransaction,
        bean: &NewBean,
        statement: &Statement,
    ) -> BeanResult<Bean> {
        let created: Bean = self
            .executor
            .fetch_optional_in(tx, statement)
            .await
            .map_err(|e| e.on_conflict(DUPLICATE_ID))?
            .ok_or_else(|| BeanError::internal("Insert returned no row"))?;

        if let Some(id) = bean.id {
            if let Some(sync) = Statement::sync_identity(tx.db_type(), id) {
                self.executor.execute_in(tx, &sync).await?;
            }
        }
        Ok(created)
    }

    /// Apply a validated patch and return the updated row.
    ///
    /// When the patch carries an expected version, a row whose version moved
    /// on is reported as a conflict and left untouched.
    pub async fn update(&self, id: i64, patch: &BeanPatch) -> BeanResult<Bean> {
        let statement = Statement::update(id, patch, Utc::now());

        let mut tx = DbTransaction::begin(&self.pool).await?;
        let result = self.update_in(&mut tx, id, patch, &statement).await;
        let updated = tx.finish(result).await?;

        info!(
            id = updated.id,
            version = updated.version,
            columns = %column_names(patch.fields().iter().map(|(c, _)| c)),
            "Bean updated"
        );
        Ok(updated)
    }

    async fn update_in(
        &self,
        tx: &mut DbTransaction,
        id: i64,
        patch: &BeanPatch,
        statement: &Statement,
    ) -> BeanResult<Bean> {
        let updated: Option<Bean> = self
            .executor
            .fetch_optional_in(tx, statement)
            .await
            .map_err(|e| e.on_conflict(DUPLICATE_UPDATE))?;
        if let Some(bean) = updated {
            return Ok(bean);
        }

        // Nothing matched: either the row is gone or its version moved on.
        let current: Option<(i64,)> = self
            .executor
            .fetch_optional_in(tx, &Statement::select_version(id))
            .await?;
        match (current, patch.expected_version) {
            (None, _) => Err(BeanError::not_found(id)),
            (Some((current,)), Some(expected)) => Err(BeanError::conflict(format!(
                "version mismatch: expected {}, current {}",
                expected, current
            ))),
            (Some(_), None) => Err(BeanError::conflict("Bean was modified concurrently")),
        }
    }

    pub async fn delete(&self, id: i64) -> BeanResult<()> {
        let statement = Statement::delete(id);

        let mut tx = DbTransaction::begin(&self.pool).await?;
        let result = match self.executor.execute_in(&mut tx, &statement).await {
            Ok(0) => Err(BeanError::not_found(id)),
            Ok(_) => Ok(()),
            Err(e) => Err(e),
        };
        tx.finish(result).await?;

        info!(id = id, "Bean deleted");
        Ok(())
    }

    /// Database clock and size, for the connectivity check.
    pub async fn probe(&self) -> BeanResult<DbProbe> {
        let statement = Statement::probe(self.db_type());
        self.executor.fetch_one(&self.pool, &statement).await
    }

    /// Row totals overall and per class.
    pub async fn stats(&self) -> BeanResult<BeanStats> {
        let (total,): (i64,) = self
            .executor
            .fetch_one(&self.pool, &Statement::count_all())
            .await?;
        let classes: Vec<ClassCount> = self
            .executor
            .fetch_all(&self.pool, &Statement::count_by_class())
            .await?;
        Ok(BeanStats { total, classes })
    }

    /// Close the underlying pool.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database pool closed");
    }
}
