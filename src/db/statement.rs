//! SQL statement construction.
//!
//! Every statement is built from fixed SQL fragments and [`Column`] names.
//! Client-supplied values are appended to `params` and referenced by `$N`
//! placeholders, which both PostgreSQL and SQLite accept.

use crate::models::{BeanFilter, BeanPatch, Column, DatabaseType, NewBean, QueryParam};
use chrono::{DateTime, Utc};

/// Table holding one row per bean sample.
pub const TABLE: &str = "dry_beans";

/// Full projection of a bean row, in `Bean` field order.
pub const BEAN_COLUMNS: &str = "id, area, perimeter, major_axis_length, minor_axis_length, \
    aspect_ratio, eccentricity, convex_area, equiv_diameter, extent, solidity, roundness, \
    compactness, shape_factor1, shape_factor2, shape_factor3, shape_factor4, bean_class, \
    version, created_at, updated_at";

/// SQL text plus its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<QueryParam>,
}

impl Statement {
    fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Append a parameter and return its placeholder.
    fn push(&mut self, param: QueryParam) -> String {
        self.params.push(param);
        format!("${}", self.params.len())
    }

    /// `GET /beans`: optional class filter, optional page.
    pub fn select_list(filter: &BeanFilter) -> Self {
        let mut stmt = Self::new(format!("SELECT {} FROM {}", BEAN_COLUMNS, TABLE));

        if let Some(class) = filter.bean_class {
            let placeholder = stmt.push(QueryParam::Text(Some(class.as_str().to_string())));
            stmt.sql.push_str(&format!(" WHERE bean_class = {}", placeholder));
        }

        stmt.sql.push_str(" ORDER BY id");

        if let Some(page) = filter.page {
            let limit = stmt.push(QueryParam::Int(page.limit as i64));
            let offset = stmt.push(QueryParam::Int(page.offset()));
            stmt.sql
                .push_str(&format!(" LIMIT {} OFFSET {}", limit, offset));
        }

        stmt
    }

    /// `GET /`: the first `limit` rows, id and class only.
    pub fn select_summaries(limit: u32) -> Self {
        let mut stmt = Self::new(format!("SELECT id, bean_class FROM {} ORDER BY id", TABLE));
        let placeholder = stmt.push(QueryParam::Int(limit as i64));
        stmt.sql.push_str(&format!(" LIMIT {}", placeholder));
        stmt
    }

    pub fn select_by_id(id: i64) -> Self {
        let mut stmt = Self::new(format!("SELECT {} FROM {} WHERE id = ", BEAN_COLUMNS, TABLE));
        let placeholder = stmt.push(QueryParam::Int(id));
        stmt.sql.push_str(&placeholder);
        stmt
    }

    /// Current version of a row; used to tell a missing row from a stale one.
    pub fn select_version(id: i64) -> Self {
        let mut stmt = Self::new(format!("SELECT version FROM {} WHERE id = ", TABLE));
        let placeholder = stmt.push(QueryParam::Int(id));
        stmt.sql.push_str(&placeholder);
        stmt
    }

    /// Insert a bean with `version = 1` and both timestamps set to `now`.
    pub fn insert(bean: &NewBean, now: DateTime<Utc>) -> Self {
        let mut stmt = Self::new(String::new());
        let mut columns = Vec::with_capacity(bean.fields().len() + 4);
        let mut values = Vec::with_capacity(bean.fields().len() + 4);

        if let Some(id) = bean.id {
            columns.push("id");
            values.push(stmt.push(QueryParam::Int(id)));
        }
        for (column, value) in bean.fields().iter() {
            columns.push(column.name());
            values.push(stmt.push(value.clone()));
        }

        let timestamp = stmt.push(QueryParam::Timestamp(now));
        columns.extend(["version", "created_at", "updated_at"]);
        values.push("1".to_string());
        values.push(timestamp.clone());
        values.push(timestamp);

        stmt.sql = format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            TABLE,
            columns.join(", "),
            values.join(", "),
            BEAN_COLUMNS
        );
        stmt
    }

    /// Apply a patch, bump `version` and refresh `updated_at`.
    ///
    /// With an expected version the row only matches while it is current.
    pub fn update(id: i64, patch: &BeanPatch, now: DateTime<Utc>) -> Self {
        let mut stmt = Self::new(String::new());
        let mut assignments: Vec<String> = patch
            .fields()
            .iter()
            .map(|(column, value)| format!("{} = {}", column.name(), stmt.push(value.clone())))
            .collect();
        assignments.push("version = version + 1".to_string());
        assignments.push(format!(
            "updated_at = {}",
            stmt.push(QueryParam::Timestamp(now))
        ));

        let mut condition = format!("id = {}", stmt.push(QueryParam::Int(id)));
        if let Some(version) = patch.expected_version {
            condition.push_str(&format!(
                " AND version = {}",
                stmt.push(QueryParam::Int(version))
            ));
        }

        stmt.sql = format!(
            "UPDATE {} SET {} WHERE {} RETURNING {}",
            TABLE,
            assignments.join(", "),
            condition,
            BEAN_COLUMNS
        );
        stmt
    }

    pub fn delete(id: i64) -> Self {
        let mut stmt = Self::new(format!("DELETE FROM {} WHERE id = ", TABLE));
        let placeholder = stmt.push(QueryParam::Int(id));
        stmt.sql.push_str(&placeholder);
        stmt
    }

    /// Move the PostgreSQL identity sequence past an explicitly inserted id.
    ///
    /// The sequence only ever moves forward, so ids of deleted rows are never
    /// handed out again. A transaction-scoped advisory lock serializes the
    /// read of the current value with the `setval`. SQLite tracks the highest
    /// id itself through `AUTOINCREMENT`.
    pub fn sync_identity(db_type: DatabaseType, id: i64) -> Option<Self> {
        match db_type {
            DatabaseType::PostgreSQL => {
                let mut stmt = Self::new(String::new());
                let placeholder = stmt.push(QueryParam::Int(id));
                stmt.sql = format!(
                    "SELECT setval(target.seq,                      GREATEST({id}, COALESCE(pg_sequence_last_value(target.seq), 0)))                      FROM (SELECT pg_get_serial_sequence('{table}', 'id')::regclass AS seq,                      pg_advisory_xact_lock(hashtext('{table}.id')) AS locked) AS target",
                    id = placeholder,
                    table = TABLE
                );
                Some(stmt)
            }
            DatabaseType::SQLite => None,
        }
    }

    /// Database clock and on-disk size.
    pub fn probe(db_type: DatabaseType) -> Self {
        match db_type {
            DatabaseType::PostgreSQL => Self::new(
                "SELECT NOW() AS time, pg_database_size(current_database()) AS db_size",
            ),
            DatabaseType::SQLite => Self::new(
                "SELECT strftime('%Y-%m-%dT%H:%M:%fZ', 'now') AS time, \
                 page_count * page_size AS db_size \
                 FROM pragma_page_count(), pragma_page_size()",
            ),
        }
    }

    pub fn count_all() -> Self {
        Self::new(format!("SELECT COUNT(*) FROM {}", TABLE))
    }

    pub fn count_by_class() -> Self {
        Self::new(format!(
            "SELECT bean_class, COUNT(*) AS count FROM {} GROUP BY bean_class ORDER BY bean_class",
            TABLE
        ))
    }
}

/// Columns written by a statement, for logging.
pub fn column_names<'a>(columns: impl Iterator<Item = &'a Column>) -> String {
    columns.map(Column::name).collect::<Vec<_>>().join(",")
}
