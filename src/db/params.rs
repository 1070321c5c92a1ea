//! Parameter binding utilities for database queries.
//!
//! This module turns a statement's `QueryParam` list into driver-specific
//! argument buffers. Nullable values are encoded with their column type so
//! PostgreSQL never has to guess the type of a NULL placeholder.

use crate::error::{BeanError, BeanResult};
use crate::models::QueryParam;
use sqlx::Arguments;
use sqlx::postgres::PgArguments;
use sqlx::sqlite::SqliteArguments;

fn bind_error(param: &QueryParam, error: sqlx::error::BoxDynError) -> BeanError {
    BeanError::internal(format!(
        "Failed to bind {} parameter: {}",
        param.type_name(),
        error
    ))
}

/// Build PostgreSQL arguments for a statement.
pub(crate) fn postgres_arguments(params: &[QueryParam]) -> BeanResult<PgArguments> {
    let mut args = PgArguments::default();
    for param in params {
        let added = match param {
            QueryParam::Int(v) => Arguments::add(&mut args, *v),
            QueryParam::Float(v) => Arguments::add(&mut args, *v),
            QueryParam::Text(v) => Arguments::add(&mut args, v.clone()),
            QueryParam::Timestamp(v) => Arguments::add(&mut args, *v),
        };
        added.map_err(|e| bind_error(param, e))?;
    }
    Ok(args)
}

/// Build SQLite arguments for a statement.
pub(crate) fn sqlite_arguments<'q>(params: &[QueryParam]) -> BeanResult<SqliteArguments<'q>> {
    let mut args = SqliteArguments::default();
    for param in params {
        let added = match param {
            QueryParam::Int(v) => Arguments::add(&mut args, *v),
            QueryParam::Float(v) => Arguments::add(&mut args, *v),
            QueryParam::Text(v) => Arguments::add(&mut args, v.clone()),
            QueryParam::Timestamp(v) => Arguments::add(&mut args, *v),
        };
        added.map_err(|e| bind_error(param, e))?;
    }
    Ok(args)
}
