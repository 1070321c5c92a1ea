//! Database dispatch macros for reducing code duplication.
//!
//! This module provides declarative macros that generate backend-specific
//! match arms for the pool and transaction enums while keeping call sites
//! linear. The macros expand at compile time with zero runtime overhead.

/// Macro for generating `DbPool` dispatch match arms.
///
/// # Example
///
/// ```ignore
/// impl_db_dispatch!(pool, {
///     Postgres(p) => do_postgres(p),
///     SQLite(p) => do_sqlite(p),
/// });
/// ```
#[macro_export]
macro_rules! impl_db_dispatch {
    ($pool:expr, { $($variant:ident($p:ident) => $body:expr),+ $(,)? }) => {
        match $pool {
            $(
                $crate::db::pool::DbPool::$variant($p) => $body,
            )+
        }
    };
}

/// Macro for generating `DbTransaction` dispatch match arms.
///
/// Same shape as [`impl_db_dispatch!`], matching on an open transaction.
#[macro_export]
macro_rules! impl_tx_dispatch {
    ($tx:expr, { $($variant:ident($t:ident) => $body:expr),+ $(,)? }) => {
        match $tx {
            $(
                $crate::db::transaction::DbTransaction::$variant($t) => $body,
            )+
        }
    };
}
