//! Database abstraction layer.
//!
//! This module provides database access functionality:
//! - Connection pool management
//! - Statement construction and parameter binding
//! - Statement execution under a timeout
//! - Explicit transactions for mutations
//! - The bean record store and startup bootstrap
//! - Database dispatch macros for reducing code duplication

#[macro_use]
pub mod macros;
pub mod bootstrap;
pub mod executor;
pub mod params;
pub mod pool;
pub mod statement;
pub mod store;
pub mod transaction;

pub use executor::QueryExecutor;
pub use pool::DbPool;
pub use statement::Statement;
pub use store::BeanStore;
pub use transaction::DbTransaction;
