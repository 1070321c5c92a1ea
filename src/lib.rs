//! Dry Beans API Library
//!
//! This library provides a CRUD REST API over the dry beans dataset, stored in
//! PostgreSQL or SQLite.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod transport;

pub use config::Config;
pub use db::BeanStore;
pub use error::{BeanError, BeanResult};
pub use routes::{AppState, router};
