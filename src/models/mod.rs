//! Data models for the Dry Beans API.
//!
//! This module re-exports all model types used throughout the application.

pub mod bean;
pub mod connection;
pub mod fields;
pub mod query;

// Re-export commonly used types
pub use bean::{Bean, BeanClass, BeanStats, BeanSummary, ClassCount, DbProbe, UnknownBeanClass};
pub use connection::{ConnectionTarget, ConnectionTargetError, DatabaseType};
pub use fields::{BeanPatch, Column, FieldSet, NewBean};
pub use query::{BeanFilter, ListParams, MAX_PAGE_LIMIT, Page, QueryParam, SUMMARY_LIMIT};
