//! Query-related data models.
//!
//! This module defines bound parameter values and the list filter/pagination
//! types built from `GET /beans` query strings.

use crate::error::{BeanError, BeanResult};
use crate::models::BeanClass;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::IntoParams;

/// Maximum rows per page; larger `limit` values are clamped.
pub const MAX_PAGE_LIMIT: u32 = 1000;

/// Row cap of the root summary listing.
pub const SUMMARY_LIMIT: u32 = 100;

/// A parameter value bound to a statement placeholder.
///
/// Nullable variants carry their SQL type so PostgreSQL can infer the
/// placeholder type even when the value is NULL.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryParam {
    Int(i64),
    Float(Option<f64>),
    Text(Option<String>),
    Timestamp(DateTime<Utc>),
}

impl QueryParam {
    /// Get the type name of this parameter for debugging.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Timestamp(_) => "timestamp",
        }
    }
}

/// Raw `GET /beans` query string.
///
/// Values are kept as strings so malformed numbers surface as JSON validation
/// errors rather than extractor rejections.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// Filter by bean class
    #[param(inline, value_type = Option<BeanClass>)]
    pub bean_class: Option<String>,
    /// Page number, 1-indexed (applied only together with `limit`)
    #[param(value_type = Option<u32>)]
    pub page: Option<String>,
    /// Items per page (applied only together with `page`, max 1000)
    #[param(value_type = Option<u32>)]
    pub limit: Option<String>,
}

/// One page of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// Page number (1-indexed)
    pub page: u32,
    /// Rows per page (1..=MAX_PAGE_LIMIT)
    pub limit: u32,
}

impl Page {
    /// Create a page, rejecting zero and clamping the limit.
    pub fn new(page: u32, limit: u32) -> BeanResult<Self> {
        if page == 0 {
            return Err(BeanError::validation("page must be at least 1"));
        }
        if limit == 0 {
            return Err(BeanError::validation("limit must be at least 1"));
        }
        Ok(Self {
            page,
            limit: limit.min(MAX_PAGE_LIMIT),
        })
    }

    /// Calculate SQL OFFSET value.
    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.limit as i64
    }
}

/// Validated list request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BeanFilter {
    pub bean_class: Option<BeanClass>,
    pub page: Option<Page>,
}

impl BeanFilter {
    /// Filter on class only.
    pub fn by_class(bean_class: BeanClass) -> Self {
        Self {
            bean_class: Some(bean_class),
            page: None,
        }
    }

    /// Restrict to one page.
    pub fn paged(mut self, page: Page) -> Self {
        self.page = Some(page);
        self
    }
}

impl TryFrom<ListParams> for BeanFilter {
    type Error = BeanError;

    /// Empty values count as absent. Pagination applies only when both
    /// `page` and `limit` are present.
    fn try_from(params: ListParams) -> BeanResult<Self> {
        let bean_class = match non_empty(params.bean_class.as_deref()) {
            Some(raw) => Some(raw.parse::<BeanClass>().map_err(|_| {
                BeanError::validation(format!(
                    "bean_class must be one of: {}",
                    BeanClass::expected()
                ))
            })?),
            None => None,
        };

        let page = parse_count(params.page.as_deref(), "page")?;
        let limit = parse_count(params.limit.as_deref(), "limit")?;
        let page = match (page, limit) {
            (Some(page), Some(limit)) => Some(Page::new(page, limit)?),
            _ => None,
        };

        Ok(Self { bean_class, page })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_count(value: Option<&str>, name: &str) -> BeanResult<Option<u32>> {
    non_empty(value)
        .map(|v| {
            v.parse::<u32>()
                .map_err(|_| BeanError::validation(format!("{} must be a positive integer", name)))
        })
        .transpose()
}
