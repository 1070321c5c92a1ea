//! Request extractors that reject malformed input with a JSON 400.

use crate::error::BeanError;
use crate::models::{BeanFilter, ListParams};
use axum::Json;
use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::request::Parts;
use serde_json::{Map, Value};

/// A positive bean id taken from the path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeanId(pub i64);

impl<S> FromRequestParts<S> for BeanId
where
    S: Send + Sync,
{
    type Rejection = BeanError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw): Path<String> = Path::from_request_parts(parts, state)
            .await
            .map_err(|_| BeanError::validation("Invalid ID format"))?;

        match raw.trim().parse::<i64>() {
            Ok(id) if id > 0 => Ok(Self(id)),
            _ => Err(BeanError::validation("Invalid ID format")),
        }
    }
}

/// A validated `GET /beans` query string.
#[derive(Debug, Clone, Copy)]
pub struct BeanQuery(pub BeanFilter);

impl<S> FromRequestParts<S> for BeanQuery
where
    S: Send + Sync,
{
    type Rejection = BeanError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(params): Query<ListParams> = Query::from_request_parts(parts, state)
            .await
            .map_err(|e| BeanError::validation(format!("Invalid query string: {}", e.body_text())))?;

        Ok(Self(BeanFilter::try_from(params)?))
    }
}

/// A request body that must be a JSON object.
#[derive(Debug, Clone)]
pub struct BeanBody(pub Map<String, Value>);

impl<S> FromRequest<S> for BeanBody
where
    S: Send + Sync,
{
    type Rejection = BeanError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value): Json<Value> = Json::from_request(req, state)
            .await
            .map_err(|e| BeanError::validation(format!("Invalid JSON body: {}", e.body_text())))?;

        match value {
            Value::Object(map) => Ok(Self(map)),
            _ => Err(BeanError::validation("Request body must be a JSON object")),
        }
    }
}
