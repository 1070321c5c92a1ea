//! Bean endpoints.

use crate::error::{BeanResult, ErrorBody};
use crate::models::{Bean, BeanClass, BeanPatch, BeanSummary, ListParams, NewBean};
use crate::routes::AppState;
use crate::routes::extract::{BeanBody, BeanId, BeanQuery};
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;
use utoipa::ToSchema;

/// `Cache-Control` value sent with single-bean reads.
pub const SINGLE_BEAN_CACHE: &str = "public, max-age=3600";

/// Writable bean fields as documented in the API.
///
/// Bodies are validated field by field, so this type only describes them.
/// Numeric fields also accept numeric strings; `null` clears a value.
#[derive(Debug, ToSchema)]
pub struct BeanInput {
    /// Explicit ID, honoured on create only
    pub id: Option<i64>,
    pub area: Option<f64>,
    pub perimeter: Option<f64>,
    pub major_axis_length: Option<f64>,
    pub minor_axis_length: Option<f64>,
    pub aspect_ratio: Option<f64>,
    pub eccentricity: Option<f64>,
    pub convex_area: Option<f64>,
    pub equiv_diameter: Option<f64>,
    pub extent: Option<f64>,
    pub solidity: Option<f64>,
    pub roundness: Option<f64>,
    pub compactness: Option<f64>,
    pub shape_factor1: Option<f64>,
    pub shape_factor2: Option<f64>,
    pub shape_factor3: Option<f64>,
    pub shape_factor4: Option<f64>,
    /// Required on create, matched case-insensitively
    pub bean_class: Option<BeanClass>,
    /// Expected current version, update only
    pub version: Option<i64>,
}

/// GET / - first 100 beans, id and class only
#[utoipa::path(
    get,
    path = "/",
    tag = "beans",
    responses(
        (status = 200, description = "Bean summaries ordered by ID", body = [BeanSummary]),
        (status = 500, description = "Database error", body = ErrorBody),
    )
)]
pub async fn list_summaries(
    State(state): State<Arc<AppState>>,
) -> BeanResult<Json<Vec<BeanSummary>>> {
    Ok(Json(state.store.list_summaries().await?))
}

/// GET /beans - list beans, optionally filtered and paginated
#[utoipa::path(
    get,
    path = "/beans",
    tag = "beans",
    params(ListParams),
    responses(
        (status = 200, description = "Beans ordered by ID", body = [Bean]),
        (status = 400, description = "Invalid filter or pagination", body = ErrorBody),
        (status = 500, description = "Database error", body = ErrorBody),
    )
)]
pub async fn list_beans(
    State(state): State<Arc<AppState>>,
    BeanQuery(filter): BeanQuery,
) -> BeanResult<Json<Vec<Bean>>> {
    Ok(Json(state.store.list(&filter).await?))
}

/// GET /beans/{id} - fetch one bean
#[utoipa::path(
    get,
    path = "/beans/{id}",
    tag = "beans",
    params(("id" = i64, Path, description = "Bean ID")),
    responses(
        (status = 200, description = "The bean", body = Bean,
            headers(("Cache-Control" = String, description = "public, max-age=3600"))),
        (status = 400, description = "Invalid ID", body = ErrorBody),
        (status = 404, description = "Bean not found", body = ErrorBody),
        (status = 500, description = "Database error", body = ErrorBody),
    )
)]
pub async fn get_bean(
    State(state): State<Arc<AppState>>,
    BeanId(id): BeanId,
) -> BeanResult<impl IntoResponse> {
    let bean = state.store.get(id).await?;
    Ok(([(header::CACHE_CONTROL, SINGLE_BEAN_CACHE)], Json(bean)))
}

/// POST /beans - create a bean
#[utoipa::path(
    post,
    path = "/beans",
    tag = "beans",
    request_body = BeanInput,
    responses(
        (status = 201, description = "Bean created", body = Bean,
            headers(("Location" = String, description = "URL of the new bean"))),
        (status = 400, description = "Invalid field values", body = ErrorBody),
        (status = 409, description = "ID already exists", body = ErrorBody),
        (status = 500, description = "Database error", body = ErrorBody),
    )
)]
pub async fn create_bean(
    State(state): State<Arc<AppState>>,
    BeanBody(body): BeanBody,
) -> BeanResult<impl IntoResponse> {
    let new_bean = NewBean::from_json(&body)?;
    let bean = state.store.create(&new_bean).await?;
    let location = format!("/beans/{}", bean.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(bean)))
}

/// PUT /beans/{id} - update some fields of a bean
#[utoipa::path(
    put,
    path = "/beans/{id}",
    tag = "beans",
    params(("id" = i64, Path, description = "Bean ID")),
    request_body = BeanInput,
    responses(
        (status = 200, description = "Bean updated", body = Bean),
        (status = 400, description = "Invalid ID or field values", body = ErrorBody),
        (status = 404, description = "Bean not found", body = ErrorBody),
        (status = 409, description = "Version mismatch or duplicate data", body = ErrorBody),
        (status = 500, description = "Database error", body = ErrorBody),
    )
)]
pub async fn update_bean(
    State(state): State<Arc<AppState>>,
    BeanId(id): BeanId,
    BeanBody(body): BeanBody,
) -> BeanResult<Json<Bean>> {
    let patch = BeanPatch::from_json(&body)?;
    Ok(Json(state.store.update(id, &patch).await?))
}

/// DELETE /beans/{id} - remove a bean
#[utoipa::path(
    delete,
    path = "/beans/{id}",
    tag = "beans",
    params(("id" = i64, Path, description = "Bean ID")),
    responses(
        (status = 204, description = "Bean deleted"),
        (status = 400, description = "Invalid ID", body = ErrorBody),
        (status = 404, description = "Bean not found", body = ErrorBody),
        (status = 500, description = "Database error", body = ErrorBody),
    )
)]
pub async fn delete_bean(
    State(state): State<Arc<AppState>>,
    BeanId(id): BeanId,
) -> BeanResult<StatusCode> {
    state.store.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Bean routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_summaries))
        .route("/beans", get(list_beans).post(create_bean))
        .route(
            "/beans/{id}",
            get(get_bean).put(update_bean).delete(delete_bean),
        )
}
