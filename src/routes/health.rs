//! Connectivity and liveness endpoints.

use crate::routes::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

/// Endpoints advertised by `GET /test-connection`.
pub const ENDPOINTS: [&str; 9] = [
    "GET /",
    "GET /beans",
    "GET /beans/{id}",
    "POST /beans",
    "PUT /beans/{id}",
    "DELETE /beans/{id}",
    "GET /test-db",
    "GET /test-connection",
    "GET /api-docs",
];

/// Result of the database probe.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DbCheckResponse {
    pub success: bool,
    pub message: String,
    /// Database server time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<DateTime<Utc>>,
    /// Database size in bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Liveness response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ConnectionResponse {
    pub success: bool,
    pub message: String,
    pub endpoints: Vec<String>,
}

/// GET /test-db - check the database round trip
#[utoipa::path(
    get,
    path = "/test-db",
    tag = "health",
    responses(
        (status = 200, description = "Database reachable", body = DbCheckResponse),
        (status = 500, description = "Database unreachable", body = DbCheckResponse),
    )
)]
pub async fn test_db(State(state): State<Arc<AppState>>) -> (StatusCode, Json<DbCheckResponse>) {
    match state.store.probe().await {
        Ok(probe) => (
            StatusCode::OK,
            Json(DbCheckResponse {
                success: true,
                message: "Database connection successful".to_string(),
                time: Some(probe.time),
                db_size: Some(probe.db_size),
                error: None,
            }),
        ),
        Err(e) => {
            error!(error = %e, "Database probe failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(DbCheckResponse {
                    success: false,
                    message: "Database connection failed".to_string(),
                    time: None,
                    db_size: None,
                    error: Some(e.public_message()),
                }),
            )
        }
    }
}

/// GET /test-connection - liveness without touching the database
#[utoipa::path(
    get,
    path = "/test-connection",
    tag = "health",
    responses((status = 200, description = "API is running", body = ConnectionResponse))
)]
pub async fn test_connection() -> Json<ConnectionResponse> {
    Json(ConnectionResponse {
        success: true,
        message: "API is running".to_string(),
        endpoints: ENDPOINTS.iter().map(|e| e.to_string()).collect(),
    })
}

/// Health routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/test-db", get(test_db))
        .route("/test-connection", get(test_connection))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connection_lists_endpoints() {
        let Json(body) = test_connection().await;
        assert!(body.success);
        assert_eq!(body.endpoints.len(), ENDPOINTS.len());
        assert!(body.endpoints.iter().any(|e| e == "POST /beans"));
    }

    #[test]
    fn test_db_failure_body_omits_probe_fields() {
        let body = DbCheckResponse {
            success: false,
            message: "Database connection failed".to_string(),
            time: None,
            db_size: None,
            error: Some("Internal server error".to_string()),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["success"], false);
        assert!(json.get("time").is_none());
        assert_eq!(json["error"], "Internal server error");
    }
}
