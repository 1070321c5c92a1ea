//! HTTP route layer.
//!
//! Handlers are stateless over a shared [`AppState`]; they validate path,
//! query and body before calling the store and choose the status codes.

pub mod beans;
pub mod docs;
pub mod extract;
pub mod health;

use crate::db::BeanStore;
use crate::error::ErrorBody;
use axum::extract::DefaultBodyLimit;
use axum::handler::HandlerWithoutStateExt;
use axum::http::{Method, StatusCode, header};
use axum::{Json, Router};
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Maximum accepted request body size.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Shared application state
#[derive(Debug, Clone)]
pub struct AppState {
    pub store: BeanStore,
}

impl AppState {
    pub fn new(store: BeanStore) -> Arc<Self> {
        Arc::new(Self { store })
    }
}

/// Build the application router.
///
/// Paths not matched by the API are served from `static_dir` when given.
/// Anything still unmatched gets a JSON 404.
pub fn router(state: Arc<AppState>, static_dir: Option<&Path>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION]);

    let app = Router::new()
        .merge(beans::router())
        .merge(health::router())
        .merge(docs::router());

    let app = match static_dir {
        Some(dir) => {
            let files = ServeDir::new(dir).not_found_service(not_found.into_service());
            app.fallback_service(files)
        }
        None => app.fallback(not_found),
    };

    app.layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn not_found() -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            error: "Not found".to_string(),
        }),
    )
}
