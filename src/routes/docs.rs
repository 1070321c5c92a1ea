//! OpenAPI document and Swagger UI page.

use crate::error::ErrorBody;
use crate::models::{Bean, BeanClass, BeanSummary};
use crate::routes::health::{ConnectionResponse, DbCheckResponse};
use crate::routes::{AppState, beans, health};
use axum::response::Html;
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;
use utoipa::OpenApi;

/// Path of the generated document.
pub const OPENAPI_PATH: &str = "/api-docs/openapi.json";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Dry Beans API",
        description = "CRUD access to the dry beans dataset"
    ),
    paths(
        beans::list_summaries,
        beans::list_beans,
        beans::get_bean,
        beans::create_bean,
        beans::update_bean,
        beans::delete_bean,
        health::test_db,
        health::test_connection,
    ),
    components(schemas(
        Bean,
        BeanClass,
        BeanSummary,
        beans::BeanInput,
        ErrorBody,
        DbCheckResponse,
        ConnectionResponse,
    )),
    tags(
        (name = "beans", description = "Bean records"),
        (name = "health", description = "Connectivity checks"),
    )
)]
pub struct ApiDoc;

const SWAGGER_UI: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <title>Dry Beans API</title>
  <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css" />
</head>
<body>
  <div id="swagger-ui"></div>
  <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js" crossorigin></script>
  <script>
    window.onload = () => {
      window.ui = SwaggerUIBundle({ url: "/api-docs/openapi.json", dom_id: "#swagger-ui" });
    };
  </script>
</body>
</html>
"##;

/// GET /api-docs
async fn swagger_ui() -> Html<&'static str> {
    Html(SWAGGER_UI)
}

/// GET /api-docs/openapi.json
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Documentation routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api-docs", get(swagger_ui))
        .route(OPENAPI_PATH, get(openapi_json))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/",
            "/beans",
            "/beans/{id}",
            "/test-db",
            "/test-connection",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }

    #[test]
    fn test_ui_points_at_document() {
        assert!(SWAGGER_UI.contains(OPENAPI_PATH));
        assert!(SWAGGER_UI.contains(r##"dom_id: "#swagger-ui""##));
        assert!(SWAGGER_UI.trim_end().ends_with("</html>"));
    }

    #[test]
    fn test_document_describes_request_body() {
        let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();
        let input = &doc["components"]["schemas"]["BeanInput"]["properties"];
        for field in ["id", "area", "shape_factor4", "bean_class", "version"] {
            assert!(input[field].is_object(), "missing {}", field);
        }
    }
}
