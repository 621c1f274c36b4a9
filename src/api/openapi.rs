//! OpenAPI document for the HTTP surface.

use axum::Router;
use utoipa::OpenApi;

use super::handlers::{regions, system};
use crate::app_state::AppState;

/// Path of the generated OpenAPI JSON document.
pub const OPENAPI_PATH: &str = "/api-docs/openapi.json";

/// OpenAPI description of every documented endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    info(title = "MQTT Tracker", description = "Region occupancy tracker with an embedded MQTT broker"),
    paths(
        regions::enter_region,
        regions::leave_region,
        system::health_handler,
        system::counters_handler,
    ),
    tags(
        (name = "Regions", description = "Region occupancy counters"),
        (name = "System", description = "Service status"),
    )
)]
pub struct ApiDoc;

/// Serves the OpenAPI document together with Swagger UI at `/swagger-ui`.
#[cfg(feature = "swagger-ui")]
pub fn routes() -> Router<AppState> {
    Router::new().merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui").url(OPENAPI_PATH, ApiDoc::openapi()),
    )
}

/// Serves the OpenAPI document.
#[cfg(not(feature = "swagger-ui"))]
pub fn routes() -> Router<AppState> {
    use axum::Json;
    use axum::routing::get;

    Router::new().route(OPENAPI_PATH, get(|| async { Json(ApiDoc::openapi()) }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_all_paths() {
        let doc = ApiDoc::openapi();
        for path in ["/enter/{id}", "/leave/{id}", "/health", "/api/v1/counters"] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
