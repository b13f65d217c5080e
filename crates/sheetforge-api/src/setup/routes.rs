//! Route configuration and setup

use crate::api_doc;
use crate::handlers;
use crate::state::AppState;
use axum::{
    http::{HeaderValue, Method},
    routing::get,
    Json, Router,
};
use sheetforge_core::Config;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Setup all application routes
pub fn build_router(config: &Config, state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/v0/openapi.json", get(serve_openapi))
        .route(
            "/api/v0/gangsheets",
            get(handlers::gangsheets::list_gangsheets).post(handlers::gangsheets::create_gangsheet),
        )
        .route(
            "/api/v0/gangsheets/{id}",
            get(handlers::gangsheets::get_gangsheet).delete(handlers::gangsheets::delete_gangsheet),
        )
        .layer(setup_cors(config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn serve_openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(api_doc::get_openapi_spec())
}

/// Setup CORS configuration
fn setup_cors(config: &Config) -> CorsLayer {
    if config.cors_origins.is_empty() || config.cors_origins.contains(&"*".to_string()) {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers(Any)
    }
}
