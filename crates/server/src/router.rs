//! HTTP router construction.
//!
//! Assembles all Axum routes, middleware, and OpenAPI docs into a single `Router`.

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::middleware;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use adwatch_core::config::ServerConfig;

use crate::api::doc::ApiDoc;
use crate::state::AppState;
use crate::{api, execute};

/// Build the complete application router with all routes and middleware.
///
/// Detector routes are mounted under `server.base_path` behind the
/// disabled guard.
pub fn build_router(state: Arc<AppState>, server: &ServerConfig) -> Router {
    let base = server.base_path.as_str();

    let detectors = Router::new()
        .route(&format!("{}/preview", base), post(execute::preview_inline))
        .route(&format!("{}/{{detector_id}}/preview", base), post(execute::preview_detector))
        .route(&format!("{}/{{detector_id}}/run", base), post(execute::run_detector))
        .route_layer(middleware::from_fn_with_state(state.clone(), execute::require_enabled));

    Router::new()
        .route("/health", get(api::health))
        .route("/_settings", get(api::get_settings).put(api::update_settings))
        .merge(detectors)
        .route("/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .layer(cors_layer(&server.cors_origin))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
}

fn cors_layer(origin: &str) -> CorsLayer {
    if origin == "*" {
        return CorsLayer::permissive();
    }
    match HeaderValue::from_str(origin) {
        Ok(value) => CorsLayer::permissive().allow_origin(AllowOrigin::exact(value)),
        Err(e) => {
            tracing::warn!(origin = %origin, error = %e, "Invalid CORS origin, allowing any");
            CorsLayer::permissive()
        }
    }
}
