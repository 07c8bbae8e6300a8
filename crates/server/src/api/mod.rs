//! Operational API endpoints and shared response types.
//!
//! The detector execution routes live in [`crate::execute`]; this module
//! holds health, live settings, and the OpenAPI aggregator.

pub mod doc;
mod health;
mod settings;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

// ── Shared types ─────────────────────────────────────────────────

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    /// `{ "error": message }` with the given status.
    pub fn respond(status: StatusCode, message: impl Into<String>) -> Response {
        (
            status,
            Json(ErrorResponse {
                error: message.into(),
            }),
        )
            .into_response()
    }
}

// ── Re-exports ───────────────────────────────────────────────────

pub use health::health;
pub use settings::{get_settings, update_settings};
