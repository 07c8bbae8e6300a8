//! Live settings endpoints: the update entry point for process-wide
//! detection settings.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use adwatch_core::{SettingsSnapshot, SettingsUpdate};

use crate::state::AppState;

/// Current live settings.
#[utoipa::path(
    get,
    path = "/_settings",
    tag = "Settings",
    responses(
        (status = 200, description = "Current settings", body = SettingsSnapshot)
    )
)]
pub async fn get_settings(State(state): State<Arc<AppState>>) -> Json<SettingsSnapshot> {
    Json(state.settings.snapshot())
}

/// Apply a partial settings update. Takes effect for the next request.
#[utoipa::path(
    put,
    path = "/_settings",
    tag = "Settings",
    request_body = SettingsUpdate,
    responses(
        (status = 200, description = "Settings after the update", body = SettingsSnapshot)
    )
)]
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    Json(update): Json<SettingsUpdate>,
) -> Json<SettingsSnapshot> {
    state.settings.apply(&update);
    Json(state.settings.snapshot())
}
