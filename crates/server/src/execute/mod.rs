//! Detector execution routes: preview (inline or stored detector) and run.
//!
//! The disabled guard runs as route middleware, ahead of every extractor.
//! Route classification, body parsing, and input validation then finish
//! before the first store lookup, engine call, or result-action call.

mod error;
mod resolver;
mod response;
mod route;
mod validation;

pub use error::ExecuteError;
pub use resolver::resolve;
pub use response::{preview_response, ANOMALY_DETECTOR, ANOMALY_RESULT};
pub use route::ExecutionRoute;
pub use validation::{validate_detector, validate_execution_input, ValidatedExecution};

use std::sync::Arc;

use axum::extract::{OriginalUri, Path, Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;

use adwatch_core::ExecutionInput;

use crate::result_action::AnomalyResultRequest;
use crate::state::AppState;

/// Caller identity header. Logged only; it never reaches the store.
pub const USER_HEADER: &str = "x-adwatch-user";

const NO_DETECTOR_ID_MSG: &str = "Wrong input, no detector id";

/// Reject every execution request while detection is disabled.
///
/// Mounted as a route layer, so it runs before path decoding and body
/// buffering can fail.
pub async fn require_enabled(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    if !state.settings.is_enabled() {
        tracing::debug!(path = %request.uri().path(), "Execution request rejected, detection disabled");
        return ExecuteError::Disabled.into_response();
    }
    next.run(request).await
}

/// Preview a stored detector (or an inline one) over a window.
#[utoipa::path(
    post,
    path = "/_adwatch/detectors/{detector_id}/preview",
    tag = "Detectors",
    params(("detector_id" = String, Path, description = "Detector id")),
    request_body = adwatch_core::execution::ExecutionInputBody,
    responses(
        (status = 200, description = "anomaly_result and anomaly_detector"),
        (status = 400, description = "Invalid request", body = crate::api::ErrorResponse),
        (status = 404, description = "Unknown detector", body = crate::api::ErrorResponse),
        (status = 500, description = "Detection failed, body holds anomaly_detector only")
    )
)]
pub async fn preview_detector(
    State(state): State<Arc<AppState>>,
    Path(detector_id): Path<String>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    execute(&state, Some(detector_id), uri.path(), &headers, body).await
}

/// Preview without a path id, normally with an inline detector.
#[utoipa::path(
    post,
    path = "/_adwatch/detectors/preview",
    tag = "Detectors",
    request_body = adwatch_core::execution::ExecutionInputBody,
    responses(
        (status = 200, description = "anomaly_result and anomaly_detector"),
        (status = 400, description = "Invalid request", body = crate::api::ErrorResponse),
        (status = 404, description = "No detector id and no inline detector", body = crate::api::ErrorResponse),
        (status = 500, description = "Detection failed, body holds anomaly_detector only")
    )
)]
pub async fn preview_inline(
    State(state): State<Arc<AppState>>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    execute(&state, None, uri.path(), &headers, body).await
}

/// Run a stored detector through the anomaly-result action.
#[utoipa::path(
    post,
    path = "/_adwatch/detectors/{detector_id}/run",
    tag = "Detectors",
    params(("detector_id" = String, Path, description = "Detector id")),
    request_body = adwatch_core::execution::ExecutionInputBody,
    responses(
        (status = 200, description = "Latest bucket result", body = crate::result_action::AnomalyResultResponse),
        (status = 400, description = "Invalid request", body = crate::api::ErrorResponse),
        (status = 404, description = "Unknown detector", body = crate::api::ErrorResponse),
        (status = 500, description = "Execution failed", body = crate::api::ErrorResponse)
    )
)]
pub async fn run_detector(
    State(state): State<Arc<AppState>>,
    Path(detector_id): Path<String>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    execute(&state, Some(detector_id), uri.path(), &headers, body).await
}

async fn execute(
    state: &AppState,
    path_id: Option<String>,
    path: &str,
    headers: &HeaderMap,
    body: Bytes,
) -> Response {
    match dispatch(state, path_id, path, headers, body).await {
        Ok(response) => response,
        Err(e) => {
            tracing::debug!(status = %e.status(), error = %e, "Execution request rejected");
            e.into_response()
        }
    }
}

async fn dispatch(
    state: &AppState,
    path_id: Option<String>,
    path: &str,
    headers: &HeaderMap,
    body: Bytes,
) -> Result<Response, ExecuteError> {
    let route = ExecutionRoute::classify(path)
        .ok_or_else(|| ExecuteError::NotFound(format!("No execution route for {}", path)))?;

    // TODO: enforce request_timeout on the engine and result-action calls.
    let timeout = state.settings.request_timeout();
    let user = headers.get(USER_HEADER).and_then(|v| v.to_str().ok());
    tracing::debug!(
        route = route.as_str(),
        user = user.unwrap_or("-"),
        timeout_ms = timeout.as_millis() as u64,
        "Execution request received"
    );

    let mut input = ExecutionInput::parse(&body, path_id.as_deref())
        .map_err(|e| ExecuteError::Parse(e.to_string()))?;
    let validated = validate_execution_input(route, &input).map_err(ExecuteError::Invalid)?;

    match validated {
        ValidatedExecution::Run {
            detector_id,
            start,
            end,
        } => {
            let request = AnomalyResultRequest {
                detector_id: detector_id.clone(),
                start_millis: start.timestamp_millis(),
                end_millis: end.timestamp_millis(),
            };
            Ok(match state.result_action.execute(request).await {
                Ok(response) => response.into_response(),
                Err(e) => {
                    tracing::warn!(detector_id = %detector_id, error = %e, "Anomaly result action failed");
                    e.into_response()
                }
            })
        }
        ValidatedExecution::Preview {
            detector_id,
            start,
            end,
        } => {
            let detector = match input.take_detector() {
                Some(detector) => {
                    if let Some(msg) = validate_detector(&detector, state.settings.max_anomaly_features()) {
                        return Err(ExecuteError::Invalid(msg));
                    }
                    detector
                }
                None => {
                    let Some(id) = detector_id.as_deref() else {
                        return Err(ExecuteError::NotFound(NO_DETECTOR_ID_MSG.to_string()));
                    };
                    resolve(state.store.as_ref(), id).await?
                }
            };

            let log_id = detector
                .detector_id
                .clone()
                .or(detector_id)
                .unwrap_or_else(|| "<inline>".to_string());
            let outcome = state.engine.execute_detector(&detector, start, end).await;
            if let Ok(results) = &outcome {
                tracing::info!(detector_id = %log_id, buckets = results.len(), "Preview completed");
            }
            Ok(preview_response(&log_id, &detector, outcome))
        }
    }
}
