//! Maps a preview outcome onto the HTTP response.

use std::fmt::Display;

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Field holding the engine outcome in a successful preview body.
pub const ANOMALY_RESULT: &str = "anomaly_result";
/// Field holding the detector definition used for the preview.
pub const ANOMALY_DETECTOR: &str = "anomaly_detector";

#[derive(Serialize)]
struct PreviewBody<'a, D, R> {
    anomaly_result: &'a R,
    anomaly_detector: &'a D,
}

#[derive(Serialize)]
struct PreviewFailureBody<'a, D> {
    anomaly_detector: &'a D,
}

/// Build the preview response.
///
/// Success answers 200 with the outcome and the detector. Failure answers
/// 500 with only the detector. A success body that cannot be serialized is
/// handled as a failure; if the failure body cannot be serialized either,
/// the response is a bare 500.
pub fn preview_response<D, R, E>(detector_id: &str, detector: &D, outcome: Result<R, E>) -> Response
where
    D: Serialize,
    R: Serialize,
    E: Display,
{
    let cause = match outcome {
        Ok(results) => {
            match serde_json::to_vec(&PreviewBody {
                anomaly_result: &results,
                anomaly_detector: detector,
            }) {
                Ok(body) => return json_response(StatusCode::OK, body),
                Err(e) => e.to_string(),
            }
        }
        Err(e) => e.to_string(),
    };

    tracing::error!(detector_id = %detector_id, error = %cause, "Unexpected error running anomaly detector");

    match serde_json::to_vec(&PreviewFailureBody {
        anomaly_detector: detector,
    }) {
        Ok(body) => json_response(StatusCode::INTERNAL_SERVER_ERROR, body),
        Err(e) => {
            tracing::error!(detector_id = %detector_id, error = %e, "Failed to send back preview error response");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn json_response(status: StatusCode, body: Vec<u8>) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        Body::from(body),
    )
        .into_response()
}
