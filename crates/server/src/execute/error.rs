use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use adwatch_core::settings::DISABLED_ERR_MSG;

use crate::api::ErrorResponse;

/// Failures raised before a detector reaches the engine.
///
/// Engine failures are not represented here: they are reported through the
/// preview response body instead.
#[derive(Debug, thiserror::Error)]
pub enum ExecuteError {
    #[error("{}", DISABLED_ERR_MSG)]
    Disabled,

    #[error("{0}")]
    Parse(String),

    #[error("{0}")]
    Invalid(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Resolution(String),
}

impl ExecuteError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Parse(_) | Self::Invalid(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Disabled | Self::Resolution(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ExecuteError {
    fn into_response(self) -> Response {
        ErrorResponse::respond(self.status(), self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses() {
        assert_eq!(ExecuteError::Disabled.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ExecuteError::Parse("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ExecuteError::Invalid("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ExecuteError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(ExecuteError::Resolution("x".into()).status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ExecuteError::Disabled.to_string(), DISABLED_ERR_MSG);
    }
}
