use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::pipeline::PipelineError;

/// Errors returned by HTTP handlers. Every variant renders as `{ "error": <message> }`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Missing text field")]
    MissingText,
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingText | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Scoring and storage failures are server errors. A missing record on the
/// scoring path is an invariant violation, so it is a 500 here too; handlers
/// that look records up by id map it to 404 themselves.
impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("Request failed: {}", self);
        }
        let body = ErrorResponse { error: self.to_string() };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scorer::ScoringError;
    use crate::store::{CommentId, StoreError};

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::MissingText.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::MissingText.to_string(), "Missing text field");

        let scoring: ApiError = PipelineError::Scoring(ScoringError::ModelError("down".into())).into();
        assert_eq!(scoring.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let not_found: ApiError = PipelineError::Store(StoreError::NotFound(CommentId::generate())).into();
        assert_eq!(not_found.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
