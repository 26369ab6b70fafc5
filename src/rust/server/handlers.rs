use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{ApiError, ApiResult};
use super::state::AppState;
use crate::pipeline::PipelineError;
use crate::scorer::{Category, SeverityScores};
use crate::store::{CommentId, FlaggedComment, StoreError};

/// Successful `/predict` response
#[derive(Debug, Serialize, Deserialize)]
pub struct PredictResponse {
    pub text: String,
    pub predictions: SeverityScores,
    pub alert_triggered: bool,
}

/// Pulls the `text` field out of a raw `/predict` body.
///
/// The body is parsed by hand rather than with the `Json` extractor so that
/// the error contract holds: an object without `text` (or `null`) is a 400,
/// while an unparseable body, a non-object value, or a non-string `text` is a
/// 500.
pub(crate) fn parse_predict_body(body: &[u8]) -> Result<String, ApiError> {
    if body.is_empty() {
        return Err(ApiError::Internal("Request body must be a JSON object".into()));
    }
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| ApiError::Internal(format!("Invalid JSON body: {}", e)))?;
    let fields = match value {
        Value::Object(fields) => fields,
        Value::Null => return Err(ApiError::MissingText),
        other => {
            return Err(ApiError::Internal(format!("Request body must be a JSON object, got {}", other)))
        }
    };
    let text = fields.get("text").ok_or(ApiError::MissingText)?;
    text.as_str()
        .map(str::to_owned)
        .ok_or_else(|| ApiError::Internal(format!("text field must be a string, got {}", text)))
}

/// Score a comment, persist it, and evaluate alerts
pub async fn predict(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<Json<PredictResponse>> {
    let body = body.map_err(|e| ApiError::Internal(e.body_text()))?;
    let text = parse_predict_body(&body)?;
    let scored = state.pipeline.process(&text).await?;
    Ok(Json(PredictResponse {
        text: scored.text,
        predictions: scored.severity_scores,
        alert_triggered: scored.alert_triggered,
    }))
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<usize>,
}

pub async fn recent_comments(
    State(state): State<AppState>,
    query: Result<Query<RecentQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<FlaggedComment>>> {
    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    Ok(Json(state.pipeline.recent_comments(query.limit).await?))
}

pub async fn comments_by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> ApiResult<Json<Vec<FlaggedComment>>> {
    let category: Category = category
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Unknown category: {}", category)))?;
    Ok(Json(state.pipeline.comments_by_category(category).await?))
}

pub async fn get_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<FlaggedComment>> {
    let id: CommentId = id
        .parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid comment id {}: {}", id, e)))?;
    match state.pipeline.comment(&id).await {
        Ok(comment) => Ok(Json(comment)),
        Err(PipelineError::Store(StoreError::NotFound(id))) => {
            Err(ApiError::NotFound(format!("Comment not found: {}", id)))
        }
        Err(e) => Err(e.into()),
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: String,
    pub uptime_secs: i64,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: state.version.clone(),
        uptime_secs: state.uptime_secs(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_predict_body() {
        assert_eq!(parse_predict_body(br#"{"text": "hi"}"#).unwrap(), "hi");
        assert_eq!(parse_predict_body(br#"{"text": ""}"#).unwrap(), "");

        assert!(matches!(parse_predict_body(b"{}"), Err(ApiError::MissingText)));
        assert!(matches!(parse_predict_body(b"null"), Err(ApiError::MissingText)));
        assert!(matches!(parse_predict_body(br#"{"comment": "hi"}"#), Err(ApiError::MissingText)));

        assert!(matches!(parse_predict_body(b""), Err(ApiError::Internal(_))));
        assert!(matches!(parse_predict_body(b"{not json"), Err(ApiError::Internal(_))));
        assert!(matches!(parse_predict_body(br#"{"text": 123}"#), Err(ApiError::Internal(_))));

        for body in [&b"5"[..], b"true", br#"["text"]"#, br#""text""#, b"[]"] {
            assert!(
                matches!(parse_predict_body(body), Err(ApiError::Internal(_))),
                "{}",
                String::from_utf8_lossy(body)
            );
        }
    }
}
