// crates/server/src/error.rs
//! Converts the domain error enums (`FeedError`, `MonitoringError`) into a
//! structured JSON body with a matching HTTP status, mirroring the
//! source repository's `ApiError`/`ErrorResponse` split.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into(), details: None }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self { error: error.into(), details: Some(details.into()) }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("feed error: {0}")]
    Feed(#[from] activity_feed::FeedError),
    #[error("monitoring error: {0}")]
    Monitoring(#[from] activity_monitoring::MonitoringError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::BadRequest(msg) => {
                tracing::warn!(message = %msg, "bad request");
                (StatusCode::BAD_REQUEST, ErrorResponse::with_details("bad request", msg.clone()))
            }
            ApiError::Feed(err) => feed_error_response(err),
            ApiError::Monitoring(err) => {
                tracing::error!(%err, "monitoring error");
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorResponse::with_details("monitoring error", err.to_string()))
            }
            ApiError::Internal(msg) => {
                tracing::error!(message = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorResponse::new("internal server error"))
            }
        };
        (status, Json(body)).into_response()
    }
}

fn feed_error_response(err: &activity_feed::FeedError) -> (StatusCode, ErrorResponse) {
    use activity_feed::FeedError;
    match err {
        FeedError::NotFound { scope, id } => {
            tracing::warn!(scope = %scope, id = %id, "feed scope not found");
            (StatusCode::NOT_FOUND, ErrorResponse::with_details(format!("{scope} not found"), id.clone()))
        }
        FeedError::Forbidden => (StatusCode::FORBIDDEN, ErrorResponse::new("forbidden")),
        FeedError::InvalidArgument(msg) => (StatusCode::BAD_REQUEST, ErrorResponse::with_details("invalid argument", msg.clone())),
        FeedError::Db(db_err) => {
            tracing::error!(error = %db_err, "database error");
            (StatusCode::INTERNAL_SERVER_ERROR, ErrorResponse::with_details("database error", db_err.to_string()))
        }
        FeedError::ImageStore(store_err) => {
            tracing::error!(error = %store_err, "image store error");
            (StatusCode::INTERNAL_SERVER_ERROR, ErrorResponse::with_details("image store error", store_err.to_string()))
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn extract(response: Response) -> (StatusCode, ErrorResponse) {
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn forbidden_feed_error_maps_to_403() {
        let error: ApiError = activity_feed::FeedError::Forbidden.into();
        let (status, body) = extract(error.into_response()).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body.error, "forbidden");
    }

    #[tokio::test]
    async fn not_found_feed_error_includes_the_id_in_details() {
        let error: ApiError = activity_feed::FeedError::NotFound {
            scope: "folder",
            id: "abc".to_string(),
        }
        .into();
        let (status, body) = extract(error.into_response()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.details, Some("abc".to_string()));
    }

    #[tokio::test]
    async fn invalid_argument_maps_to_400() {
        let error: ApiError = activity_feed::FeedError::InvalidArgument("bad range".to_string()).into();
        let (status, _) = extract(error.into_response()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
