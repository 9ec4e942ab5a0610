//! Structured errors for the relme server.
//!
//! JSON routes answer `{"error": "..."}` with a status derived from the
//! core error code. The linked-webfingers route answers with a bare 500.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use relme_core::Error;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum WebError {
    /// A failure reported as JSON.
    #[error(transparent)]
    Core(#[from] Error),

    /// No such resource.
    #[error("NOT_FOUND: {0}")]
    NotFound(String),

    /// A failure reported as a 500 with no body.
    #[error("{0}")]
    Bare(Error),
}

impl WebError {
    fn status(err: &Error) -> StatusCode {
        match err {
            Error::InvalidInput(_) | Error::InvalidUrl(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        match self {
            WebError::Core(err) => {
                let status = Self::status(&err);
                if status.is_server_error() {
                    tracing::error!(code = err.code(), error = %err, "request failed");
                } else {
                    tracing::debug!(code = err.code(), error = %err, "rejected request");
                }
                (status, axum::Json(json!({ "error": err.to_string() }))).into_response()
            }
            WebError::NotFound(msg) => (StatusCode::NOT_FOUND, axum::Json(json!({ "error": msg }))).into_response(),
            WebError::Bare(err) => {
                tracing::warn!(code = err.code(), error = %err, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_core_error_is_json() {
        let response = WebError::from(Error::StoreUnavailable("gone".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["error"], "CACHE_ERROR: store unavailable: gone");
    }

    #[tokio::test]
    async fn test_invalid_input_is_bad_request() {
        let response = WebError::from(Error::InvalidInput("url".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_not_found() {
        let response = WebError::NotFound("https://example.social/@nobody".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_bare_error_has_empty_body() {
        let response = WebError::Bare(Error::InvalidInput("url".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(body.is_empty());
    }
}
