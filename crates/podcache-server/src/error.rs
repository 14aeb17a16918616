use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use podcache_core::QueryError;
use podcache_kube::KubeSourceError;
use serde_json::json;
use thiserror::Error;

/// Errors returned to HTTP callers.
///
/// Upstream failures never show up here; the cache absorbs them.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        }
    }

    fn message(&self) -> &str {
        match self {
            Self::BadRequest(m) | Self::Unauthorized(m) => m,
        }
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::debug!(error = %self, "Request rejected");
        (self.status_code(), Json(json!({ "error": self.message() }))).into_response()
    }
}

/// Failures that stop the server before it starts serving.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to initialize Kubernetes client: {0}")]
    Kube(#[from] KubeSourceError),

    #[error("invalid configuration: {0}")]
    Config(String),
}
