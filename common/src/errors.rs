//! Unified error types.
//!
//! Two tiers exist. Routing and startup failures are [`AppError`] values and
//! abort the request. Query failures never appear here: they are captured as
//! `QueryOutcome::Failure` at the executor boundary.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::response::ApiResponse;

/// Application error.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("database connection failed: {0}")]
    DatabaseConnection(String),

    #[error("database query failed: {0}")]
    DatabaseQuery(String),

    #[error("invalid tag: {0}")]
    UnknownTag(String),

    #[error("tag `{tag}` requires session parameter `{key}`")]
    MissingParameter { tag: String, key: String },

    #[error("session parameter `{key}` must be a string")]
    InvalidParameter { key: String },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Result alias used throughout the workspace.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::DatabaseConnection(_) => "DATABASE_CONNECTION_ERROR",
            AppError::DatabaseQuery(_) => "DATABASE_QUERY_ERROR",
            AppError::UnknownTag(_) => "UNKNOWN_TAG",
            AppError::MissingParameter { .. } => "MISSING_PARAMETER",
            AppError::InvalidParameter { .. } => "INVALID_PARAMETER",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// HTTP status this error is reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::UnknownTag(_)
            | AppError::MissingParameter { .. }
            | AppError::InvalidParameter { .. }
            | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Config(_)
            | AppError::DatabaseConnection(_)
            | AppError::DatabaseQuery(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        AppError::Validation(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "请求处理失败");
        } else {
            tracing::warn!(code = self.code(), error = %self, "请求被拒绝");
        }
        (status, Json(ApiResponse::err(self.code(), self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routing_errors_are_bad_request() {
        assert_eq!(AppError::UnknownTag("x".into()).status(), StatusCode::BAD_REQUEST);
        let missing = AppError::MissingParameter {
            tag: "static".into(),
            key: "sql".into(),
        };
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
        assert_eq!(missing.to_string(), "tag `static` requires session parameter `sql`");
    }

    #[test]
    fn test_startup_errors_are_server_errors() {
        assert_eq!(
            AppError::Config("REGION".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::DatabaseConnection("refused".into()).code(),
            "DATABASE_CONNECTION_ERROR"
        );
    }
}
