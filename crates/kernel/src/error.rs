//! Application error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

/// Application errors.
#[derive(Debug, Error)]
pub enum AppError {
    /// A query parameter carried a value outside its accepted set.
    #[error("invalid value '{value}' for query parameter '{name}'")]
    InvalidQueryParameter { name: &'static str, value: String },

    /// A populate path named an attribute the schema doesn't have.
    #[error("unknown attribute path '{0}'")]
    UnknownAttributePath(String),

    #[error("unknown content type '{0}'")]
    UnknownContentType(String),

    #[error("not found")]
    NotFound,

    #[error("store fetch failed")]
    Store(#[from] StoreError),

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Shorthand for an invalid query parameter.
    pub fn invalid_param(name: &'static str, value: impl Into<String>) -> Self {
        AppError::InvalidQueryParameter {
            name,
            value: value.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidQueryParameter { .. } | AppError::UnknownAttributePath(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::UnknownContentType(_) | AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Store(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn name(&self) -> &'static str {
        match self.status() {
            StatusCode::BAD_REQUEST => "ValidationError",
            StatusCode::NOT_FOUND => "NotFoundError",
            _ => "InternalServerError",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Client errors echo their message; server errors are logged and kept vague
        let message = match &self {
            AppError::Store(e) => {
                tracing::error!(error = %e, "store fetch failed");
                "internal server error".to_string()
            }
            AppError::Internal(e) => {
                tracing::error!(error = %e, "internal server error");
                "internal server error".to_string()
            }
            _ => self.to_string(),
        };

        let body = json!({
            "data": null,
            "error": {
                "status": status.as_u16(),
                "name": self.name(),
                "message": message,
            }
        });

        (status, Json(body)).into_response()
    }
}

/// Result type alias using AppError.
pub type AppResult<T> = Result<T, AppError>;
