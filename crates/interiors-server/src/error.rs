//! Error-to-HTTP response conversion.
//!
//! Implements `IntoResponse` for [`interiors_core::Error`] so that route
//! handlers can return `Result<T, AppError>` and use `?` on core results.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Wrapper so we can implement `IntoResponse` for an external type.
pub struct AppError {
    inner: interiors_core::Error,
    request_id: Option<String>,
}

impl AppError {
    pub fn new(inner: interiors_core::Error) -> Self {
        Self {
            inner,
            request_id: None,
        }
    }

    pub fn with_request_id(mut self, id: String) -> Self {
        self.request_id = Some(id);
        self
    }
}

impl From<interiors_core::Error> for AppError {
    fn from(e: interiors_core::Error) -> Self {
        Self::new(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.inner.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(
                status = %status,
                error = %self.inner,
                "Server error in handler"
            );
        }

        let code = match &self.inner {
            interiors_core::Error::NotFound { .. } => "not_found",
            interiors_core::Error::Validation(_) => "validation_error",
            interiors_core::Error::Database { .. } => "database_error",
            interiors_core::Error::Io { .. } => "io_error",
            interiors_core::Error::Storage { .. } => "storage_error",
            interiors_core::Error::Internal(_) => "internal_error",
        };

        let body = json!({
            "error": self.inner.to_string(),
            "code": code,
            "request_id": self.request_id,
        });

        (status, axum::Json(body)).into_response()
    }
}
