//! HTTP-facing error type.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};

use crate::application::services::ResolveError;
use crate::domain::entities::InvalidShortCode;

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

#[derive(Serialize)]
struct ErrorInfo {
    code: &'static str,
    message: String,
    details: Value,
}

#[derive(Debug)]
pub enum AppError {
    Validation {
        message: String,
        details: Value,
    },
    NotFound {
        message: String,
        details: Value,
    },
    /// Retryable server-side failure.
    Unavailable {
        code: &'static str,
        message: String,
        details: Value,
    },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }
    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }
    pub fn unavailable(code: &'static str, message: impl Into<String>, details: Value) -> Self {
        Self::Unavailable {
            code,
            message: message.into(),
            details,
        }
    }
}

impl From<InvalidShortCode> for AppError {
    fn from(e: InvalidShortCode) -> Self {
        AppError::bad_request("Invalid short code", json!({ "reason": e.to_string() }))
    }
}

impl From<ResolveError> for AppError {
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::NotFound(code) => {
                AppError::not_found("Unknown short code", json!({ "code": code }))
            }
            ResolveError::LockAcquisitionFailed(code) => AppError::unavailable(
                "lock_timeout",
                "Short code is being loaded, retry shortly",
                json!({ "code": code }),
            ),
            ResolveError::StoreQueryFailed { code, .. } => AppError::unavailable(
                "store_unavailable",
                "Redirect store is unavailable",
                json!({ "code": code }),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let retryable = matches!(self, AppError::Unavailable { .. });

        let (status, code, message, details) = match self {
            AppError::Validation { message, details } => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                message,
                details,
            ),
            AppError::NotFound { message, details } => {
                (StatusCode::NOT_FOUND, "not_found", message, details)
            }
            AppError::Unavailable {
                code,
                message,
                details,
            } => (StatusCode::SERVICE_UNAVAILABLE, code, message, details),
        };

        let body = ErrorBody {
            error: ErrorInfo {
                code,
                message,
                details,
            },
        };

        let mut response = (status, Json(body)).into_response();
        if retryable {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from_static("1"));
        }
        response
    }
}
