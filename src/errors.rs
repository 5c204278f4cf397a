use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

/// Application-specific error types.
#[derive(Debug, Clone)]
pub enum AppError {
    /// Malformed or out-of-range input fields, rejected before pricing.
    Validation(String),
    /// Encoder or estimator used before being fitted/loaded. Process
    /// misconfiguration, surfaced at startup rather than retried.
    NotFitted(String),
    /// A categorical value outside the fitted category set. The ride is
    /// rejected instead of guessing an encoding.
    UnknownCategory {
        /// Name of the categorical feature.
        feature: String,
        /// The value that was not seen during fitting.
        value: String,
    },
    /// Percent change is undefined for a zero base price.
    DivisionUndefined,
    /// Bad request error (invalid payload shape).
    BadRequest(String),
    /// Internal server error (model inference or artifact I/O failure).
    InternalError(String),
}

impl fmt::Display for AppError {
    /// Formats the error for display.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(msg) => write!(f, "Validation error: {}", msg),
            AppError::NotFitted(msg) => write!(f, "Not fitted: {}", msg),
            AppError::UnknownCategory { feature, value } => {
                write!(f, "Unknown category '{}' for feature '{}'", value, feature)
            }
            AppError::DivisionUndefined => {
                write!(f, "Percent change undefined: base price is zero")
            }
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    /// Converts the error into an HTTP response.
    ///
    /// Per-ride failures (validation, unknown category, zero base price) map
    /// to 422; payload-shape problems map to 400; everything else is a 500
    /// and gets logged, since it indicates a misconfigured process.
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            AppError::UnknownCategory { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, self.to_string())
            }
            AppError::DivisionUndefined => (StatusCode::UNPROCESSABLE_ENTITY, self.to_string()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFitted(msg) => {
                tracing::error!("Pricing system not fitted: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Pricing system not initialized".to_string(),
                )
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<candle_core::Error> for AppError {
    /// Converts a model inference/training error into an `AppError`.
    fn from(err: candle_core::Error) -> Self {
        AppError::InternalError(format!("model error: {}", err))
    }
}

impl From<std::io::Error> for AppError {
    /// Converts an artifact I/O error into an `AppError`.
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(format!("io error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    /// Converts an artifact (de)serialization error into an `AppError`.
    fn from(err: serde_json::Error) -> Self {
        AppError::InternalError(format!("serialization error: {}", err))
    }
}
