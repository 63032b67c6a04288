use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Key ID does not match configured gateway key")]
    ConfigMismatch,

    #[error("Invalid amount: {0}")]
    InvalidAmount(i64),

    #[error("Invalid discount percentage: {0}")]
    InvalidDiscount(i64),

    #[error("Gateway error: {0}")]
    Gateway(String),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Amount mismatch: expected {expected}, got {actual}")]
    AmountMismatch { expected: i64, actual: i64 },

    #[error("Payment not captured (status: {0})")]
    PaymentNotCaptured(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<axum::extract::rejection::QueryRejection> for AppError {
    fn from(rejection: axum::extract::rejection::QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::ConfigMismatch => {
                (StatusCode::BAD_REQUEST, "Invalid key ID", None)
            }
            AppError::InvalidAmount(amount) => (
                StatusCode::BAD_REQUEST,
                "Invalid amount",
                Some(amount.to_string()),
            ),
            AppError::InvalidDiscount(percentage) => (
                StatusCode::BAD_REQUEST,
                "Invalid discount percentage",
                Some(percentage.to_string()),
            ),
            AppError::Gateway(e) => {
                tracing::error!("Gateway error: {}", e);
                (StatusCode::BAD_GATEWAY, "Payment gateway error", None)
            }
            AppError::OrderNotFound(id) => {
                (StatusCode::NOT_FOUND, "Order not found", Some(id.clone()))
            }
            AppError::InvalidSignature => {
                (StatusCode::UNAUTHORIZED, "Invalid signature", None)
            }
            AppError::AmountMismatch { .. } => {
                (StatusCode::BAD_REQUEST, "Payment amount mismatch", None)
            }
            AppError::PaymentNotCaptured(status) => (
                StatusCode::BAD_REQUEST,
                "Payment not captured",
                Some(status.clone()),
            ),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized", None),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "Bad request", Some(msg.clone()))
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
            }
            AppError::Pool(e) => {
                tracing::error!("Pool error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
            }
            AppError::Json(e) => {
                tracing::error!("JSON error: {}", e);
                (StatusCode::BAD_REQUEST, "Invalid JSON", Some(e.to_string()))
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
