//! サービス共通のエラー型と、レスポンスエンベロープへの変換。
//!
//! 5xx 系のメッセージは内部状態を含み得るため、`to_response(false)` では
//! 汎用メッセージに置き換え、原文はログにのみ出力する。

use serde::Serialize;
use svckit_validation::{ValidationError, ValidationErrors};

use crate::ApiResponse;

/// ErrorDetail はフィールド単位のエラー詳細。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorDetail {
    pub field: String,
    pub reason: String,
    pub message: String,
}

impl ErrorDetail {
    pub fn new(
        field: impl Into<String>,
        reason: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
            message: message.into(),
        }
    }
}

impl From<&ValidationError> for ErrorDetail {
    fn from(err: &ValidationError) -> Self {
        Self::new(err.field(), err.code(), err.to_string())
    }
}

/// ServiceError は HTTP ステータスに対応する高水準エラー型。
///
/// `axum` feature 有効時は `IntoResponse` を実装する。
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// 400 Bad Request
    #[error("{message}")]
    BadRequest {
        message: String,
        details: Vec<ErrorDetail>,
    },

    /// 401 Unauthorized
    #[error("{0}")]
    Unauthorized(String),

    /// 403 Forbidden
    #[error("{0}")]
    Forbidden(String),

    /// 404 Not Found
    #[error("{0}")]
    NotFound(String),

    /// 409 Conflict
    #[error("{0}")]
    Conflict(String),

    /// 429 Too Many Requests
    #[error("{0}")]
    TooManyRequests(String),

    /// 500 Internal Server Error
    #[error("{0}")]
    Internal(String),

    /// 503 Service Unavailable
    #[error("{0}")]
    ServiceUnavailable(String),
}

impl ServiceError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
            details: vec![],
        }
    }

    pub fn bad_request_with_details(message: impl Into<String>, details: Vec<ErrorDetail>) -> Self {
        Self::BadRequest {
            message: message.into(),
            details,
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::BadRequest { .. } => 400,
            ServiceError::Unauthorized(_) => 401,
            ServiceError::Forbidden(_) => 403,
            ServiceError::NotFound(_) => 404,
            ServiceError::Conflict(_) => 409,
            ServiceError::TooManyRequests(_) => 429,
            ServiceError::Internal(_) => 500,
            ServiceError::ServiceUnavailable(_) => 503,
        }
    }

    /// エンベロープに変換する。`expose_internal` が false の場合、5xx のメッセージは汎用文言になる。
    pub fn to_response(&self, expose_internal: bool) -> ApiResponse<Vec<ErrorDetail>> {
        let status = self.status_code();
        let message = match self {
            ServiceError::Internal(_) if !expose_internal => "internal server error".to_string(),
            ServiceError::ServiceUnavailable(_) if !expose_internal => {
                "service temporarily unavailable".to_string()
            }
            other => other.to_string(),
        };

        match self {
            ServiceError::BadRequest { details, .. } if !details.is_empty() => {
                ApiResponse::with_data(status, message, details.clone())
            }
            _ => ApiResponse::message(status, message),
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        let detail = ErrorDetail::from(&err);
        Self::bad_request_with_details("validation failed", vec![detail])
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(errs: ValidationErrors) -> Self {
        let details = errs.get_errors().iter().map(ErrorDetail::from).collect();
        Self::bad_request_with_details("validation failed", details)
    }
}

// --- axum integration ---

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        if self.status_code() >= 500 {
            tracing::error!(status = self.status_code(), error = %self, "request failed");
        }
        self.to_response(false).into_response()
    }
}
