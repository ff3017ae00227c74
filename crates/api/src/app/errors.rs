//! Service errors and their HTTP mapping.
//!
//! Every error body is `{"error": <code>, "message": <text>}`; field-level
//! validation failures add `"errors": {field: [messages]}`.

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use thiserror::Error;

use menuhub_auth::{GateRejection, PasswordError, TokenError};
use menuhub_catalog::PricingError;
use menuhub_core::{DomainError, FieldErrors};
use menuhub_infra::{BlobError, NotifyError, StoreError};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("{message}")]
    InvalidFields { message: String, errors: FieldErrors },

    #[error("{0}")]
    InvalidId(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    AuthenticationRequired(String),

    #[error("{0}")]
    InvalidToken(String),

    /// Credentials were supplied but did not match.
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    MethodNotAllowed(String),

    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn invalid_fields(errors: FieldErrors) -> Self {
        Self::InvalidFields {
            message: "validation failed".to_string(),
            errors,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InvalidFields { .. } | Self::InvalidId(_) | Self::Conflict(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::AuthenticationRequired(_) | Self::InvalidToken(_) | Self::Unauthorized(_) => {
                StatusCode::UNAUTHORIZED
            }
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) | Self::InvalidFields { .. } => "validation_error",
            Self::InvalidId(_) => "invalid_id",
            Self::NotFound(_) => "not_found",
            Self::AuthenticationRequired(_) => "authentication_required",
            Self::InvalidToken(_) => "invalid_token",
            Self::Unauthorized(_) => "unauthorized",
            Self::Forbidden(_) => "forbidden",
            Self::Conflict(_) => "conflict",
            Self::MethodNotAllowed(_) => "method_not_allowed",
            Self::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        match self {
            Self::InvalidFields { message, errors } => (
                status,
                axum::Json(json!({
                    "error": "validation_error",
                    "message": message,
                    "errors": errors.to_json(),
                })),
            )
                .into_response(),
            other => json_error(status, other.code(), other.to_string()),
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => Self::Validation(msg),
            DomainError::InvalidFields(errors) => Self::invalid_fields(errors),
            DomainError::InvalidId(msg) => Self::InvalidId(msg),
            DomainError::NotFound(what) => Self::NotFound(format!("{what} not found")),
            DomainError::Conflict(msg) => Self::Conflict(msg),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(field) => Self::Validation(format!("{field} already exists")),
            StoreError::NotFound(what) => Self::NotFound(format!("{what} not found")),
            StoreError::Backend(msg) => Self::Internal(msg),
        }
    }
}

impl From<PricingError> for ServiceError {
    fn from(err: PricingError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<BlobError> for ServiceError {
    fn from(err: BlobError) -> Self {
        if err.is_client_error() {
            Self::Validation(err.to_string())
        } else {
            Self::Internal(err.to_string())
        }
    }
}

impl From<NotifyError> for ServiceError {
    fn from(err: NotifyError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<PasswordError> for ServiceError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::Empty => Self::Validation(err.to_string()),
            PasswordError::Hash(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<TokenError> for ServiceError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Encode(_) => Self::Internal(err.to_string()),
            TokenError::Invalid(_) => Self::InvalidToken(err.to_string()),
        }
    }
}

impl From<JsonRejection> for ServiceError {
    fn from(err: JsonRejection) -> Self {
        Self::Validation(format!("malformed JSON body: {}", err.body_text()))
    }
}

impl From<MultipartRejection> for ServiceError {
    fn from(err: MultipartRejection) -> Self {
        Self::Validation(format!("expected a multipart/form-data body: {}", err.body_text()))
    }
}

impl From<GateRejection> for ServiceError {
    fn from(err: GateRejection) -> Self {
        let message = err.to_string();
        match err {
            GateRejection::AuthenticationRequired => Self::AuthenticationRequired(message),
            GateRejection::InvalidToken(_) => Self::InvalidToken(message),
            GateRejection::Forbidden => Self::Forbidden(message),
        }
    }
}
