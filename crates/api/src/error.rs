//! Error responses.
//!
//! Every handler failure becomes `{"error": CODE, "message": ..., "field"?: ...}`
//! with the status the domain error maps to. Server-side failures are
//! logged here with their detail; clients only see a generic message.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use famledger_core::auth::LoginError;
use famledger_core::category::CategoryRuleError;
use famledger_core::ledger::LedgerError;
use famledger_db::repositories::{
    AccountError, CategoryError, ExchangeRateError, FamilyError, TransactionError,
};
use famledger_shared::{AppError, JwtError};
use sea_orm::DbErr;
use serde_json::json;
use tracing::error;
use validator::ValidationErrors;

/// An error ready to be rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    field: Option<String>,
}

impl ApiError {
    /// Creates an error with an explicit status and code.
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            field: None,
        }
    }

    /// Shorthand for a 400 validation error on `field`.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::validation(field, message).into()
    }

    /// Shorthand for a 404.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    /// HTTP status of the response.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }

    /// Offending request field, for validation errors.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.field {
            Some(field) => json!({
                "error": self.code,
                "message": self.message,
                "field": field,
            }),
            None => json!({
                "error": self.code,
                "message": self.message,
            }),
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!(code = err.error_code(), error = %err, "Request failed");
        }
        Self {
            status,
            code: err.error_code(),
            message: err.public_message(),
            field: err.field().map(ToString::to_string),
        }
    }
}

macro_rules! via_app_error {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl From<$ty> for ApiError {
                fn from(err: $ty) -> Self {
                    AppError::from(err).into()
                }
            }
        )+
    };
}

via_app_error!(
    LedgerError,
    CategoryRuleError,
    AccountError,
    CategoryError,
    ExchangeRateError,
    FamilyError,
    TransactionError,
);

impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        AppError::Storage(err.to_string()).into()
    }
}

impl From<LoginError> for ApiError {
    fn from(err: LoginError) -> Self {
        let status = StatusCode::from_u16(err.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!(error = %err, "Password verification failed");
            return Self::new(status, err.error_code(), "An error occurred during login");
        }
        Self::new(status, err.error_code(), err.to_string())
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        error!(error = %err, "Failed to issue access token");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "TOKEN_ERROR",
            "An error occurred during login",
        )
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let first = errors
            .field_errors()
            .into_iter()
            .min_by(|a, b| a.0.cmp(&b.0))
            .map(|(field, errs)| {
                let message = errs
                    .first()
                    .and_then(|e| e.message.as_ref())
                    .map_or_else(|| format!("{field} is invalid"), ToString::to_string);
                (field.to_string(), message)
            });

        match first {
            Some((field, message)) => Self::validation(field, message),
            None => Self::validation("request", "Invalid request"),
        }
    }
}
