//! Ledger error types.
//!
//! Every failure a posting operation can report. Cross-family references
//! are reported as not-found so callers cannot probe other families' data.

use chrono::NaiveDate;
use famledger_shared::AppError;
use famledger_shared::types::{AccountId, CategoryId, CurrencyCode, TransactionId};
use thiserror::Error;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Amount must be strictly positive.
    #[error("Amount must be greater than zero")]
    InvalidAmount,

    /// Transaction date is in the future.
    #[error("Transaction date {0} cannot be in the future")]
    InvalidDate(NaiveDate),

    /// Category type differs from the transaction type.
    #[error("Category type '{category_type}' does not match transaction type '{transaction_type}'")]
    CategoryTypeMismatch {
        /// Type of the referenced category.
        category_type: String,
        /// Requested transaction type.
        transaction_type: String,
    },

    /// Generic field-level validation error.
    #[error("{message}")]
    Validation {
        /// Offending request field.
        field: &'static str,
        /// Human-readable message.
        message: String,
    },

    // ========== Not Found ==========
    /// Account missing, inactive or owned by another family.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Category missing or owned by another family.
    #[error("Category not found: {0}")]
    CategoryNotFound(CategoryId),

    /// Transaction missing, deleted or owned by another family.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    // ========== Currency ==========
    /// No exchange rate for a pair needed to post.
    #[error("No exchange rate found for {from} to {to} on {date}")]
    RateUnavailable {
        /// Source currency.
        from: CurrencyCode,
        /// Target currency.
        to: CurrencyCode,
        /// Date the rate was requested for.
        date: NaiveDate,
    },

    // ========== Unit of work ==========
    /// A mutating operation was attempted without an acting user.
    #[error("No acting user bound to the operation")]
    MissingActor,

    /// The unit of work failed and was rolled back.
    #[error("Storage failure: {0}")]
    Storage(String),
}

impl LedgerError {
    /// Shorthand for a field-level validation error.
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Returns the request field this error refers to, if any.
    #[must_use]
    pub const fn field(&self) -> Option<&'static str> {
        match self {
            Self::InvalidAmount => Some("amount"),
            Self::InvalidDate(_) => Some("date"),
            Self::CategoryTypeMismatch { .. } | Self::CategoryNotFound(_) => Some("category_id"),
            Self::Validation { field, .. } => Some(*field),
            Self::AccountNotFound(_) => Some("account_id"),
            Self::RateUnavailable { .. } => Some("currency"),
            Self::TransactionNotFound(_) | Self::MissingActor | Self::Storage(_) => None,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount
            | Self::InvalidDate(_)
            | Self::CategoryTypeMismatch { .. }
            | Self::Validation { .. } => "VALIDATION_ERROR",
            Self::AccountNotFound(_) | Self::CategoryNotFound(_) | Self::TransactionNotFound(_) => {
                "NOT_FOUND"
            }
            Self::RateUnavailable { .. } => "RATE_UNAVAILABLE",
            Self::MissingActor => "UNAUTHORIZED",
            Self::Storage(_) => "STORAGE_FAILURE",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::InvalidAmount
            | Self::InvalidDate(_)
            | Self::CategoryTypeMismatch { .. }
            | Self::Validation { .. } => 400,
            Self::MissingActor => 401,
            Self::AccountNotFound(_) | Self::CategoryNotFound(_) | Self::TransactionNotFound(_) => {
                404
            }
            Self::RateUnavailable { .. } => 422,
            Self::Storage(_) => 500,
        }
    }

    /// Returns true for errors the caller can fix by changing the request.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        self.http_status_code() < 500
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let message = err.to_string();
        match err {
            LedgerError::InvalidAmount
            | LedgerError::InvalidDate(_)
            | LedgerError::CategoryTypeMismatch { .. }
            | LedgerError::Validation { .. } => {
                Self::validation(err.field().unwrap_or("request"), message)
            }
            LedgerError::AccountNotFound(_) => Self::NotFound("Account not found".to_string()),
            LedgerError::CategoryNotFound(_) => Self::NotFound("Category not found".to_string()),
            LedgerError::TransactionNotFound(_) => {
                Self::NotFound("Transaction not found".to_string())
            }
            LedgerError::RateUnavailable { .. } => Self::RateUnavailable(message),
            LedgerError::MissingActor => Self::Unauthorized(message),
            LedgerError::Storage(detail) => Self::Storage(detail),
        }
    }
}
