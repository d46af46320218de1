//! Category rule errors.

use famledger_shared::AppError;
use famledger_shared::types::CategoryId;
use thiserror::Error;

/// Reasons a parent assignment is rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CategoryRuleError {
    /// A category cannot be its own parent.
    #[error("A category cannot be its own parent")]
    SelfParent,

    /// Parent missing, inactive or owned by another family.
    #[error("Parent category not found: {0}")]
    ParentNotFound(CategoryId),

    /// Parent has a different type.
    #[error("Parent category type '{parent}' does not match '{child}'")]
    TypeMismatch {
        /// Parent's type.
        parent: String,
        /// Child's type.
        child: String,
    },

    /// The parent is a descendant of the category.
    #[error("Parent category {0} is a descendant of this category")]
    Cycle(CategoryId),
}

impl CategoryRuleError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::ParentNotFound(_) => "NOT_FOUND",
            Self::SelfParent | Self::TypeMismatch { .. } | Self::Cycle(_) => "VALIDATION_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::ParentNotFound(_) => 404,
            Self::SelfParent | Self::TypeMismatch { .. } | Self::Cycle(_) => 400,
        }
    }
}

impl From<CategoryRuleError> for AppError {
    fn from(err: CategoryRuleError) -> Self {
        match err {
            CategoryRuleError::ParentNotFound(_) => {
                Self::NotFound("Parent category not found".to_string())
            }
            other => Self::validation("parent_id", other.to_string()),
        }
    }
}
