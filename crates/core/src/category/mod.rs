//! Category hierarchy rules.

mod error;
mod hierarchy;

pub use error::CategoryRuleError;
pub use hierarchy::{CategoryNode, validate_parent};

/// Categories share the income/expense classification with transactions.
pub type CategoryType = crate::ledger::TransactionType;
