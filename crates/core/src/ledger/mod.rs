//! Transaction ledger rules.
//!
//! - Posting validation (amount, date, currency, references)
//! - Merge patches and the active/deleted state machine
//! - Normalization of entered amounts to base currency
//! - Account balance derivation

pub mod account;
pub mod balance;
pub mod error;
pub mod service;
pub mod types;
pub mod validation;

#[cfg(test)]
mod service_props;

pub use account::{AccountType, validate_name, validate_new_account};
pub use balance::{AccountBalance, AccountFlows, total_balance};
pub use error::LedgerError;
pub use service::{LedgerService, PostingRules};
pub use types::{
    AccountRef, CategoryRef, NewTransaction, ResolvedTransaction, TransactionFilter,
    TransactionPatch, TransactionSnapshot, TransactionStatus, TransactionType,
};
