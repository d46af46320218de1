//! Ledger domain types: transaction type and status, creation input,
//! merge patches and resolved rows ready for storage.

use chrono::NaiveDate;
use famledger_shared::types::{AccountId, CategoryId, CurrencyCode, FamilyId, TransactionId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::LedgerError;
use crate::period::DateRange;

/// Income or expense. Categories carry the same classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money coming in.
    Income,
    /// Money going out.
    Expense,
}

impl TransactionType {
    /// Lowercase name as stored and serialized.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    /// Parses a type for the given request field.
    ///
    /// # Errors
    ///
    /// Returns a validation error on `field` unless the input is `income` or `expense`.
    pub fn parse(field: &'static str, raw: &str) -> Result<Self, LedgerError> {
        match raw {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            _ => Err(LedgerError::validation(field, "type must be 'income' or 'expense'")),
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a stored transaction.
///
/// `Active -> Deleted`; deleted is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Visible and editable.
    Active,
    /// Soft-deleted.
    Deleted,
}

impl TransactionStatus {
    /// Derives the status from the soft-delete marker.
    #[must_use]
    pub const fn from_deleted(is_deleted: bool) -> Self {
        if is_deleted { Self::Deleted } else { Self::Active }
    }

    /// Returns true if the transaction can still be updated or deleted.
    #[must_use]
    pub const fn is_editable(&self) -> bool {
        matches!(self, Self::Active)
    }
}

/// Input for creating a transaction.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    /// Owning family.
    pub family_id: FamilyId,
    /// Account the money moves through.
    pub account_id: AccountId,
    /// Category, must have the same type.
    pub category_id: CategoryId,
    /// Income or expense.
    pub transaction_type: TransactionType,
    /// Entered amount, strictly positive.
    pub amount: Decimal,
    /// Entered currency.
    pub currency: CurrencyCode,
    /// Optional free text.
    pub description: Option<String>,
    /// Calendar date of the transaction, not in the future.
    pub transaction_date: NaiveDate,
    /// Acting user.
    pub actor: UserId,
}

/// Merge patch for an existing transaction.
///
/// `None` means "keep the stored value". `description: Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct TransactionPatch {
    /// New category.
    pub category_id: Option<CategoryId>,
    /// New amount.
    pub amount: Option<Decimal>,
    /// New currency.
    pub currency: Option<CurrencyCode>,
    /// New description, or `Some(None)` to clear.
    pub description: Option<Option<String>>,
    /// New date.
    pub transaction_date: Option<NaiveDate>,
}

impl TransactionPatch {
    /// Applies the patch over a freshly loaded snapshot.
    #[must_use]
    pub fn apply_to(&self, current: &TransactionSnapshot) -> TransactionSnapshot {
        TransactionSnapshot {
            category_id: self.category_id.unwrap_or(current.category_id),
            amount: self.amount.unwrap_or(current.amount),
            currency: self.currency.clone().unwrap_or_else(|| current.currency.clone()),
            description: self
                .description
                .clone()
                .unwrap_or_else(|| current.description.clone()),
            transaction_date: self.transaction_date.unwrap_or(current.transaction_date),
            ..current.clone()
        }
    }
}

/// The stored state of a transaction that posting rules look at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionSnapshot {
    /// Transaction id.
    pub id: TransactionId,
    /// Owning family.
    pub family_id: FamilyId,
    /// Account.
    pub account_id: AccountId,
    /// Category.
    pub category_id: CategoryId,
    /// Income or expense; fixed at creation.
    pub transaction_type: TransactionType,
    /// Entered amount.
    pub amount: Decimal,
    /// Entered currency.
    pub currency: CurrencyCode,
    /// Free text.
    pub description: Option<String>,
    /// Transaction date.
    pub transaction_date: NaiveDate,
    /// Lifecycle status.
    pub status: TransactionStatus,
}

/// Account facts needed to accept a posting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRef {
    /// Account id.
    pub id: AccountId,
    /// Owning family.
    pub family_id: FamilyId,
    /// Soft-delete flag.
    pub is_active: bool,
}

/// Category facts needed to accept a posting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRef {
    /// Category id.
    pub id: CategoryId,
    /// Owning family.
    pub family_id: FamilyId,
    /// Income or expense.
    pub category_type: TransactionType,
}

/// A validated, normalized transaction ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTransaction {
    /// Account.
    pub account_id: AccountId,
    /// Category.
    pub category_id: CategoryId,
    /// Income or expense.
    pub transaction_type: TransactionType,
    /// Entered amount.
    pub amount: Decimal,
    /// Entered currency.
    pub currency: CurrencyCode,
    /// Amount in the family's base currency.
    pub amount_base: Decimal,
    /// Rate used to compute `amount_base`.
    pub exchange_rate: Decimal,
    /// Free text.
    pub description: Option<String>,
    /// Transaction date.
    pub transaction_date: NaiveDate,
}

/// Filters for listing transactions. All supplied filters must match.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionFilter {
    /// Only this type.
    pub transaction_type: Option<TransactionType>,
    /// Only this account.
    pub account_id: Option<AccountId>,
    /// Only dates inside this inclusive range.
    pub date_range: Option<DateRange>,
}
