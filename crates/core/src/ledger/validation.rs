//! Business rule checks for postings.
//!
//! Each check is independent so callers can run them in the documented
//! order: amount, date, currency, account, category.

use chrono::NaiveDate;
use famledger_shared::types::{AccountId, CategoryId, FamilyId};
use rust_decimal::Decimal;

use super::error::LedgerError;
use crate::currency::service::{AMOUNT_DP, MAX_AMOUNT};
use super::types::{AccountRef, CategoryRef, TransactionSnapshot, TransactionType};

/// Accepts positive amounts that fit a `NUMERIC(15,2)` column.
///
/// # Errors
///
/// Returns `LedgerError::InvalidAmount` unless `amount > 0`, and a
/// validation error on `amount` for sub-cent precision or values above
/// [`MAX_AMOUNT`].
pub fn validate_amount(amount: Decimal) -> Result<(), LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount);
    }
    if amount.normalize().scale() > AMOUNT_DP {
        return Err(LedgerError::validation(
            "amount",
            "amount must have at most 2 decimal places",
        ));
    }
    if amount > MAX_AMOUNT {
        return Err(LedgerError::validation(
            "amount",
            "amount must not exceed 9999999999999.99",
        ));
    }
    Ok(())
}

/// Rejects dates strictly after `today`.
///
/// # Errors
///
/// Returns `LedgerError::InvalidDate` for future dates.
pub fn validate_date(date: NaiveDate, today: NaiveDate) -> Result<(), LedgerError> {
    if date > today {
        Err(LedgerError::InvalidDate(date))
    } else {
        Ok(())
    }
}

/// Accepts only an active account of the same family.
///
/// Missing, inactive and foreign accounts are indistinguishable to the caller.
///
/// # Errors
///
/// Returns `LedgerError::AccountNotFound`.
pub fn check_account(
    account: Option<&AccountRef>,
    id: AccountId,
    family_id: FamilyId,
) -> Result<(), LedgerError> {
    match account {
        Some(a) if a.is_active && a.family_id == family_id => Ok(()),
        _ => Err(LedgerError::AccountNotFound(id)),
    }
}

/// Accepts a category of the same family and the same type.
///
/// # Errors
///
/// Returns `LedgerError::CategoryNotFound` for missing or foreign
/// categories and `LedgerError::CategoryTypeMismatch` otherwise.
pub fn check_category(
    category: Option<&CategoryRef>,
    id: CategoryId,
    family_id: FamilyId,
    transaction_type: TransactionType,
) -> Result<(), LedgerError> {
    let category = category
        .filter(|c| c.family_id == family_id)
        .ok_or(LedgerError::CategoryNotFound(id))?;

    if category.category_type != transaction_type {
        return Err(LedgerError::CategoryTypeMismatch {
            category_type: category.category_type.to_string(),
            transaction_type: transaction_type.to_string(),
        });
    }
    Ok(())
}

/// Accepts only an active transaction of the same family.
///
/// # Errors
///
/// Returns `LedgerError::TransactionNotFound` for deleted or foreign rows.
pub fn check_editable(current: &TransactionSnapshot, family_id: FamilyId) -> Result<(), LedgerError> {
    if current.family_id == family_id && current.status.is_editable() {
        Ok(())
    } else {
        Err(LedgerError::TransactionNotFound(current.id))
    }
}
