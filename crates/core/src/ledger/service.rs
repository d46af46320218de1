//! Ledger service: validation and normalization for postings.
//!
//! Pure business logic. The storage layer loads the referenced rows inside
//! its unit of work, hands them in here, and writes whatever comes back.

use chrono::NaiveDate;
use famledger_shared::types::{CurrencyCode, FamilyId};
use rust_decimal::Decimal;

use super::error::LedgerError;
use super::types::{
    AccountRef, CategoryRef, NewTransaction, ResolvedTransaction, TransactionPatch,
    TransactionSnapshot,
};
use super::validation::{
    check_account, check_category, check_editable, validate_amount, validate_date,
};
use crate::currency::{CurrencyAllowList, MoneyNormalizer, RatePolicy};

/// Family-level facts every posting is checked against.
#[derive(Debug, Clone, Copy)]
pub struct PostingRules<'a> {
    /// The family's base currency.
    pub base_currency: &'a CurrencyCode,
    /// Accepted currencies.
    pub currencies: &'a CurrencyAllowList,
    /// The current date; later dates are rejected.
    pub today: NaiveDate,
}

/// Ledger service for transaction validation and resolution.
pub struct LedgerService;

impl LedgerService {
    /// Checks the fields of a new transaction that need no lookups:
    /// amount, date, then currency.
    ///
    /// # Errors
    ///
    /// Returns the first failing rule.
    fn validate_new(input: &NewTransaction, rules: &PostingRules<'_>) -> Result<(), LedgerError> {
        validate_amount(input.amount)?;
        validate_date(input.transaction_date, rules.today)?;
        rules.currencies.check("currency", &input.currency)
    }

    /// Validates and resolves a new transaction.
    ///
    /// 1. Amount, date and currency rules
    /// 2. Account is active and in the family
    /// 3. Category is in the family with the same type
    /// 4. Amount normalized to base currency with a strict rate policy
    ///
    /// # Errors
    ///
    /// Returns `LedgerError` for the first failing step; `RateUnavailable`
    /// when a foreign-currency amount has no rate on its date.
    pub fn prepare_create<R>(
        input: &NewTransaction,
        rules: &PostingRules<'_>,
        account: Option<&AccountRef>,
        category: Option<&CategoryRef>,
        rate_lookup: R,
    ) -> Result<ResolvedTransaction, LedgerError>
    where
        R: FnOnce(&CurrencyCode, &CurrencyCode, NaiveDate) -> Option<Decimal>,
    {
        Self::validate_new(input, rules)?;
        check_account(account, input.account_id, input.family_id)?;
        check_category(category, input.category_id, input.family_id, input.transaction_type)?;

        let normalized = MoneyNormalizer::normalize(
            input.amount,
            &input.currency,
            rules.base_currency,
            input.transaction_date,
            &RatePolicy::Strict,
            rate_lookup,
        )?;

        Ok(ResolvedTransaction {
            account_id: input.account_id,
            category_id: input.category_id,
            transaction_type: input.transaction_type,
            amount: input.amount,
            currency: input.currency.clone(),
            amount_base: normalized.amount_base,
            exchange_rate: normalized.rate,
            description: input.description.clone(),
            transaction_date: input.transaction_date,
        })
    }

    /// Checks the supplied fields of a patch. Omitted fields are not re-checked.
    ///
    /// # Errors
    ///
    /// Returns the first failing rule.
    pub fn validate_patch(patch: &TransactionPatch, rules: &PostingRules<'_>) -> Result<(), LedgerError> {
        if let Some(amount) = patch.amount {
            validate_amount(amount)?;
        }
        if let Some(date) = patch.transaction_date {
            validate_date(date, rules.today)?;
        }
        if let Some(currency) = &patch.currency {
            rules.currencies.check("currency", currency)?;
        }
        Ok(())
    }

    /// Merges a patch onto the current row and resolves the result.
    ///
    /// `amount_base` is always recomputed from the merged amount, currency
    /// and date. `category` must be supplied when the patch changes it.
    ///
    /// # Errors
    ///
    /// Returns `TransactionNotFound` for deleted or foreign rows, otherwise
    /// the first failing rule.
    pub fn prepare_update<R>(
        current: &TransactionSnapshot,
        patch: &TransactionPatch,
        family_id: FamilyId,
        rules: &PostingRules<'_>,
        category: Option<&CategoryRef>,
        rate_lookup: R,
    ) -> Result<ResolvedTransaction, LedgerError>
    where
        R: FnOnce(&CurrencyCode, &CurrencyCode, NaiveDate) -> Option<Decimal>,
    {
        check_editable(current, family_id)?;
        Self::validate_patch(patch, rules)?;
        if let Some(category_id) = patch.category_id {
            check_category(category, category_id, family_id, current.transaction_type)?;
        }

        let merged = patch.apply_to(current);
        let normalized = MoneyNormalizer::normalize(
            merged.amount,
            &merged.currency,
            rules.base_currency,
            merged.transaction_date,
            &RatePolicy::Strict,
            rate_lookup,
        )?;

        Ok(ResolvedTransaction {
            account_id: merged.account_id,
            category_id: merged.category_id,
            transaction_type: merged.transaction_type,
            amount: merged.amount,
            currency: merged.currency,
            amount_base: normalized.amount_base,
            exchange_rate: normalized.rate,
            description: merged.description,
            transaction_date: merged.transaction_date,
        })
    }

    /// Checks that a transaction may be soft-deleted.
    ///
    /// # Errors
    ///
    /// Returns `TransactionNotFound` if already deleted or foreign.
    pub fn prepare_delete(current: &TransactionSnapshot, family_id: FamilyId) -> Result<(), LedgerError> {
        check_editable(current, family_id)
    }
}
