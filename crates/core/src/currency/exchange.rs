//! Exchange rate types and the latest-as-of-date resolver.

use chrono::NaiveDate;
use famledger_shared::types::CurrencyCode;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::LedgerError;

/// Exchange rate between two currencies on a date.
///
/// `1 from_currency = rate to_currency`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRate {
    /// Source currency code.
    pub from_currency: CurrencyCode,
    /// Target currency code.
    pub to_currency: CurrencyCode,
    /// Exchange rate.
    pub rate: Decimal,
    /// Date this rate is effective.
    pub effective_date: NaiveDate,
}

impl ExchangeRate {
    /// Creates an exchange rate after checking it is usable.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the rate is not positive or both
    /// currencies are the same.
    pub fn new(
        from_currency: CurrencyCode,
        to_currency: CurrencyCode,
        rate: Decimal,
        effective_date: NaiveDate,
    ) -> Result<Self, LedgerError> {
        if rate <= Decimal::ZERO {
            return Err(LedgerError::validation("rate", "rate must be greater than zero"));
        }
        if from_currency == to_currency {
            return Err(LedgerError::validation(
                "to_currency",
                "source and target currencies must differ",
            ));
        }
        Ok(Self {
            from_currency,
            to_currency,
            rate,
            effective_date,
        })
    }

    /// Returns true if this rate converts `from -> to`.
    #[must_use]
    pub fn is_pair(&self, from: &CurrencyCode, to: &CurrencyCode) -> bool {
        &self.from_currency == from && &self.to_currency == to
    }
}

/// Resolves the rate in effect on a date.
pub struct RateResolver;

impl RateResolver {
    /// Returns the most recent rate for the exact pair with
    /// `effective_date <= as_of`.
    ///
    /// No inversion or triangulation: a rate for `to -> from` does not
    /// answer a `from -> to` query.
    #[must_use]
    pub fn latest<'a>(
        rates: &'a [ExchangeRate],
        from: &CurrencyCode,
        to: &CurrencyCode,
        as_of: NaiveDate,
    ) -> Option<&'a ExchangeRate> {
        rates
            .iter()
            .filter(|r| r.is_pair(from, to) && r.effective_date <= as_of)
            .max_by_key(|r| r.effective_date)
    }
}
