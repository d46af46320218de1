//! Normalization of entered amounts into a family's base currency.

use chrono::NaiveDate;
use famledger_shared::types::CurrencyCode;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::service::{CurrencyService, MAX_AMOUNT, RATE_DP, RateSource};
use crate::ledger::LedgerError;

/// A fixed rate for one currency pair, used when no stored rate exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackRate {
    /// Source currency.
    pub from: CurrencyCode,
    /// Target currency.
    pub to: CurrencyCode,
    /// `1 from = rate to`.
    pub rate: Decimal,
}

impl FallbackRate {
    /// Rate for `from -> to` if this fallback covers the pair in either
    /// direction. The reverse direction uses the inverted rate.
    #[must_use]
    pub fn rate_for(&self, from: &CurrencyCode, to: &CurrencyCode) -> Option<Decimal> {
        if &self.from == from && &self.to == to {
            Some(self.rate)
        } else if &self.from == to && &self.to == from {
            CurrencyService::invert(self.rate)
        } else {
            None
        }
    }
}

/// What to do when the resolver has no rate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RatePolicy {
    /// Fail with `RateUnavailable`. Used when posting.
    Strict,
    /// Use the configured fallback. Used by reporting and conversion.
    Fallback(FallbackRate),
}

/// Converted amount plus the rate that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Normalized {
    /// Amount in the target currency.
    pub amount_base: Decimal,
    /// Rate applied (one for same-currency amounts).
    pub rate: Decimal,
    /// Provenance of `rate`.
    pub source: RateSource,
}

/// Converts entered amounts into base currency.
pub struct MoneyNormalizer;

impl MoneyNormalizer {
    /// Normalizes `amount` in `currency` to `base` as of `as_of`.
    ///
    /// Same-currency amounts come back unchanged without consulting
    /// `lookup`. Otherwise the looked-up rate is applied and the result
    /// rounded to 2 decimal places.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::RateUnavailable` when no rate is found and
    /// the policy offers no fallback for the pair, or a validation error on
    /// `amount` when the converted value is out of range.
    pub fn normalize<F>(
        amount: Decimal,
        currency: &CurrencyCode,
        base: &CurrencyCode,
        as_of: NaiveDate,
        policy: &RatePolicy,
        lookup: F,
    ) -> Result<Normalized, LedgerError>
    where
        F: FnOnce(&CurrencyCode, &CurrencyCode, NaiveDate) -> Option<Decimal>,
    {
        if currency == base {
            return Ok(Self::identity(amount));
        }

        let stored = lookup(currency, base, as_of).map(|rate| (rate, RateSource::Direct));
        let (rate, source) = Self::resolve(currency, base, as_of, policy, stored)?;
        Self::apply(amount, rate, source)
    }

    /// Converts `amount` from `from` to `to` for display.
    ///
    /// Preference order: identity, the direct stored rate, the inverse of
    /// the reverse stored rate, then whatever `policy` offers. Rates are
    /// rounded to 6 decimal places before use.
    ///
    /// # Errors
    ///
    /// Same as [`MoneyNormalizer::normalize`].
    pub fn quote(
        amount: Decimal,
        from: &CurrencyCode,
        to: &CurrencyCode,
        as_of: NaiveDate,
        direct: Option<Decimal>,
        reverse: Option<Decimal>,
        policy: &RatePolicy,
    ) -> Result<Normalized, LedgerError> {
        if from == to {
            return Ok(Self::identity(amount));
        }

        let stored = direct
            .map(|rate| (CurrencyService::round(rate, RATE_DP), RateSource::Direct))
            .or_else(|| {
                reverse
                    .and_then(CurrencyService::invert)
                    .map(|rate| (rate, RateSource::Inverse))
            });
        let (rate, source) = Self::resolve(from, to, as_of, policy, stored)?;
        Self::apply(amount, rate, source)
    }

    const fn identity(amount: Decimal) -> Normalized {
        Normalized {
            amount_base: amount,
            rate: Decimal::ONE,
            source: RateSource::Identity,
        }
    }

    fn resolve(
        from: &CurrencyCode,
        to: &CurrencyCode,
        as_of: NaiveDate,
        policy: &RatePolicy,
        stored: Option<(Decimal, RateSource)>,
    ) -> Result<(Decimal, RateSource), LedgerError> {
        stored
            .or_else(|| match policy {
                RatePolicy::Strict => None,
                RatePolicy::Fallback(fallback) => fallback
                    .rate_for(from, to)
                    .map(|rate| (CurrencyService::round(rate, RATE_DP), RateSource::Fallback)),
            })
            .ok_or_else(|| LedgerError::RateUnavailable {
                from: from.clone(),
                to: to.clone(),
                date: as_of,
            })
    }

    fn apply(amount: Decimal, rate: Decimal, source: RateSource) -> Result<Normalized, LedgerError> {
        let amount_base = CurrencyService::convert(amount, rate)
            .filter(|converted| converted.abs() <= MAX_AMOUNT)
            .ok_or_else(|| LedgerError::validation("amount", "amount is too large to convert"))?;

        Ok(Normalized {
            amount_base,
            rate,
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::cell::Cell;

    fn code(s: &str) -> CurrencyCode {
        CurrencyCode::parse(s).unwrap()
    }

    fn jan1() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn eur_rsd_fallback() -> RatePolicy {
        RatePolicy::Fallback(FallbackRate {
            from: code("EUR"),
            to: code("RSD"),
            rate: dec!(117.5),
        })
    }

    #[test]
    fn test_same_currency_skips_lookup() {
        let called = Cell::new(false);
        let result = MoneyNormalizer::normalize(
            dec!(123.456),
            &code("RSD"),
            &code("RSD"),
            jan1(),
            &RatePolicy::Strict,
            |_, _, _| {
                called.set(true);
                None
            },
        )
        .unwrap();

        assert!(!called.get());
        assert_eq!(result.amount_base, dec!(123.456));
        assert_eq!(result.rate, Decimal::ONE);
    }

    #[test]
    fn test_eur_to_rsd_scenario() {
        let result = MoneyNormalizer::normalize(
            dec!(10.00),
            &code("EUR"),
            &code("RSD"),
            jan1(),
            &RatePolicy::Strict,
            |_, _, _| Some(dec!(117.50)),
        )
        .unwrap();
        assert_eq!(result.amount_base, dec!(1175.00));
    }

    #[test]
    fn test_lookup_receives_pair_and_date() {
        let result = MoneyNormalizer::normalize(
            dec!(1),
            &code("EUR"),
            &code("RSD"),
            jan1(),
            &RatePolicy::Strict,
            |from, to, date| {
                assert_eq!(from.as_str(), "EUR");
                assert_eq!(to.as_str(), "RSD");
                assert_eq!(date, jan1());
                Some(dec!(2))
            },
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_strict_policy_fails_without_rate() {
        let err = MoneyNormalizer::normalize(
            dec!(10),
            &code("EUR"),
            &code("RSD"),
            jan1(),
            &RatePolicy::Strict,
            |_, _, _| None,
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::RateUnavailable { .. }));
    }

    #[test]
    fn test_fallback_policy_uses_configured_rate() {
        let result = MoneyNormalizer::normalize(
            dec!(10),
            &code("EUR"),
            &code("RSD"),
            jan1(),
            &eur_rsd_fallback(),
            |_, _, _| None,
        )
        .unwrap();
        assert_eq!(result.amount_base, dec!(1175.00));
    }

    #[test]
    fn test_fallback_reverse_direction_inverts() {
        let result = MoneyNormalizer::normalize(
            dec!(1175),
            &code("RSD"),
            &code("EUR"),
            jan1(),
            &eur_rsd_fallback(),
            |_, _, _| None,
        )
        .unwrap();
        assert_eq!(result.rate, dec!(0.008511));
        assert_eq!(result.amount_base, dec!(10.00));
    }

    #[test]
    fn test_fallback_does_not_cover_other_pairs() {
        let err = MoneyNormalizer::normalize(
            dec!(10),
            &code("USD"),
            &code("RSD"),
            jan1(),
            &eur_rsd_fallback(),
            |_, _, _| None,
        )
        .unwrap_err();
        assert_eq!(err.error_code(), "RATE_UNAVAILABLE");
    }

    #[test]
    fn test_converted_amount_over_limit_is_rejected() {
        let err = MoneyNormalizer::normalize(
            dec!(9999999999999.99),
            &code("EUR"),
            &code("RSD"),
            jan1(),
            &RatePolicy::Strict,
            |_, _, _| Some(dec!(117.5)),
        )
        .unwrap_err();
        assert_eq!(err.field(), Some("amount"));
    }

    #[test]
    fn test_decimal_overflow_is_a_validation_error() {
        let err = MoneyNormalizer::normalize(
            Decimal::MAX,
            &code("EUR"),
            &code("RSD"),
            jan1(),
            &eur_rsd_fallback(),
            |_, _, _| None,
        )
        .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        assert_eq!(err.field(), Some("amount"));
    }

    #[test]
    fn test_midpoint_rounds_away_from_zero() {
        let result = MoneyNormalizer::normalize(
            dec!(0.03),
            &code("EUR"),
            &code("RSD"),
            jan1(),
            &RatePolicy::Strict,
            |_, _, _| Some(dec!(117.5)),
        )
        .unwrap();
        assert_eq!(result.amount_base, dec!(3.53));
        assert_eq!(result.source, RateSource::Direct);
    }

    #[test]
    fn test_quote_same_currency() {
        let q = MoneyNormalizer::quote(dec!(42.42), &code("RSD"), &code("RSD"), jan1(), None, None, &RatePolicy::Strict)
            .unwrap();
        assert_eq!(q.amount_base, dec!(42.42));
        assert_eq!(q.rate, Decimal::ONE);
        assert_eq!(q.source, RateSource::Identity);
    }

    #[test]
    fn test_quote_prefers_direct_rate() {
        let q = MoneyNormalizer::quote(
            dec!(10),
            &code("EUR"),
            &code("RSD"),
            jan1(),
            Some(dec!(117.2)),
            Some(dec!(0.0085)),
            &eur_rsd_fallback(),
        )
        .unwrap();
        assert_eq!(q.amount_base, dec!(1172.00));
        assert_eq!(q.source, RateSource::Direct);
    }

    #[test]
    fn test_quote_inverts_reverse_rate() {
        // RSD -> EUR with only EUR -> RSD stored
        let q = MoneyNormalizer::quote(
            dec!(1175),
            &code("RSD"),
            &code("EUR"),
            jan1(),
            None,
            Some(dec!(117.5)),
            &RatePolicy::Strict,
        )
        .unwrap();
        assert_eq!(q.rate, dec!(0.008511));
        assert_eq!(q.amount_base, dec!(10.00));
        assert_eq!(q.source, RateSource::Inverse);
    }

    #[test]
    fn test_quote_fallback_and_strict() {
        let q = MoneyNormalizer::quote(dec!(2), &code("EUR"), &code("RSD"), jan1(), None, None, &eur_rsd_fallback())
            .unwrap();
        assert_eq!(q.amount_base, dec!(235.00));
        assert_eq!(q.source, RateSource::Fallback);

        let err = MoneyNormalizer::quote(dec!(2), &code("EUR"), &code("RSD"), jan1(), None, None, &RatePolicy::Strict)
            .unwrap_err();
        assert!(matches!(err, LedgerError::RateUnavailable { .. }));
    }
}
