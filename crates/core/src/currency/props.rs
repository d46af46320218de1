//! Property-based tests for currency normalization.

use chrono::NaiveDate;
use famledger_shared::types::CurrencyCode;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::exchange::{ExchangeRate, RateResolver};
use super::normalizer::{MoneyNormalizer, RatePolicy};
use super::service::CurrencyService;

/// Positive amounts with cent precision (0.01 to 1,000,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Positive rates with 4 decimal places (0.0001 to 10000.0000).
fn positive_rate() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|v| Decimal::new(v, 4))
}

/// Days offset from 2020-01-01.
fn day_offset() -> impl Strategy<Value = i64> {
    0i64..2000
}

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
}

fn code(s: &str) -> CurrencyCode {
    CurrencyCode::parse(s).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Same-currency normalization returns the entered amount exactly.
    #[test]
    fn prop_same_currency_is_identity(amount in positive_amount()) {
        let result = MoneyNormalizer::normalize(
            amount, &code("RSD"), &code("RSD"), base_date(), &RatePolicy::Strict, |_, _, _| None,
        ).unwrap();
        prop_assert_eq!(result.amount_base, amount);
    }

    /// Foreign amounts come back as round(amount * rate, 2).
    #[test]
    fn prop_foreign_amount_is_rounded_product(amount in positive_amount(), rate in positive_rate()) {
        let result = MoneyNormalizer::normalize(
            amount, &code("EUR"), &code("RSD"), base_date(), &RatePolicy::Strict, |_, _, _| Some(rate),
        ).unwrap();
        prop_assert_eq!(result.amount_base, CurrencyService::round(amount * rate, 2));
        prop_assert!(result.amount_base.scale() <= 2);
    }

    /// Strict policy never invents a rate.
    #[test]
    fn prop_strict_without_rate_always_fails(amount in positive_amount()) {
        let result = MoneyNormalizer::normalize(
            amount, &code("EUR"), &code("RSD"), base_date(), &RatePolicy::Strict, |_, _, _| None,
        );
        prop_assert!(result.is_err());
    }

    /// The resolved rate is never dated after the query date, and no
    /// other rate for the pair sits between it and the query date.
    #[test]
    fn prop_resolver_returns_latest_not_after(
        offsets in prop::collection::btree_set(day_offset(), 1..20),
        query in day_offset(),
    ) {
        let rates: Vec<ExchangeRate> = offsets
            .iter()
            .map(|o| ExchangeRate::new(
                code("EUR"),
                code("RSD"),
                Decimal::from(100 + o),
                base_date() + chrono::Duration::days(*o),
            ).unwrap())
            .collect();
        let as_of = base_date() + chrono::Duration::days(query);

        match RateResolver::latest(&rates, &code("EUR"), &code("RSD"), as_of) {
            Some(found) => {
                prop_assert!(found.effective_date <= as_of);
                prop_assert!(rates
                    .iter()
                    .all(|r| r.effective_date <= found.effective_date || r.effective_date > as_of));
            }
            None => prop_assert!(rates.iter().all(|r| r.effective_date > as_of)),
        }
    }

    /// Inverting a rate and converting back lands within a cent per 100 units.
    #[test]
    fn prop_invert_roundtrip_close(rate in (100i64..10_000_000i64).prop_map(|v| Decimal::new(v, 4))) {
        let inverse = CurrencyService::invert(rate).unwrap();
        let forward = CurrencyService::convert(Decimal::from(100), rate).unwrap();
        let back = CurrencyService::convert(forward, inverse).unwrap();
        prop_assert!((back - Decimal::from(100)).abs() <= Decimal::ONE);
    }
}
