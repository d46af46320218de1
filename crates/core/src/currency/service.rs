//! Currency service for rounding and conversion.
//!
//! Rounding is half away from zero (`MidpointAwayFromZero`), the usual
//! commercial rule: 0.005 becomes 0.01.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Decimal places for amounts and balances.
pub const AMOUNT_DP: u32 = 2;
/// Decimal places for stored and derived rates.
pub const RATE_DP: u32 = 6;
/// Decimal places for percentages.
pub const PERCENT_DP: u32 = 1;

/// Largest amount a `NUMERIC(15,2)` column holds: 9 999 999 999 999.99.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xA4C6_7FFF, 0x0003_8D7E, 0, false, AMOUNT_DP);

/// Where a conversion rate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateSource {
    /// Same currency, rate is one.
    Identity,
    /// Stored rate for the exact pair.
    Direct,
    /// Inverse of the stored rate for the reverse pair.
    Inverse,
    /// Configured fallback rate.
    Fallback,
}

/// Currency service for conversion operations.
pub struct CurrencyService;

impl CurrencyService {
    /// Converts an amount with a rate, rounded to 2 decimal places.
    ///
    /// Returns `None` if the product does not fit in a `Decimal`.
    ///
    /// # Example
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use famledger_core::currency::CurrencyService;
    ///
    /// assert_eq!(CurrencyService::convert(dec!(10.00), dec!(117.5)), Some(dec!(1175.00)));
    /// ```
    #[must_use]
    pub fn convert(amount: Decimal, rate: Decimal) -> Option<Decimal> {
        amount
            .checked_mul(rate)
            .map(|product| Self::round(product, AMOUNT_DP))
    }

    /// Rounds a value half away from zero.
    #[must_use]
    pub fn round(value: Decimal, decimal_places: u32) -> Decimal {
        value.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointAwayFromZero)
    }

    /// Returns `1 / rate` rounded to 6 decimal places, or `None` for a zero rate.
    #[must_use]
    pub fn invert(rate: Decimal) -> Option<Decimal> {
        Decimal::ONE
            .checked_div(rate)
            .map(|inverse| Self::round(inverse, RATE_DP))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_convert_rounds_to_cents() {
        // 10 EUR at 117.5
        assert_eq!(CurrencyService::convert(dec!(10.00), dec!(117.5)), Some(dec!(1175.00)));
        assert_eq!(CurrencyService::convert(dec!(1.005), Decimal::ONE), Some(dec!(1.01)));
        assert_eq!(CurrencyService::convert(dec!(0.03), dec!(117.5)), Some(dec!(3.53)));
        assert_eq!(CurrencyService::convert(dec!(100), dec!(0.008511)), Some(dec!(0.85)));
    }

    #[test]
    fn test_convert_overflow_is_none() {
        assert_eq!(CurrencyService::convert(Decimal::MAX, dec!(117.5)), None);
        assert_eq!(CurrencyService::convert(Decimal::MAX, dec!(2)), None);
    }

    #[test]
    fn test_rounding_midpoint_away_from_zero() {
        assert_eq!(CurrencyService::round(dec!(2.5), 0), dec!(3));
        assert_eq!(CurrencyService::round(dec!(3.5), 0), dec!(4));
        assert_eq!(CurrencyService::round(dec!(2.25), 1), dec!(2.3));
        assert_eq!(CurrencyService::round(dec!(2.35), 1), dec!(2.4));
        assert_eq!(CurrencyService::round(dec!(-2.5), 0), dec!(-3));
    }

    #[test]
    fn test_max_amount_matches_column_precision() {
        assert_eq!(MAX_AMOUNT, dec!(9999999999999.99));
    }

    #[test]
    fn test_invert() {
        assert_eq!(CurrencyService::invert(dec!(117.5)), Some(dec!(0.008511)));
        assert_eq!(CurrencyService::invert(dec!(2)), Some(dec!(0.5)));
        assert_eq!(CurrencyService::invert(Decimal::ZERO), None);
    }
}
