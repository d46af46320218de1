//! Currency handling: rounding, rate resolution and normalization to a
//! family's base currency.

pub mod allow_list;
pub mod exchange;
pub mod normalizer;
pub mod service;

#[cfg(test)]
mod props;

pub use allow_list::CurrencyAllowList;
pub use exchange::{ExchangeRate, RateResolver};
pub use normalizer::{FallbackRate, MoneyNormalizer, Normalized, RatePolicy};
pub use service::{CurrencyService, MAX_AMOUNT, RateSource};
