//! Account rules.

use famledger_shared::types::CurrencyCode;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::LedgerError;
use crate::currency::CurrencyAllowList;

/// Kind of money holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// Physical cash.
    Cash,
    /// Checking (current) account.
    Checking,
    /// Savings account.
    Savings,
}

impl AccountType {
    /// Lowercase name as stored and serialized.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Checking => "checking",
            Self::Savings => "savings",
        }
    }

    /// Parses an account type for the `type` field.
    ///
    /// # Errors
    ///
    /// Returns a validation error on `type` for unknown values.
    pub fn parse(raw: &str) -> Result<Self, LedgerError> {
        match raw {
            "cash" => Ok(Self::Cash),
            "checking" => Ok(Self::Checking),
            "savings" => Ok(Self::Savings),
            _ => Err(LedgerError::validation(
                "type",
                "type must be one of cash, checking, savings",
            )),
        }
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validates the fields of a new account and returns its parsed currency.
///
/// # Errors
///
/// Returns a validation error on `name`, `currency` or `initial_balance`.
pub fn validate_new_account(
    name: &str,
    currency: &str,
    initial_balance: Decimal,
    currencies: &CurrencyAllowList,
) -> Result<CurrencyCode, LedgerError> {
    validate_name(name)?;
    let currency = currencies.parse("currency", currency)?;
    if initial_balance < Decimal::ZERO {
        return Err(LedgerError::validation(
            "initial_balance",
            "initial_balance cannot be negative",
        ));
    }
    Ok(currency)
}

/// Validates an account or category display name.
///
/// # Errors
///
/// Returns a validation error on `name` if blank or over 100 characters.
pub fn validate_name(name: &str) -> Result<(), LedgerError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::validation("name", "name is required"));
    }
    if trimmed.chars().count() > 100 {
        return Err(LedgerError::validation("name", "name must be at most 100 characters"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case("cash", AccountType::Cash)]
    #[case("checking", AccountType::Checking)]
    #[case("savings", AccountType::Savings)]
    fn test_parse_account_type(#[case] raw: &str, #[case] expected: AccountType) {
        assert_eq!(AccountType::parse(raw).unwrap(), expected);
        assert_eq!(expected.as_str(), raw);
    }

    #[test]
    fn test_parse_unknown_account_type() {
        assert_eq!(AccountType::parse("credit").unwrap_err().field(), Some("type"));
    }

    #[test]
    fn test_validate_new_account() {
        let currencies = CurrencyAllowList::new(["RSD", "EUR"]).unwrap();
        let code = validate_new_account("Wallet", "eur", dec!(0), &currencies).unwrap();
        assert_eq!(code.as_str(), "EUR");

        let err = validate_new_account("Wallet", "RSD", dec!(-1), &currencies).unwrap_err();
        assert_eq!(err.field(), Some("initial_balance"));

        let err = validate_new_account("  ", "RSD", dec!(1), &currencies).unwrap_err();
        assert_eq!(err.field(), Some("name"));

        let err = validate_new_account("Wallet", "USD", dec!(1), &currencies).unwrap_err();
        assert_eq!(err.field(), Some("currency"));
    }
}
