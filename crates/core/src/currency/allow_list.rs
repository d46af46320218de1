//! Configurable set of accepted currency codes.

use famledger_shared::types::CurrencyCode;

use crate::ledger::LedgerError;

/// Currencies accounts and transactions may use.
#[derive(Debug, Clone)]
pub struct CurrencyAllowList {
    codes: Vec<CurrencyCode>,
}

impl CurrencyAllowList {
    /// Builds the list from configured code strings.
    ///
    /// # Errors
    ///
    /// Returns a validation error on `currency` if a configured code is malformed.
    pub fn new<I, S>(codes: I) -> Result<Self, LedgerError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut parsed = Vec::new();
        for code in codes {
            let code = CurrencyCode::parse(code.as_ref())
                .map_err(|e| LedgerError::validation("currency", e.to_string()))?;
            if !parsed.contains(&code) {
                parsed.push(code);
            }
        }
        Ok(Self { codes: parsed })
    }

    /// Parses `raw` and checks it against the list.
    ///
    /// # Errors
    ///
    /// Returns a validation error on `field` for malformed or unlisted codes.
    pub fn parse(&self, field: &'static str, raw: &str) -> Result<CurrencyCode, LedgerError> {
        let code = CurrencyCode::parse(raw).map_err(|_| self.rejection(field))?;
        self.check(field, &code)?;
        Ok(code)
    }

    /// Checks an already-parsed code.
    ///
    /// # Errors
    ///
    /// Returns a validation error on `field` if the code is not listed.
    pub fn check(&self, field: &'static str, code: &CurrencyCode) -> Result<(), LedgerError> {
        if self.contains(code) {
            Ok(())
        } else {
            Err(self.rejection(field))
        }
    }

    /// Returns true if the code is listed.
    #[must_use]
    pub fn contains(&self, code: &CurrencyCode) -> bool {
        self.codes.contains(code)
    }

    /// Listed codes in configuration order.
    #[must_use]
    pub fn codes(&self) -> &[CurrencyCode] {
        &self.codes
    }

    fn rejection(&self, field: &'static str) -> LedgerError {
        let listed: Vec<&str> = self.codes.iter().map(CurrencyCode::as_str).collect();
        LedgerError::validation(field, format!("currency must be one of {}", listed.join(", ")))
    }
}
