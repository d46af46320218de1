//! Account balance derivation.
//!
//! Balances are not stored. They are computed from the initial balance and
//! the base-currency sums of non-deleted transactions on the account.

use chrono::NaiveDate;
use famledger_shared::types::AccountId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::types::TransactionType;
use crate::currency::service::{AMOUNT_DP, CurrencyService};

/// Per-type sums for one account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccountFlows {
    /// Σ income `amount_base`.
    pub income: Decimal,
    /// Σ expense `amount_base`.
    pub expense: Decimal,
    /// Date of the latest non-deleted transaction.
    pub last_transaction_date: Option<NaiveDate>,
}

impl AccountFlows {
    /// Adds one grouped sum.
    pub fn add(&mut self, transaction_type: TransactionType, total: Decimal) {
        match transaction_type {
            TransactionType::Income => self.income += total,
            TransactionType::Expense => self.expense += total,
        }
    }
}

/// Derived balance of one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    /// The account ID.
    pub account_id: AccountId,
    /// Opening balance entered at account creation.
    pub initial_balance: Decimal,
    /// Σ income.
    pub total_income: Decimal,
    /// Σ expense.
    pub total_expense: Decimal,
    /// `initial + income - expense`, 2dp.
    pub current_balance: Decimal,
    /// Date of the latest transaction, if any.
    pub last_transaction_date: Option<NaiveDate>,
}

impl AccountBalance {
    /// Derives the balance from the opening balance and flows.
    #[must_use]
    pub fn derive(account_id: AccountId, initial_balance: Decimal, flows: AccountFlows) -> Self {
        let current = initial_balance + flows.income - flows.expense;
        Self {
            account_id,
            initial_balance,
            total_income: flows.income,
            total_expense: flows.expense,
            current_balance: CurrencyService::round(current, AMOUNT_DP),
            last_transaction_date: flows.last_transaction_date,
        }
    }
}

/// Sum of current balances.
#[must_use]
pub fn total_balance<'a, I>(balances: I) -> Decimal
where
    I: IntoIterator<Item = &'a AccountBalance>,
{
    balances.into_iter().map(|b| b.current_balance).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_no_transactions_is_initial_balance() {
        let balance = AccountBalance::derive(AccountId::new(), dec!(500.00), AccountFlows::default());
        assert_eq!(balance.current_balance, dec!(500.00));
        assert_eq!(balance.last_transaction_date, None);
    }

    #[test]
    fn test_income_adds_expense_subtracts() {
        let mut flows = AccountFlows::default();
        flows.add(TransactionType::Income, dec!(1000.00));
        flows.add(TransactionType::Expense, dec!(250.50));
        flows.add(TransactionType::Expense, dec!(49.50));

        let balance = AccountBalance::derive(AccountId::new(), dec!(100.00), flows);
        assert_eq!(balance.total_expense, dec!(300.00));
        assert_eq!(balance.current_balance, dec!(800.00));
    }

    #[test]
    fn test_balance_can_go_negative() {
        let mut flows = AccountFlows::default();
        flows.add(TransactionType::Expense, dec!(75));
        let balance = AccountBalance::derive(AccountId::new(), dec!(50), flows);
        assert_eq!(balance.current_balance, dec!(-25));
    }

    #[test]
    fn test_total_balance() {
        let a = AccountBalance::derive(AccountId::new(), dec!(10), AccountFlows::default());
        let b = AccountBalance::derive(AccountId::new(), dec!(15.25), AccountFlows::default());
        assert_eq!(total_balance([&a, &b]), dec!(25.25));
    }
}
