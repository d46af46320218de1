//! Report data types.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use famledger_shared::types::{AccountId, CategoryId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::TransactionType;

/// Grouped sum for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotal {
    /// Category.
    pub category_id: CategoryId,
    /// Σ `amount_base`.
    pub total: Decimal,
    /// Number of transactions.
    pub count: i64,
}

/// Grouped sum for one transaction type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeTotal {
    /// Income or expense.
    pub transaction_type: TransactionType,
    /// Σ `amount_base`.
    pub total: Decimal,
    /// Number of transactions.
    pub count: i64,
}

/// Reporting period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportPeriod {
    /// First day.
    pub start_date: NaiveDate,
    /// Last day.
    pub end_date: NaiveDate,
}

/// One row of the spending-by-category report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySpending {
    /// Category.
    pub category_id: CategoryId,
    /// Category name, "Unknown" if it could not be loaded.
    pub category_name: String,
    /// Σ `amount_base`.
    pub total_amount: Decimal,
    /// Number of transactions.
    pub transaction_count: i64,
    /// Share of the grand total, 1dp.
    pub percentage: Decimal,
    /// Average amount, 2dp.
    pub average_per_transaction: Decimal,
}

/// Spending-by-category report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpendingByCategoryReport {
    /// Always `spending_by_category`.
    pub report_type: String,
    /// Period covered.
    pub period: ReportPeriod,
    /// Base currency of all amounts.
    pub currency: String,
    /// Type reported on.
    pub transaction_type: TransactionType,
    /// Rows, largest total first.
    pub spending_by_category: Vec<CategorySpending>,
    /// Grand total.
    pub total_amount: Decimal,
    /// Number of transactions.
    pub total_transactions: i64,
    /// Generation time.
    pub generated_at: DateTime<Utc>,
}

/// Income/expense totals for a month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyTotals {
    /// Σ income.
    pub total_income: Decimal,
    /// Σ expenses.
    pub total_expenses: Decimal,
    /// Income minus expenses.
    pub net_savings: Decimal,
    /// Net savings over income, percent, 1dp.
    pub savings_rate: Decimal,
}

/// Balance line for one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalanceLine {
    /// Account.
    pub account_id: AccountId,
    /// Account name.
    pub name: String,
    /// Current balance.
    pub balance: Decimal,
}

/// Balances of all active accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalances {
    /// Per account.
    pub accounts: Vec<AccountBalanceLine>,
    /// Sum of all balances.
    pub total: Decimal,
}

/// Transaction counts per type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionCounts {
    /// Income transactions.
    pub income_transactions: i64,
    /// Expense transactions.
    pub expense_transactions: i64,
    /// Both.
    pub total_transactions: i64,
}

/// Monthly summary report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlySummaryReport {
    /// Always `monthly_summary`.
    pub report_type: String,
    /// `YYYY-MM`.
    pub month: String,
    /// Base currency of all amounts.
    pub currency: String,
    /// Totals.
    pub summary: MonthlyTotals,
    /// Income by category name.
    pub income_breakdown: BTreeMap<String, Decimal>,
    /// Expenses by category name.
    pub expense_breakdown: BTreeMap<String, Decimal>,
    /// Account balances.
    pub account_balances: AccountBalances,
    /// Counts.
    pub transaction_counts: TransactionCounts,
    /// Generation time.
    pub generated_at: DateTime<Utc>,
}
