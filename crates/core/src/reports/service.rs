//! Report generation service.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use famledger_shared::types::CategoryId;
use rust_decimal::Decimal;

use super::types::{
    AccountBalanceLine, AccountBalances, CategorySpending, CategoryTotal, MonthlySummaryReport,
    MonthlyTotals, ReportPeriod, SpendingByCategoryReport, TransactionCounts, TypeTotal,
};
use crate::currency::service::{AMOUNT_DP, CurrencyService, PERCENT_DP};
use crate::ledger::TransactionType;
use crate::period::DateRange;

const UNKNOWN_CATEGORY: &str = "Unknown";

/// Inputs for the monthly summary.
#[derive(Debug, Clone)]
pub struct MonthlySummaryInput {
    /// The month.
    pub range: DateRange,
    /// Family base currency.
    pub currency: String,
    /// Grouped sums by type.
    pub by_type: Vec<TypeTotal>,
    /// Income sums by category.
    pub income_by_category: Vec<CategoryTotal>,
    /// Expense sums by category.
    pub expense_by_category: Vec<CategoryTotal>,
    /// Active accounts with derived balances.
    pub accounts: Vec<AccountBalanceLine>,
}

/// Service for generating reports from grouped sums.
pub struct ReportService;

impl ReportService {
    /// `part / total * 100`, 1dp; zero when `total` is zero.
    #[must_use]
    pub fn percentage(part: Decimal, total: Decimal) -> Decimal {
        if total.is_zero() {
            return Decimal::ZERO;
        }
        CurrencyService::round(part / total * Decimal::ONE_HUNDRED, PERCENT_DP)
    }

    /// `total / count`, 2dp; zero when `count` is zero.
    #[must_use]
    pub fn average_per_transaction(total: Decimal, count: i64) -> Decimal {
        if count == 0 {
            return Decimal::ZERO;
        }
        CurrencyService::round(total / Decimal::from(count), AMOUNT_DP)
    }

    /// Net savings and savings rate (percent of income, 1dp).
    #[must_use]
    pub fn savings(total_income: Decimal, total_expenses: Decimal) -> MonthlyTotals {
        let net_savings = total_income - total_expenses;
        MonthlyTotals {
            total_income,
            total_expenses,
            net_savings,
            savings_rate: Self::percentage(net_savings, total_income),
        }
    }

    /// Builds the spending-by-category report.
    ///
    /// Rows are sorted by total descending, then by name.
    #[must_use]
    pub fn spending_by_category<N>(
        totals: Vec<CategoryTotal>,
        range: DateRange,
        transaction_type: TransactionType,
        currency: &str,
        name_of: N,
        generated_at: DateTime<Utc>,
    ) -> SpendingByCategoryReport
    where
        N: Fn(CategoryId) -> Option<String>,
    {
        let total_amount: Decimal = totals.iter().map(|t| t.total).sum();
        let total_transactions: i64 = totals.iter().map(|t| t.count).sum();

        let mut rows: Vec<CategorySpending> = totals
            .into_iter()
            .map(|t| CategorySpending {
                category_name: name_of(t.category_id).unwrap_or_else(|| UNKNOWN_CATEGORY.to_string()),
                category_id: t.category_id,
                percentage: Self::percentage(t.total, total_amount),
                average_per_transaction: Self::average_per_transaction(t.total, t.count),
                total_amount: t.total,
                transaction_count: t.count,
            })
            .collect();
        rows.sort_by(|a, b| {
            b.total_amount
                .cmp(&a.total_amount)
                .then_with(|| a.category_name.cmp(&b.category_name))
        });

        SpendingByCategoryReport {
            report_type: "spending_by_category".to_string(),
            period: ReportPeriod {
                start_date: range.start,
                end_date: range.end,
            },
            currency: currency.to_string(),
            transaction_type,
            spending_by_category: rows,
            total_amount,
            total_transactions,
            generated_at,
        }
    }

    /// Builds the monthly summary report.
    #[must_use]
    pub fn monthly_summary<N>(
        input: MonthlySummaryInput,
        name_of: N,
        generated_at: DateTime<Utc>,
    ) -> MonthlySummaryReport
    where
        N: Fn(CategoryId) -> Option<String>,
    {
        let (mut income, mut expenses) = (Decimal::ZERO, Decimal::ZERO);
        let (mut income_count, mut expense_count) = (0, 0);
        for t in &input.by_type {
            match t.transaction_type {
                TransactionType::Income => {
                    income += t.total;
                    income_count += t.count;
                }
                TransactionType::Expense => {
                    expenses += t.total;
                    expense_count += t.count;
                }
            }
        }

        let total = input.accounts.iter().map(|a| a.balance).sum();

        MonthlySummaryReport {
            report_type: "monthly_summary".to_string(),
            month: input.range.month_label(),
            currency: input.currency,
            summary: Self::savings(income, expenses),
            income_breakdown: Self::breakdown(&input.income_by_category, &name_of),
            expense_breakdown: Self::breakdown(&input.expense_by_category, &name_of),
            account_balances: AccountBalances {
                accounts: input.accounts,
                total,
            },
            transaction_counts: TransactionCounts {
                income_transactions: income_count,
                expense_transactions: expense_count,
                total_transactions: income_count + expense_count,
            },
            generated_at,
        }
    }

    /// Totals keyed by category name; categories sharing a name are summed.
    fn breakdown<N>(totals: &[CategoryTotal], name_of: &N) -> BTreeMap<String, Decimal>
    where
        N: Fn(CategoryId) -> Option<String>,
    {
        let mut map = BTreeMap::new();
        for t in totals {
            let name = name_of(t.category_id).unwrap_or_else(|| UNKNOWN_CATEGORY.to_string());
            *map.entry(name).or_insert(Decimal::ZERO) += t.total;
        }
        map
    }
}
