//! Report routes.
//!
//! Sums come from the aggregation queries in base currency; shaping
//! (percentages, averages, savings rate) is done by [`ReportService`].

use std::collections::HashMap;

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use chrono::{NaiveDate, Utc};
use famledger_core::ledger::TransactionType;
use famledger_core::period::DateRange;
use famledger_core::reports::{
    AccountBalanceLine, MonthlySummaryInput, MonthlySummaryReport, ReportService,
    SpendingByCategoryReport,
};
use famledger_db::repositories::{
    AccountRepository, AggregationRepository, CategoryRepository, FamilyRepository,
};
use famledger_shared::types::{AccountId, CategoryId, FamilyId};
use serde::Deserialize;
use tracing::debug;

use super::today;
use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Creates the report routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/reports/spending-by-category", get(spending_by_category))
        .route("/reports/monthly-summary", get(monthly_summary))
}

/// Query parameters for the spending-by-category report.
#[derive(Debug, Default, Deserialize)]
pub struct SpendingQuery {
    /// Defaults to the first of the current month.
    pub start_date: Option<NaiveDate>,
    /// Defaults to today.
    pub end_date: Option<NaiveDate>,
    /// `income` or `expense` (default).
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
}

/// Query parameters for the monthly summary.
#[derive(Debug, Default, Deserialize)]
pub struct MonthlySummaryQuery {
    /// `YYYY-MM`, defaults to the current month.
    pub month: Option<String>,
}

fn report_range(query: &SpendingQuery, today: NaiveDate) -> Result<DateRange, ApiError> {
    let default = DateRange::month_to_date(today);
    Ok(DateRange::new(
        query.start_date.unwrap_or(default.start),
        query.end_date.unwrap_or(default.end),
    )?)
}

async fn category_names(
    state: &AppState,
    family_id: FamilyId,
) -> Result<HashMap<CategoryId, String>, ApiError> {
    Ok(CategoryRepository::new((*state.db).clone())
        .list_all(family_id)
        .await?
        .into_iter()
        .map(|c| (CategoryId::from_uuid(c.id), c.name))
        .collect())
}

/// GET `/reports/spending-by-category` - Totals per category over a range.
async fn spending_by_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<SpendingQuery>,
) -> Result<Json<SpendingByCategoryReport>, ApiError> {
    let family_id = auth.family_id();
    let range = report_range(&query, today())?;
    let transaction_type = query
        .transaction_type
        .as_deref()
        .map(|raw| TransactionType::parse("type", raw))
        .transpose()?
        .unwrap_or(TransactionType::Expense);

    let db = (*state.db).clone();
    let currency = FamilyRepository::new(db.clone())
        .base_currency(family_id)
        .await?;
    let totals = AggregationRepository::new(db)
        .summary_by_category(family_id, transaction_type, range)
        .await?;
    let names = category_names(&state, family_id).await?;

    debug!(family_id = %family_id, categories = totals.len(), "Built spending report");

    Ok(Json(ReportService::spending_by_category(
        totals,
        range,
        transaction_type,
        currency.as_str(),
        |id| names.get(&id).cloned(),
        Utc::now(),
    )))
}

/// GET `/reports/monthly-summary` - Income, expenses and balances for a month.
async fn monthly_summary(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<MonthlySummaryQuery>,
) -> Result<Json<MonthlySummaryReport>, ApiError> {
    let family_id = auth.family_id();
    let range = match &query.month {
        Some(month) => DateRange::parse_month(month)?,
        None => DateRange::month_of(today()),
    };

    let db = (*state.db).clone();
    let currency = FamilyRepository::new(db.clone())
        .base_currency(family_id)
        .await?;
    let aggregation = AggregationRepository::new(db.clone());
    let by_type = aggregation.summary_by_type(family_id, range).await?;
    let income_by_category = aggregation
        .summary_by_category(family_id, TransactionType::Income, range)
        .await?;
    let expense_by_category = aggregation
        .summary_by_category(family_id, TransactionType::Expense, range)
        .await?;
    let accounts = AccountRepository::new(db)
        .balances(family_id)
        .await?
        .into_iter()
        .map(|b| AccountBalanceLine {
            account_id: AccountId::from_uuid(b.account.id),
            name: b.account.name,
            balance: b.balance.current_balance,
        })
        .collect();
    let names = category_names(&state, family_id).await?;

    Ok(Json(ReportService::monthly_summary(
        MonthlySummaryInput {
            range,
            currency: currency.to_string(),
            by_type,
            income_by_category,
            expense_by_category,
            accounts,
        },
        |id| names.get(&id).cloned(),
        Utc::now(),
    )))
}
