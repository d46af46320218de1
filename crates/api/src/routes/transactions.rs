//! Transaction routes.
//!
//! Writes go through [`TransactionRepository`], which runs each one in an
//! audited unit of work attributed to the caller. Responses embed account
//! and category summaries and the family's base currency.

use std::collections::HashMap;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::{DateTime, FixedOffset, NaiveDate};
use famledger_core::ledger::{
    AccountType, NewTransaction, TransactionFilter, TransactionPatch, TransactionType,
};
use famledger_core::period::DateRange;
use famledger_db::entities::{accounts, categories, transactions};
use famledger_db::repositories::{
    AccountRepository, CategoryRepository, FamilyRepository, PostingContext, TransactionRepository,
};
use famledger_shared::types::{
    AccountId, CategoryId, CurrencyCode, FamilyId, PageRequest, PageResponse, TransactionId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::today;
use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Creates the transaction routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/transactions",
            get(list_transactions).post(create_transaction),
        )
        .route(
            "/transactions/{id}",
            get(get_transaction)
                .patch(update_transaction)
                .delete(delete_transaction),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for listing transactions.
#[derive(Debug, Default, Deserialize)]
pub struct ListTransactionsQuery {
    /// Filter by transaction type.
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    /// Filter by account.
    pub account_id: Option<Uuid>,
    /// Calendar month (`YYYY-MM`); takes precedence over the date bounds.
    pub month: Option<String>,
    /// Inclusive lower date bound.
    pub start_date: Option<NaiveDate>,
    /// Inclusive upper date bound.
    pub end_date: Option<NaiveDate>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Page size (default: 50, max: 100).
    pub per_page: Option<u32>,
}

/// Request body for creating a transaction.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTransactionRequest {
    /// `income` or `expense`.
    #[serde(rename = "type")]
    pub transaction_type: String,
    /// Entered amount, strictly positive.
    pub amount: Decimal,
    /// Entered currency.
    pub currency: String,
    /// Category of the same type.
    pub category_id: Uuid,
    /// Active account of the family.
    pub account_id: Uuid,
    /// Free text.
    #[validate(length(max = 500, message = "description must be at most 500 characters"))]
    pub description: Option<String>,
    /// Transaction date, not in the future.
    pub date: NaiveDate,
}

/// Merge patch for a transaction.
///
/// Absent fields keep their stored value. `description: null` clears the
/// description. Type and account cannot be changed after posting.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateTransactionRequest {
    /// New category.
    pub category_id: Option<Uuid>,
    /// New amount.
    pub amount: Option<Decimal>,
    /// New currency.
    pub currency: Option<String>,
    /// New description, or `null` to clear it.
    #[serde(default, deserialize_with = "present")]
    #[validate(length(max = 500, message = "description must be at most 500 characters"))]
    pub description: Option<Option<String>>,
    /// New date.
    pub date: Option<NaiveDate>,
}

/// Maps a present field (even `null`) to `Some`, so `Option<Option<T>>`
/// tells "absent" from "cleared".
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Account summary embedded in a transaction.
#[derive(Debug, Serialize)]
pub struct AccountSummary {
    /// Account ID.
    pub id: Uuid,
    /// Account name.
    pub name: String,
    /// Account type.
    #[serde(rename = "type")]
    pub account_type: Option<AccountType>,
}

/// Category summary embedded in a transaction.
#[derive(Debug, Serialize)]
pub struct CategorySummary {
    /// Category ID.
    pub id: Uuid,
    /// Category name.
    pub name: String,
    /// Category type.
    #[serde(rename = "type")]
    pub category_type: Option<TransactionType>,
}

/// Response for a transaction.
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    /// Transaction ID.
    pub id: Uuid,
    /// Income or expense.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// Entered amount.
    pub amount: Decimal,
    /// Entered currency.
    pub currency: String,
    /// Amount in the family's base currency, fixed at write time.
    pub amount_base: Decimal,
    /// The family's base currency.
    pub base_currency: String,
    /// Rate applied to reach `amount_base`.
    pub exchange_rate: Decimal,
    /// Category summary.
    pub category: CategorySummary,
    /// Account summary.
    pub account: AccountSummary,
    /// Free text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Transaction date.
    pub date: NaiveDate,
    /// Created at timestamp.
    pub created_at: DateTime<FixedOffset>,
    /// Creator.
    pub created_by: Uuid,
    /// Updated at timestamp.
    pub updated_at: DateTime<FixedOffset>,
}

/// Family data needed to render transactions.
struct Lookups {
    base_currency: CurrencyCode,
    accounts: HashMap<Uuid, accounts::Model>,
    categories: HashMap<Uuid, categories::Model>,
}

impl Lookups {
    async fn load(state: &AppState, family_id: FamilyId) -> Result<Self, ApiError> {
        let db = (*state.db).clone();
        let base_currency = FamilyRepository::new(db.clone())
            .base_currency(family_id)
            .await?;
        let accounts = AccountRepository::new(db.clone())
            .list_all(family_id)
            .await?
            .into_iter()
            .map(|a| (a.id, a))
            .collect();
        let categories = CategoryRepository::new(db)
            .list_all(family_id)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        Ok(Self {
            base_currency,
            accounts,
            categories,
        })
    }

    fn render(&self, model: transactions::Model) -> TransactionResponse {
        let account = self.accounts.get(&model.account_id);
        let category = self.categories.get(&model.category_id);

        TransactionResponse {
            id: model.id,
            transaction_type: model.transaction_type.into(),
            amount: model.amount,
            currency: model.currency,
            amount_base: model.amount_base,
            base_currency: self.base_currency.to_string(),
            exchange_rate: model.exchange_rate,
            category: CategorySummary {
                id: model.category_id,
                name: category.map(|c| c.name.clone()).unwrap_or_default(),
                category_type: category.map(|c| c.category_type.into()),
            },
            account: AccountSummary {
                id: model.account_id,
                name: account.map(|a| a.name.clone()).unwrap_or_default(),
                account_type: account.map(|a| a.account_type.into()),
            },
            description: model.description,
            date: model.transaction_date,
            created_at: model.created_at,
            created_by: model.created_by,
            updated_at: model.updated_at,
        }
    }
}

/// Resolves the list date filter: `month` wins, then the explicit bounds.
/// A lone `start_date` runs to today; a lone `end_date` starts at the epoch.
fn date_filter(
    query: &ListTransactionsQuery,
    today: NaiveDate,
) -> Result<Option<DateRange>, ApiError> {
    if let Some(month) = &query.month {
        return Ok(Some(DateRange::parse_month(month)?));
    }
    match (query.start_date, query.end_date) {
        (None, None) => Ok(None),
        (start, end) => Ok(Some(DateRange::new(
            start.unwrap_or_default(),
            end.unwrap_or(today),
        )?)),
    }
}

fn parse_currency(field: &'static str, raw: &str) -> Result<CurrencyCode, ApiError> {
    CurrencyCode::parse(raw).map_err(|e| ApiError::validation(field, e.to_string()))
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

// ============================================================================
// Handlers
// ============================================================================

/// GET `/transactions` - Filtered, paginated list, newest first.
async fn list_transactions(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListTransactionsQuery>,
) -> Result<Json<PageResponse<TransactionResponse>>, ApiError> {
    let family_id = auth.family_id();
    let filter = TransactionFilter {
        transaction_type: query
            .transaction_type
            .as_deref()
            .map(|raw| TransactionType::parse("type", raw))
            .transpose()?,
        account_id: query.account_id.map(AccountId::from_uuid),
        date_range: date_filter(&query, today())?,
    };
    let page = PageRequest::from_query(query.page, query.per_page);

    let repo = TransactionRepository::new((*state.db).clone());
    let (rows, total) = repo.list_filtered(family_id, &filter, &page).await?;
    let lookups = Lookups::load(&state, family_id).await?;

    Ok(Json(
        PageResponse::new(rows, page.page, page.per_page, total).map(|row| lookups.render(row)),
    ))
}

/// POST `/transactions` - Post a transaction.
async fn create_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateTransactionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()?;
    let family_id = auth.family_id();

    let input = NewTransaction {
        family_id,
        account_id: AccountId::from_uuid(payload.account_id),
        category_id: CategoryId::from_uuid(payload.category_id),
        transaction_type: TransactionType::parse("type", &payload.transaction_type)?,
        amount: payload.amount,
        currency: parse_currency("currency", &payload.currency)?,
        description: normalize_description(payload.description),
        transaction_date: payload.date,
        actor: auth.user_id(),
    };
    let ctx = PostingContext {
        currencies: &state.currencies,
        today: today(),
    };

    let repo = TransactionRepository::new((*state.db).clone());
    let created = repo.create(input, ctx).await?;
    info!(transaction_id = %created.id, user_id = %auth.user_id(), "Transaction posted via API");

    let lookups = Lookups::load(&state, family_id).await?;
    Ok((StatusCode::CREATED, Json(lookups.render(created))))
}

/// GET `/transactions/{id}` - Get a non-deleted transaction.
async fn get_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<TransactionResponse>, ApiError> {
    let family_id = auth.family_id();
    let repo = TransactionRepository::new((*state.db).clone());
    let row = repo
        .find(family_id, TransactionId::from_uuid(id))
        .await?
        .ok_or_else(|| ApiError::not_found("Transaction not found"))?;

    let lookups = Lookups::load(&state, family_id).await?;
    Ok(Json(lookups.render(row)))
}

/// PATCH `/transactions/{id}` - Merge-patch a transaction.
async fn update_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTransactionRequest>,
) -> Result<Json<TransactionResponse>, ApiError> {
    payload.validate()?;
    let family_id = auth.family_id();

    let patch = TransactionPatch {
        category_id: payload.category_id.map(CategoryId::from_uuid),
        amount: payload.amount,
        currency: payload
            .currency
            .as_deref()
            .map(|raw| parse_currency("currency", raw))
            .transpose()?,
        description: payload.description.map(normalize_description),
        transaction_date: payload.date,
    };
    let ctx = PostingContext {
        currencies: &state.currencies,
        today: today(),
    };

    let repo = TransactionRepository::new((*state.db).clone());
    let updated = repo
        .update(
            family_id,
            TransactionId::from_uuid(id),
            patch,
            auth.user_id(),
            ctx,
        )
        .await?;

    let lookups = Lookups::load(&state, family_id).await?;
    Ok(Json(lookups.render(updated)))
}

/// DELETE `/transactions/{id}` - Soft-delete a transaction.
async fn delete_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let repo = TransactionRepository::new((*state.db).clone());
    repo.delete(
        auth.family_id(),
        TransactionId::from_uuid(id),
        auth.user_id(),
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_patch_distinguishes_absent_from_null() {
        let absent: UpdateTransactionRequest = serde_json::from_str(r#"{"amount": "5.00"}"#).unwrap();
        assert_eq!(absent.description, None);

        let cleared: UpdateTransactionRequest =
            serde_json::from_str(r#"{"description": null}"#).unwrap();
        assert_eq!(cleared.description, Some(None));

        let set: UpdateTransactionRequest =
            serde_json::from_str(r#"{"description": "groceries"}"#).unwrap();
        assert_eq!(set.description, Some(Some("groceries".to_string())));
    }

    #[test]
    fn test_patch_rejects_immutable_fields() {
        let result: Result<UpdateTransactionRequest, _> =
            serde_json::from_str(r#"{"account_id": "0190b0b4-0000-7000-8000-000000000000"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_month_wins_over_bounds() {
        let query = ListTransactionsQuery {
            month: Some("2024-02".to_string()),
            start_date: Some(date(2023, 1, 1)),
            ..Default::default()
        };
        let range = date_filter(&query, date(2024, 6, 15)).unwrap().unwrap();
        assert_eq!(range.start, date(2024, 2, 1));
        assert_eq!(range.end, date(2024, 2, 29));
    }

    #[rstest]
    #[case(None, None, None)]
    #[case(Some(date(2024, 3, 1)), None, Some((date(2024, 3, 1), date(2024, 6, 15))))]
    #[case(None, Some(date(2024, 3, 1)), Some((NaiveDate::default(), date(2024, 3, 1))))]
    #[case(Some(date(2024, 1, 1)), Some(date(2024, 1, 31)), Some((date(2024, 1, 1), date(2024, 1, 31))))]
    fn test_date_bounds(
        #[case] start_date: Option<NaiveDate>,
        #[case] end_date: Option<NaiveDate>,
        #[case] expected: Option<(NaiveDate, NaiveDate)>,
    ) {
        let query = ListTransactionsQuery {
            start_date,
            end_date,
            ..Default::default()
        };
        let range = date_filter(&query, date(2024, 6, 15)).unwrap();
        assert_eq!(range.map(|r| (r.start, r.end)), expected);
    }

    #[test]
    fn test_inverted_bounds_fail_on_start_date() {
        let query = ListTransactionsQuery {
            start_date: Some(date(2024, 2, 1)),
            end_date: Some(date(2024, 1, 1)),
            ..Default::default()
        };
        let err = date_filter(&query, date(2024, 6, 15)).unwrap_err();
        assert_eq!(err.field(), Some("start_date"));
    }

    #[test]
    fn test_description_is_trimmed_and_blank_dropped() {
        assert_eq!(normalize_description(Some("  rent ".to_string())), Some("rent".to_string()));
        assert_eq!(normalize_description(Some("   ".to_string())), None);
        assert_eq!(normalize_description(None), None);
    }
}
