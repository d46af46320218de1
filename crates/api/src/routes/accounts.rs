//! Account management routes.
//!
//! Balances are derived on read from the account's opening balance and its
//! non-deleted transactions; nothing here writes a balance.

use std::collections::HashMap;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use famledger_core::ledger::{AccountType, validate_new_account};
use famledger_db::entities::accounts;
use famledger_db::repositories::{AccountRepository, CreateAccountInput, UpdateAccountInput};
use famledger_shared::types::AccountId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Creates the account routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/accounts", get(list_accounts).post(create_account))
        .route(
            "/accounts/{id}",
            get(get_account).patch(update_account).delete(delete_account),
        )
        .route("/accounts/{id}/balance", get(get_account_balance))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for listing accounts.
#[derive(Debug, Default, Deserialize)]
pub struct ListAccountsQuery {
    /// Filter by account type.
    #[serde(rename = "type")]
    pub account_type: Option<String>,
    /// Include deactivated accounts.
    #[serde(default)]
    pub include_inactive: bool,
}

/// Request body for creating an account.
#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    /// Display name.
    pub name: String,
    /// `cash`, `checking` or `savings`.
    #[serde(rename = "type")]
    pub account_type: String,
    /// Currency code from the allow-list.
    pub currency: String,
    /// Opening balance, defaults to zero.
    #[serde(default)]
    pub initial_balance: Decimal,
}

/// Merge patch for an account; absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateAccountRequest {
    /// New name.
    pub name: Option<String>,
    /// New active flag.
    pub is_active: Option<bool>,
}

/// An account with its derived balance.
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    /// Account ID.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Account type.
    #[serde(rename = "type")]
    pub account_type: AccountType,
    /// Account currency.
    pub currency: String,
    /// Opening balance.
    pub initial_balance: Decimal,
    /// Opening balance plus income minus expenses.
    pub current_balance: Decimal,
    /// Whether the account accepts postings.
    pub is_active: bool,
    /// Created at timestamp.
    pub created_at: DateTime<FixedOffset>,
    /// Updated at timestamp.
    pub updated_at: DateTime<FixedOffset>,
}

impl AccountResponse {
    fn new(model: accounts::Model, current_balance: Decimal) -> Self {
        Self {
            id: model.id,
            name: model.name,
            account_type: model.account_type.into(),
            currency: model.currency,
            initial_balance: model.initial_balance,
            current_balance,
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// List wrapper.
#[derive(Debug, Serialize)]
pub struct AccountListResponse {
    /// Accounts, ordered by name.
    pub accounts: Vec<AccountResponse>,
}

/// Balance of a single account.
#[derive(Debug, Serialize)]
pub struct AccountBalanceResponse {
    /// Account ID.
    pub account_id: Uuid,
    /// Account name.
    pub account_name: String,
    /// Account currency.
    pub currency: String,
    /// Derived balance.
    pub current_balance: Decimal,
    /// When the balance was computed.
    pub balance_date: DateTime<Utc>,
    /// Date of the latest non-deleted transaction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_transaction_date: Option<NaiveDate>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET `/accounts` - List the family's accounts.
async fn list_accounts(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListAccountsQuery>,
) -> Result<Json<AccountListResponse>, ApiError> {
    let family_id = auth.family_id();
    let repo = AccountRepository::new((*state.db).clone());

    let type_filter = query
        .account_type
        .as_deref()
        .map(AccountType::parse)
        .transpose()?;
    let models = match (type_filter, query.include_inactive) {
        (_, true) => repo.list_all(family_id).await?,
        (Some(account_type), false) => repo.list_by_type(family_id, account_type).await?,
        (None, false) => repo.list_active(family_id).await?,
    };

    let mut balances: HashMap<Uuid, Decimal> = repo
        .balances(family_id)
        .await?
        .into_iter()
        .map(|b| (b.account.id, b.balance.current_balance))
        .collect();

    let mut accounts = Vec::with_capacity(models.len());
    for model in models {
        if type_filter.is_some_and(|t| AccountType::from(model.account_type) != t) {
            continue;
        }
        let current_balance = match balances.remove(&model.id) {
            Some(balance) => balance,
            // inactive accounts are not in the family-wide balance query
            None => {
                repo.balance(family_id, AccountId::from_uuid(model.id))
                    .await?
                    .balance
                    .current_balance
            }
        };
        accounts.push(AccountResponse::new(model, current_balance));
    }

    Ok(Json(AccountListResponse { accounts }))
}

/// POST `/accounts` - Create an account.
async fn create_account(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateAccountRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let account_type = AccountType::parse(&payload.account_type)?;
    let currency = validate_new_account(
        &payload.name,
        &payload.currency,
        payload.initial_balance,
        &state.currencies,
    )?;

    let repo = AccountRepository::new((*state.db).clone());
    let account = repo
        .create(CreateAccountInput {
            family_id: auth.family_id(),
            name: payload.name,
            account_type,
            currency,
            initial_balance: payload.initial_balance,
        })
        .await?;

    info!(account_id = %account.id, user_id = %auth.user_id(), "Account created via API");

    let balance = account.initial_balance;
    Ok((
        StatusCode::CREATED,
        Json(AccountResponse::new(account, balance)),
    ))
}

/// GET `/accounts/{id}` - Get an active account.
async fn get_account(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<AccountResponse>, ApiError> {
    let family_id = auth.family_id();
    let id = AccountId::from_uuid(id);
    let repo = AccountRepository::new((*state.db).clone());

    if repo.find_active(family_id, id).await?.is_none() {
        return Err(ApiError::not_found("Account not found"));
    }
    let with_balance = repo.balance(family_id, id).await?;

    Ok(Json(AccountResponse::new(
        with_balance.account,
        with_balance.balance.current_balance,
    )))
}

/// PATCH `/accounts/{id}` - Rename or (de)activate an account.
async fn update_account(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAccountRequest>,
) -> Result<Json<AccountResponse>, ApiError> {
    let family_id = auth.family_id();
    let id = AccountId::from_uuid(id);
    let repo = AccountRepository::new((*state.db).clone());

    repo.update(
        family_id,
        id,
        UpdateAccountInput {
            name: payload.name,
            is_active: payload.is_active,
        },
    )
    .await?;
    let with_balance = repo.balance(family_id, id).await?;

    Ok(Json(AccountResponse::new(
        with_balance.account,
        with_balance.balance.current_balance,
    )))
}

/// DELETE `/accounts/{id}` - Deactivate an account.
async fn delete_account(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let repo = AccountRepository::new((*state.db).clone());
    repo.soft_delete(auth.family_id(), AccountId::from_uuid(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET `/accounts/{id}/balance` - Derived balance of one account.
async fn get_account_balance(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<AccountBalanceResponse>, ApiError> {
    let repo = AccountRepository::new((*state.db).clone());
    let with_balance = repo
        .balance(auth.family_id(), AccountId::from_uuid(id))
        .await?;

    Ok(Json(AccountBalanceResponse {
        account_id: with_balance.account.id,
        account_name: with_balance.account.name,
        currency: with_balance.account.currency,
        current_balance: with_balance.balance.current_balance,
        balance_date: Utc::now(),
        last_transaction_date: with_balance.balance.last_transaction_date,
    }))
}
