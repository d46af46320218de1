//! Exchange rate management routes.
//!
//! Rates are global: every family reads the same table.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::{DateTime, Days, FixedOffset, NaiveDate};
use famledger_core::currency::ExchangeRate;
use famledger_core::period::DateRange;
use famledger_db::entities::exchange_rates;
use famledger_db::repositories::{ExchangeRateRepository, MANUAL_SOURCE};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::today;
use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Days of history returned when no start date is given.
const DEFAULT_HISTORY_DAYS: u64 = 30;

/// Creates the exchange rate routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/exchange-rates",
            get(list_by_date)
                .post(create_exchange_rate)
                .put(upsert_exchange_rate),
        )
        .route("/exchange-rates/history", get(rate_history))
}

/// Request body for creating or replacing a rate.
#[derive(Debug, Deserialize, Validate)]
pub struct ExchangeRateRequest {
    /// Source currency code.
    pub from_currency: String,
    /// Target currency code.
    pub to_currency: String,
    /// `1 from_currency = rate to_currency`.
    pub rate: Decimal,
    /// Day the rate applies from.
    pub effective_date: NaiveDate,
    /// Where the rate came from, defaults to `manual`.
    #[validate(length(min = 1, max = 50, message = "source must be 1-50 characters"))]
    pub source: Option<String>,
}

/// Query parameters for listing rates on a date.
///
/// With both `from` and `to`, only the rate recorded for that pair on
/// exactly `date` is returned.
#[derive(Debug, Default, Deserialize)]
pub struct ListByDateQuery {
    /// Defaults to today.
    pub date: Option<NaiveDate>,
    /// Source currency filter.
    pub from: Option<String>,
    /// Target currency filter.
    pub to: Option<String>,
}

/// Query parameters for a pair's history.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// Source currency code.
    pub from: String,
    /// Target currency code.
    pub to: String,
    /// Defaults to 30 days before `end_date`.
    pub start_date: Option<NaiveDate>,
    /// Defaults to today.
    pub end_date: Option<NaiveDate>,
}

/// A stored exchange rate.
#[derive(Debug, Serialize)]
pub struct ExchangeRateResponse {
    /// Rate ID.
    pub id: Uuid,
    /// Source currency code.
    pub from_currency: String,
    /// Target currency code.
    pub to_currency: String,
    /// Rate.
    pub rate: Decimal,
    /// Effective date.
    pub effective_date: NaiveDate,
    /// Provenance.
    pub source: String,
    /// Created at timestamp.
    pub created_at: DateTime<FixedOffset>,
}

impl From<exchange_rates::Model> for ExchangeRateResponse {
    fn from(model: exchange_rates::Model) -> Self {
        Self {
            id: model.id,
            from_currency: model.from_currency,
            to_currency: model.to_currency,
            rate: model.rate,
            effective_date: model.effective_date,
            source: model.source,
            created_at: model.created_at,
        }
    }
}

/// List wrapper.
#[derive(Debug, Serialize)]
pub struct ExchangeRateListResponse {
    /// Rates, newest first.
    pub rates: Vec<ExchangeRateResponse>,
}

fn parse_rate(state: &AppState, payload: &ExchangeRateRequest) -> Result<ExchangeRate, ApiError> {
    payload.validate()?;
    let from = state.currencies.parse("from_currency", &payload.from_currency)?;
    let to = state.currencies.parse("to_currency", &payload.to_currency)?;
    Ok(ExchangeRate::new(from, to, payload.rate, payload.effective_date)?)
}

fn history_range(query: &HistoryQuery, today: NaiveDate) -> Result<DateRange, ApiError> {
    let end = query.end_date.unwrap_or(today);
    let start = query.start_date.unwrap_or_else(|| {
        end.checked_sub_days(Days::new(DEFAULT_HISTORY_DAYS))
            .unwrap_or(end)
    });
    Ok(DateRange::new(start, end)?)
}

/// GET `/exchange-rates` - All rates effective on one date, or one pair's rate on it.
async fn list_by_date(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<ListByDateQuery>,
) -> Result<Json<ExchangeRateListResponse>, ApiError> {
    let date = query.date.unwrap_or_else(today);
    let repo = ExchangeRateRepository::new((*state.db).clone());
    let rows = match (query.from.as_deref(), query.to.as_deref()) {
        (None, None) => repo.list_by_date(date).await?,
        (Some(from), Some(to)) => {
            let from = state.currencies.parse("from", from)?;
            let to = state.currencies.parse("to", to)?;
            repo.rate_on(&from, &to, date).await?.into_iter().collect()
        }
        (None, Some(_)) => return Err(ApiError::validation("from", "from is required with to")),
        (Some(_), None) => return Err(ApiError::validation("to", "to is required with from")),
    };
    let rates = rows.into_iter().map(ExchangeRateResponse::from).collect();
    Ok(Json(ExchangeRateListResponse { rates }))
}

/// POST `/exchange-rates` - Record a new rate; 409 if the pair already has one that day.
async fn create_exchange_rate(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<ExchangeRateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let rate = parse_rate(&state, &payload)?;
    let repo = ExchangeRateRepository::new((*state.db).clone());
    let created = repo
        .create(&rate, payload.source.as_deref().unwrap_or(MANUAL_SOURCE))
        .await?;

    info!(rate_id = %created.id, user_id = %auth.user_id(), "Exchange rate created via API");
    Ok((StatusCode::CREATED, Json(ExchangeRateResponse::from(created))))
}

/// PUT `/exchange-rates` - Create or replace the rate for a pair and date.
async fn upsert_exchange_rate(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<ExchangeRateRequest>,
) -> Result<Json<ExchangeRateResponse>, ApiError> {
    let rate = parse_rate(&state, &payload)?;
    let repo = ExchangeRateRepository::new((*state.db).clone());
    let saved = repo
        .upsert(&rate, payload.source.as_deref().unwrap_or(MANUAL_SOURCE))
        .await?;

    info!(rate_id = %saved.id, user_id = %auth.user_id(), "Exchange rate saved via API");
    Ok(Json(saved.into()))
}

/// GET `/exchange-rates/history` - A pair's rates over a date range.
async fn rate_history(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<ExchangeRateListResponse>, ApiError> {
    let from = state.currencies.parse("from", &query.from)?;
    let to = state.currencies.parse("to", &query.to)?;
    let range = history_range(&query, today())?;

    let repo = ExchangeRateRepository::new((*state.db).clone());
    let rates = repo
        .history(&from, &to, range)
        .await?
        .into_iter()
        .map(ExchangeRateResponse::from)
        .collect();
    Ok(Json(ExchangeRateListResponse { rates }))
}
