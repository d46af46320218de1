//! Currency rate and conversion routes.
//!
//! Unlike posting, these never fail for lack of a stored rate while the
//! configured fallback pair covers the request.

use std::collections::BTreeMap;

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use chrono::{DateTime, NaiveDate, Utc};
use famledger_core::currency::{MoneyNormalizer, Normalized, RateSource};
use famledger_core::ledger::LedgerError;
use famledger_db::entities::exchange_rates;
use famledger_db::repositories::{ExchangeRateRepository, FamilyRepository};
use famledger_shared::types::CurrencyCode;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::today;
use crate::{AppState, error::ApiError, middleware::AuthUser};

const FALLBACK_SOURCE: &str = "fallback";

/// Creates the currency routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/currencies/rates", get(get_rates))
        .route("/currencies/convert", get(convert))
}

/// Rates relative to the family's base currency.
#[derive(Debug, Serialize)]
pub struct ExchangeRatesResponse {
    /// The family's base currency.
    pub base_currency: String,
    /// Units of each currency per one unit of base currency, 6dp.
    pub rates: BTreeMap<String, Decimal>,
    /// When the newest stored rate used was recorded, or now.
    pub last_updated: DateTime<Utc>,
    /// Source of the stored rates, or `fallback`.
    pub source: String,
}

/// Query parameters for a conversion.
#[derive(Debug, Deserialize)]
pub struct ConvertQuery {
    /// Amount to convert.
    pub amount: Option<String>,
    /// Source currency.
    pub from: Option<String>,
    /// Target currency.
    pub to: Option<String>,
    /// Rate date, defaults to today.
    pub date: Option<NaiveDate>,
}

/// Result of a conversion.
#[derive(Debug, Serialize)]
pub struct ConvertCurrencyResponse {
    /// Amount as requested.
    pub original_amount: Decimal,
    /// Source currency.
    pub original_currency: String,
    /// Converted amount, 2dp.
    pub converted_amount: Decimal,
    /// Target currency.
    pub target_currency: String,
    /// Rate applied, 6dp.
    pub exchange_rate: Decimal,
    /// Where the rate came from.
    pub rate_source: RateSource,
    /// When the conversion was made.
    pub conversion_date: DateTime<Utc>,
}

/// Stored rates for both directions of a pair as of a date.
struct PairRates {
    direct: Option<exchange_rates::Model>,
    reverse: Option<exchange_rates::Model>,
}

impl PairRates {
    async fn load(
        repo: &ExchangeRateRepository,
        from: &CurrencyCode,
        to: &CurrencyCode,
        as_of: NaiveDate,
    ) -> Result<Self, ApiError> {
        if from == to {
            return Ok(Self {
                direct: None,
                reverse: None,
            });
        }
        Ok(Self {
            direct: repo.latest_rate(from, to, as_of).await?,
            reverse: repo.latest_rate(to, from, as_of).await?,
        })
    }

    /// The stored row a quote with `source` was based on.
    fn used(&self, source: RateSource) -> Option<&exchange_rates::Model> {
        match source {
            RateSource::Direct => self.direct.as_ref(),
            RateSource::Inverse => self.reverse.as_ref(),
            RateSource::Identity | RateSource::Fallback => None,
        }
    }
}

fn quote(
    state: &AppState,
    amount: Decimal,
    from: &CurrencyCode,
    to: &CurrencyCode,
    as_of: NaiveDate,
    rates: &PairRates,
) -> Result<Normalized, LedgerError> {
    MoneyNormalizer::quote(
        amount,
        from,
        to,
        as_of,
        rates.direct.as_ref().map(|r| r.rate),
        rates.reverse.as_ref().map(|r| r.rate),
        &state.rate_policy,
    )
}

/// GET `/currencies/rates` - Current rates for every allowed currency.
async fn get_rates(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ExchangeRatesResponse>, ApiError> {
    let base = FamilyRepository::new((*state.db).clone())
        .base_currency(auth.family_id())
        .await?;
    let repo = ExchangeRateRepository::new((*state.db).clone());
    let as_of = today();

    let mut rates = BTreeMap::new();
    let mut newest: Option<&exchange_rates::Model> = None;
    let mut used_fallback = false;
    let mut loaded = Vec::with_capacity(state.currencies.codes().len());
    for code in state.currencies.codes() {
        loaded.push((code, PairRates::load(&repo, &base, code, as_of).await?));
    }

    for (code, pair) in &loaded {
        let conversion = match quote(&state, Decimal::ONE, &base, code, as_of, pair) {
            Ok(conversion) => conversion,
            Err(err) => {
                debug!(currency = %code, error = %err, "No rate for currency");
                continue;
            }
        };
        used_fallback |= conversion.source == RateSource::Fallback;
        if let Some(row) = pair
            .used(conversion.source)
            .filter(|row| newest.is_none_or(|n| row.created_at > n.created_at))
        {
            newest = Some(row);
        }
        rates.insert(code.to_string(), conversion.rate);
    }

    let (last_updated, source) = match newest {
        Some(row) if !used_fallback => (row.created_at.with_timezone(&Utc), row.source.clone()),
        _ => (Utc::now(), FALLBACK_SOURCE.to_string()),
    };

    Ok(Json(ExchangeRatesResponse {
        base_currency: base.to_string(),
        rates,
        last_updated,
        source,
    }))
}

/// GET `/currencies/convert` - Convert an amount between allowed currencies.
async fn convert(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<ConvertQuery>,
) -> Result<Json<ConvertCurrencyResponse>, ApiError> {
    let amount = parse_amount(query.amount.as_deref())?;
    let from = state
        .currencies
        .parse("from", query.from.as_deref().unwrap_or_default())?;
    let to = state
        .currencies
        .parse("to", query.to.as_deref().unwrap_or_default())?;
    let as_of = query.date.unwrap_or_else(today);

    let repo = ExchangeRateRepository::new((*state.db).clone());
    let pair = PairRates::load(&repo, &from, &to, as_of).await?;
    let conversion = quote(&state, amount, &from, &to, as_of, &pair)?;

    Ok(Json(ConvertCurrencyResponse {
        original_amount: amount,
        original_currency: from.to_string(),
        converted_amount: conversion.amount_base,
        target_currency: to.to_string(),
        exchange_rate: conversion.rate,
        rate_source: conversion.source,
        conversion_date: Utc::now(),
    }))
}

fn parse_amount(raw: Option<&str>) -> Result<Decimal, ApiError> {
    let raw = raw
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .ok_or_else(|| ApiError::validation("amount", "amount is required"))?;
    raw.parse::<Decimal>()
        .map_err(|_| ApiError::validation("amount", "amount must be a decimal number"))
}
