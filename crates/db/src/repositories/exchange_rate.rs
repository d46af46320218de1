//! Exchange rate repository.
//!
//! Rates are global: one row per `(from_currency, to_currency, effective_date)`.
//! Lookups match the exact pair only; inversion and fallbacks are the
//! caller's policy.

use chrono::NaiveDate;
use famledger_core::currency::ExchangeRate;
use famledger_core::ledger::LedgerError;
use famledger_core::period::DateRange;
use famledger_shared::AppError;
use famledger_shared::types::{CurrencyCode, ExchangeRateId};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, SqlErr,
};
use tracing::info;

use crate::entities::exchange_rates;

/// Default `source` for rates entered by hand.
pub const MANUAL_SOURCE: &str = "manual";

/// Error types for exchange rate operations.
#[derive(Debug, thiserror::Error)]
pub enum ExchangeRateError {
    /// Rate failed validation (non-positive, same currency).
    #[error(transparent)]
    Invalid(#[from] LedgerError),

    /// A rate already exists for the pair and date.
    #[error("A rate for {0}/{1} on {2} already exists")]
    Duplicate(CurrencyCode, CurrencyCode, NaiveDate),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl ExchangeRateError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Invalid(e) => e.error_code(),
            Self::Duplicate(..) => "CONFLICT",
            Self::Database(_) => "STORAGE_FAILURE",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::Invalid(e) => e.http_status_code(),
            Self::Duplicate(..) => 409,
            Self::Database(_) => 500,
        }
    }
}

impl From<ExchangeRateError> for AppError {
    fn from(err: ExchangeRateError) -> Self {
        match err {
            ExchangeRateError::Invalid(e) => e.into(),
            ExchangeRateError::Duplicate(..) => Self::Conflict(err.to_string()),
            ExchangeRateError::Database(e) => Self::Storage(e.to_string()),
        }
    }
}

/// Exchange rate repository.
#[derive(Debug, Clone)]
pub struct ExchangeRateRepository {
    db: DatabaseConnection,
}

impl ExchangeRateRepository {
    /// Creates a new exchange rate repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds the rate recorded for exactly `date`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn rate_on(
        &self,
        from: &CurrencyCode,
        to: &CurrencyCode,
        date: NaiveDate,
    ) -> Result<Option<exchange_rates::Model>, DbErr> {
        exchange_rates::Entity::find()
            .filter(exchange_rates::Column::FromCurrency.eq(from.as_str()))
            .filter(exchange_rates::Column::ToCurrency.eq(to.as_str()))
            .filter(exchange_rates::Column::EffectiveDate.eq(date))
            .one(&self.db)
            .await
    }

    /// Finds the most recent rate for the pair with `effective_date <= as_of`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn latest_rate(
        &self,
        from: &CurrencyCode,
        to: &CurrencyCode,
        as_of: NaiveDate,
    ) -> Result<Option<exchange_rates::Model>, DbErr> {
        latest_rate(&self.db, from, to, as_of).await
    }

    /// Lists every rate effective on `date`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_by_date(&self, date: NaiveDate) -> Result<Vec<exchange_rates::Model>, DbErr> {
        exchange_rates::Entity::find()
            .filter(exchange_rates::Column::EffectiveDate.eq(date))
            .order_by_asc(exchange_rates::Column::FromCurrency)
            .order_by_asc(exchange_rates::Column::ToCurrency)
            .all(&self.db)
            .await
    }

    /// Lists the pair's rates within `range`, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn history(
        &self,
        from: &CurrencyCode,
        to: &CurrencyCode,
        range: DateRange,
    ) -> Result<Vec<exchange_rates::Model>, DbErr> {
        exchange_rates::Entity::find()
            .filter(exchange_rates::Column::FromCurrency.eq(from.as_str()))
            .filter(exchange_rates::Column::ToCurrency.eq(to.as_str()))
            .filter(exchange_rates::Column::EffectiveDate.between(range.start, range.end))
            .order_by_desc(exchange_rates::Column::EffectiveDate)
            .all(&self.db)
            .await
    }

    /// Inserts a new rate.
    ///
    /// # Errors
    ///
    /// Returns `Duplicate` if the pair already has a rate on that date.
    pub async fn create(
        &self,
        rate: &ExchangeRate,
        source: &str,
    ) -> Result<exchange_rates::Model, ExchangeRateError> {
        let model = new_active_model(rate, source);
        match model.insert(&self.db).await {
            Ok(created) => {
                info!(
                    from = %rate.from_currency,
                    to = %rate.to_currency,
                    date = %rate.effective_date,
                    "Exchange rate created"
                );
                Ok(created)
            }
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(ExchangeRateError::Duplicate(
                    rate.from_currency.clone(),
                    rate.to_currency.clone(),
                    rate.effective_date,
                ))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Creates the rate or replaces the existing one for the same pair and date.
    ///
    /// A single `INSERT ... ON CONFLICT DO UPDATE`, so concurrent writers for
    /// the same key never race into a unique violation. `id` and
    /// `created_at` of an existing row are left untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn upsert(
        &self,
        rate: &ExchangeRate,
        source: &str,
    ) -> Result<exchange_rates::Model, ExchangeRateError> {
        let saved = exchange_rates::Entity::insert(new_active_model(rate, source))
            .on_conflict(
                OnConflict::columns([
                    exchange_rates::Column::FromCurrency,
                    exchange_rates::Column::ToCurrency,
                    exchange_rates::Column::EffectiveDate,
                ])
                .update_columns([exchange_rates::Column::Rate, exchange_rates::Column::Source])
                .to_owned(),
            )
            .exec_with_returning(&self.db)
            .await?;

        info!(
            from = %rate.from_currency,
            to = %rate.to_currency,
            date = %rate.effective_date,
            rate = %rate.rate,
            "Exchange rate saved"
        );
        Ok(saved)
    }
}

/// Latest rate lookup usable inside a unit of work.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn latest_rate<C>(
    conn: &C,
    from: &CurrencyCode,
    to: &CurrencyCode,
    as_of: NaiveDate,
) -> Result<Option<exchange_rates::Model>, DbErr>
where
    C: ConnectionTrait,
{
    exchange_rates::Entity::find()
        .filter(exchange_rates::Column::FromCurrency.eq(from.as_str()))
        .filter(exchange_rates::Column::ToCurrency.eq(to.as_str()))
        .filter(exchange_rates::Column::EffectiveDate.lte(as_of))
        .order_by_desc(exchange_rates::Column::EffectiveDate)
        .one(conn)
        .await
}

fn new_active_model(rate: &ExchangeRate, source: &str) -> exchange_rates::ActiveModel {
    exchange_rates::ActiveModel {
        id: Set(ExchangeRateId::new().into_inner()),
        from_currency: Set(rate.from_currency.to_string()),
        to_currency: Set(rate.to_currency.to_string()),
        rate: Set(rate.rate),
        effective_date: Set(rate.effective_date),
        source: Set(source.to_string()),
        created_at: Set(chrono::Utc::now().into()),
    }
}
