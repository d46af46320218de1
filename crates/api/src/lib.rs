//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes under `/api/v1`
//! - JWT authentication middleware and the [`middleware::AuthUser`] extractor
//! - [`error::ApiError`], the single place domain errors become responses

pub mod error;
pub mod middleware;
pub mod routes;

use axum::Router;
use famledger_core::currency::{CurrencyAllowList, FallbackRate, RatePolicy};
use famledger_core::ledger::LedgerError;
use famledger_shared::JwtService;
use famledger_shared::config::CurrencyConfig;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for token operations.
    pub jwt_service: Arc<JwtService>,
    /// Currencies accepted for accounts, transactions and conversion.
    pub currencies: Arc<CurrencyAllowList>,
    /// Policy for conversion when no stored rate exists: the configured fallback pair.
    pub rate_policy: Arc<RatePolicy>,
}

impl AppState {
    /// Builds the state from its parts and the currency settings.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the configured currency codes are
    /// malformed or the fallback pair is not in the allow-list.
    pub fn new(
        db: DatabaseConnection,
        jwt_service: JwtService,
        currency: &CurrencyConfig,
    ) -> Result<Self, LedgerError> {
        let currencies = CurrencyAllowList::new(&currency.allowed)?;
        let fallback = FallbackRate {
            from: currencies.parse("fallback_from", &currency.fallback_from)?,
            to: currencies.parse("fallback_to", &currency.fallback_to)?,
            rate: currency.fallback_rate,
        };

        Ok(Self {
            db: Arc::new(db),
            jwt_service: Arc::new(jwt_service),
            currencies: Arc::new(currencies),
            rate_policy: Arc::new(RatePolicy::Fallback(fallback)),
        })
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::routes())
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod router_tests;
