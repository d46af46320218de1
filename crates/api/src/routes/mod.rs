//! API route definitions.

use axum::{Router, middleware};
use chrono::{NaiveDate, Utc};

use crate::{AppState, middleware::auth::auth_middleware};

pub mod accounts;
pub mod auth;
pub mod categories;
pub mod currencies;
pub mod exchange_rates;
pub mod health;
pub mod reports;
pub mod transactions;

/// Creates the `/api/v1` router; everything but login needs a bearer token.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    let protected_routes = Router::new()
        .merge(accounts::routes())
        .merge(categories::routes())
        .merge(transactions::routes())
        .merge(reports::routes())
        .merge(currencies::routes())
        .merge(exchange_rates::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new().merge(auth::routes()).merge(protected_routes)
}

/// The date "today" resolves to for posting and report defaults.
pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}
