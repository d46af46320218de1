//! Health check endpoints.

use std::time::Duration;

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::json;
use tracing::warn;

use crate::AppState;

const PING_TIMEOUT: Duration = Duration::from_secs(2);

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    /// `healthy` or `degraded`.
    pub status: &'static str,
    /// Time of the check.
    pub timestamp: DateTime<Utc>,
    /// Service version.
    pub version: &'static str,
    /// `connected` or `disconnected`.
    pub database: &'static str,
}

/// Creates health check routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness))
}

/// GET /health - Service and database status.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let connected = ping(&state.db).await;
    let (status, label) = if connected {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        status,
        Json(HealthResponse {
            status: label,
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION"),
            database: if connected { "connected" } else { "disconnected" },
        }),
    )
}

/// GET /ready - Readiness probe.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    if ping(&state.db).await {
        (StatusCode::OK, Json(json!({ "status": "ready" })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "not ready" })),
        )
    }
}

async fn ping(db: &DatabaseConnection) -> bool {
    match tokio::time::timeout(PING_TIMEOUT, db.ping()).await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            warn!(error = %e, "Database ping failed");
            false
        }
        Err(_) => {
            warn!("Database ping timed out");
            false
        }
    }
}
