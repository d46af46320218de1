use super::*;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use famledger_shared::JwtConfig;
use famledger_shared::types::{FamilyId, UserId};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

fn offline_state() -> AppState {
    AppState::new(
        DatabaseConnection::Disconnected,
        JwtService::new(JwtConfig::default()),
        &CurrencyConfig::default(),
    )
    .unwrap()
}

async fn send(state: AppState, request: Request<Body>) -> (StatusCode, Value) {
    let response = create_router(state).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn get_with_token(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_health_reports_degraded_without_database() {
    let (status, body) = send(offline_state(), get("/health")).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["database"], "disconnected");
}

#[tokio::test]
async fn test_ready_fails_without_database() {
    let (status, body) = send(offline_state(), get("/ready")).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "not ready");
}

#[tokio::test]
async fn test_protected_route_requires_token() {
    let (status, body) = send(offline_state(), get("/api/v1/accounts")).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "missing_token");
}

#[tokio::test]
async fn test_protected_route_rejects_garbage_token() {
    let (status, body) = send(
        offline_state(),
        get_with_token("/api/v1/transactions", "not-a-jwt"),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_token");
}

#[tokio::test]
async fn test_valid_token_reaches_handler() {
    let state = offline_state();
    let token = state
        .jwt_service
        .generate_access_token(UserId::new(), FamilyId::new(), "ana@example.com", "Ana")
        .unwrap();

    let (status, body) = send(state, get_with_token("/api/v1/categories", &token)).await;

    // Past auth, the handler hits the missing database.
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_handler_validation_runs_before_database() {
    let state = offline_state();
    let token = state
        .jwt_service
        .generate_access_token(UserId::new(), FamilyId::new(), "ana@example.com", "Ana")
        .unwrap();

    let (status, body) = send(
        state,
        get_with_token("/api/v1/currencies/convert?amount=ten&from=EUR&to=RSD", &token),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "amount");
}

#[tokio::test]
async fn test_rate_on_date_requires_both_currencies() {
    let state = offline_state();
    let token = state
        .jwt_service
        .generate_access_token(UserId::new(), FamilyId::new(), "ana@example.com", "Ana")
        .unwrap();

    let (status, body) = send(
        state,
        get_with_token("/api/v1/exchange-rates?to=RSD&date=2024-01-01", &token),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "from");
}

#[test]
fn test_state_rejects_fallback_outside_allow_list() {
    let config = CurrencyConfig {
        allowed: vec!["EUR".to_string(), "USD".to_string()],
        ..CurrencyConfig::default()
    };

    let result = AppState::new(
        DatabaseConnection::Disconnected,
        JwtService::new(JwtConfig::default()),
        &config,
    );

    assert!(result.is_err());
}
