//! Authentication routes.

use axum::{Json, Router, extract::State, routing::post};
use famledger_core::auth::{LoginError, StoredCredentials, authenticate};
use famledger_db::UserRepository;
use famledger_shared::auth::{LoginRequest, LoginResponse, UserInfo};
use famledger_shared::types::{FamilyId, UserId};
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use crate::{AppState, error::ApiError};

/// Creates the auth router.
pub fn routes() -> Router<AppState> {
    Router::new().route("/auth/login", post(login))
}

/// Login body as received; checked before it becomes a [`LoginRequest`].
#[derive(Debug, Deserialize, Validate)]
pub struct LoginPayload {
    /// User email.
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    /// User password.
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
}

impl From<LoginPayload> for LoginRequest {
    fn from(payload: LoginPayload) -> Self {
        Self {
            email: payload.email,
            password: payload.password,
        }
    }
}

/// POST /auth/login - Authenticate a user and return an access token.
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<LoginResponse>, ApiError> {
    payload.validate()?;
    let request = LoginRequest::from(payload);

    let user_repo = UserRepository::new((*state.db).clone());
    let user = user_repo.find_by_email(&request.email).await?;

    let stored = user.as_ref().map(|u| StoredCredentials {
        password_hash: &u.password_hash,
        is_active: u.is_active,
    });
    authenticate(stored, &request.password)
        .inspect_err(|e| info!(email = %request.email, reason = %e, "Login refused"))?;
    let user = user.ok_or(LoginError::InvalidCredentials)?;

    let user_id = UserId::from_uuid(user.id);
    let family_id = FamilyId::from_uuid(user.family_id);
    let token = state
        .jwt_service
        .generate_access_token(user_id, family_id, &user.email, &user.name)?;

    info!(user_id = %user_id, family_id = %family_id, "User logged in");

    Ok(Json(LoginResponse {
        token,
        expires_in: state.jwt_service.access_token_expires_in(),
        user: UserInfo {
            id: user.id,
            email: user.email,
            name: user.name,
            family_id: user.family_id,
        },
    }))
}
