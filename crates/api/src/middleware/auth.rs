//! Bearer-token authentication for `/api/v1`.
//!
//! [`auth_middleware`] turns a valid access token into [`Claims`] stored on
//! the request; handlers read them back through the [`AuthUser`] extractor.
//! Every rejection is a 401 with the usual `{error, message}` body.

use axum::{
    Json,
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use famledger_shared::types::{FamilyId, UserId};
use famledger_shared::{Claims, JwtError};
use serde_json::json;
use tracing::debug;

use crate::AppState;

/// Why a request was not let through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    /// No usable `Authorization: Bearer` header.
    MissingToken,
    /// The token failed validation; carries the JWT error code.
    BadToken(&'static str),
    /// A handler asked for [`AuthUser`] on a route without the middleware.
    NotAuthenticated,
}

impl AuthRejection {
    fn parts(self) -> (&'static str, &'static str) {
        match self {
            Self::MissingToken => (
                "missing_token",
                "Authorization header with Bearer token is required",
            ),
            Self::BadToken(code @ "token_expired") => (code, "Token has expired"),
            Self::BadToken(_) => ("invalid_token", "Invalid or malformed token"),
            Self::NotAuthenticated => ("unauthorized", "Authentication required"),
        }
    }
}

impl From<JwtError> for AuthRejection {
    fn from(err: JwtError) -> Self {
        Self::BadToken(err.error_code())
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let (error, message) = self.parts();
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": error, "message": message })),
        )
            .into_response()
    }
}

/// Token from `Authorization: Bearer <token>`. The scheme is case-insensitive.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Validates the bearer token and stores its claims for [`AuthUser`].
///
/// # Errors
///
/// Rejects with 401 when the header is missing, or the token is expired or
/// otherwise invalid.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthRejection> {
    let token = bearer_token(request.headers()).ok_or(AuthRejection::MissingToken)?;
    let claims = state
        .jwt_service
        .validate_token(token)
        .inspect_err(|err| debug!(error = %err, "Rejected bearer token"))?;

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// The authenticated family member making the request.
///
/// Only available behind [`auth_middleware`].
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    /// The acting user; every write is attributed to it.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.0.user_id()
    }

    /// The family all reads and writes are scoped to.
    #[must_use]
    pub const fn family_id(&self) -> FamilyId {
        self.0.family_id()
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(Self)
            .ok_or(AuthRejection::NotAuthenticated)
    }
}
