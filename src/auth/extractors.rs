use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;
use uuid::Uuid;

use crate::{
    auth::{
        dto::PublicUser,
        jwt::{JwtKeys, TokenError},
        repo_types::{Role, User},
    },
    error::ApiError,
    state::AppState,
};

/// Authenticated caller: bearer token validated and subject loaded from the
/// directory. Sanitized — the password hash never leaves the repo layer.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub role: Role,
}

impl From<User> for CurrentUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name,
            email: user.email,
            role: user.role,
        }
    }
}

impl From<CurrentUser> for PublicUser {
    fn from(user: CurrentUser) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name,
            email: user.email,
            role: user.role,
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Expect "Authorization: Bearer <token>"
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(ApiError::Unauthorized("Authorization token missing"))?;

        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or(ApiError::Unauthorized("Authorization token missing"))?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(token).map_err(|e| {
            warn!(error = %e, "token rejected");
            match e {
                TokenError::Expired => ApiError::Unauthorized("Token has expired"),
                TokenError::Invalid => ApiError::Unauthorized("Invalid token"),
            }
        })?;

        // A valid signature is not enough: the subject must still exist.
        let user = User::find_by_id(&state.db, claims.sub)
            .await?
            .ok_or_else(|| {
                warn!(user_id = %claims.sub, "token subject not found");
                ApiError::Unauthorized("User not found")
            })?;

        Ok(user.into())
    }
}
