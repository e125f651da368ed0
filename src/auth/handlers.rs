use axum::{
    extract::{FromRef, Path, State},
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{
            ChangePasswordRequest, LoginRequest, LoginResponse, MessageResponse, PublicUser,
            SignupRequest, UpdateProfileRequest, UserListResponse, UserMessageResponse,
            UserResponse,
        },
        extractors::CurrentUser,
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo_types::{Role, User},
    },
    error::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/profile", get(profile))
        .route("/auth/admin-only", get(admin_only))
        .route("/auth/users", get(list_users))
        .route("/auth/users/:id/profile", put(update_profile))
        .route("/auth/users/:id/change-password", post(change_password))
}

fn authorize_self(current: &CurrentUser, resource_id: Uuid) -> Result<(), ApiError> {
    if current.id == resource_id {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "Access denied. You can only manage your own account",
        ))
    }
}

fn authorize_admin(current: &CurrentUser) -> Result<(), ApiError> {
    match current.role {
        Role::Admin => Ok(()),
        Role::User => Err(ApiError::Forbidden("Access denied. Admins only")),
    }
}

fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    Json(mut payload): Json<SignupRequest>,
) -> Result<Json<UserMessageResponse>, ApiError> {
    payload.validate()?;

    // Advisory pre-check for a friendly error; the unique index decides.
    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::EmailAlreadyRegistered);
    }

    let hash = hash_password(&payload.password)?;

    let user = match User::create(
        &state.db,
        &payload.full_name,
        &payload.email,
        &hash,
        payload.role,
    )
    .await
    {
        Ok(u) => u,
        Err(e) if is_unique_violation(&e) => {
            // Concurrent signup with the same email won the race.
            warn!(email = %payload.email, "duplicate signup rejected by unique index");
            return Err(ApiError::EmailAlreadyRegistered);
        }
        Err(e) => return Err(e.into()),
    };

    info!(user_id = %user.id, email = %user.email, "user created");
    Ok(Json(UserMessageResponse {
        success: true,
        message: "User created successfully".into(),
        user: user.into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let email = payload.email.trim();

    // Unknown email and wrong password answer identically so the endpoint
    // cannot be used to enumerate accounts.
    let user = match User::find_by_email(&state.db, email).await? {
        Some(u) => u,
        None => {
            warn!("login with unknown email");
            return Err(ApiError::InvalidCredentials);
        }
    };

    if !verify_password(&payload.password, &user.password_hash) {
        warn!(user_id = %user.id, "login with wrong password");
        return Err(ApiError::InvalidCredentials);
    }

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign(user.id)?;

    info!(user_id = %user.id, "user logged in");
    Ok(Json(LoginResponse {
        success: true,
        access_token,
        token_type: "bearer",
    }))
}

#[instrument(skip_all)]
pub async fn profile(current: CurrentUser) -> Json<UserResponse> {
    Json(UserResponse {
        success: true,
        user: current.into(),
    })
}

#[instrument(skip_all)]
pub async fn admin_only(current: CurrentUser) -> Result<Json<UserResponse>, ApiError> {
    authorize_admin(&current)?;
    Ok(Json(UserResponse {
        success: true,
        user: current.into(),
    }))
}

#[instrument(skip(state, current, payload), fields(user_id = %user_id))]
pub async fn update_profile(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    current: CurrentUser,
    Json(mut payload): Json<UpdateProfileRequest>,
) -> Result<Json<UserMessageResponse>, ApiError> {
    authorize_self(&current, user_id)?;
    payload.validate()?;
    if !payload.has_fields() {
        return Err(ApiError::NoFieldsToUpdate);
    }

    let updated = match User::update_fields(
        &state.db,
        user_id,
        payload.full_name.as_deref(),
        payload.email.as_deref(),
    )
    .await
    {
        Ok(u) => u,
        Err(e) if is_unique_violation(&e) => {
            warn!("profile update to an email that is already taken");
            return Err(ApiError::EmailAlreadyRegistered);
        }
        Err(e) => return Err(e.into()),
    };
    let user = updated.ok_or(ApiError::NotFound("User not found"))?;

    info!(user_id = %user.id, "profile updated");
    Ok(Json(UserMessageResponse {
        success: true,
        message: "Profile updated successfully".into(),
        user: user.into(),
    }))
}

#[instrument(skip(state, current, payload), fields(user_id = %user_id))]
pub async fn change_password(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    current: CurrentUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    authorize_self(&current, user_id)?;
    payload.validate()?;

    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or(ApiError::NotFound("User not found"))?;

    if !verify_password(&payload.current_password, &user.password_hash) {
        warn!(user_id = %user.id, "change-password with wrong current password");
        return Err(ApiError::CurrentPasswordIncorrect);
    }

    let new_hash = hash_password(&payload.new_password)?;
    User::update_password_hash(&state.db, user_id, &new_hash).await?;

    info!(user_id = %user.id, "password changed");
    Ok(Json(MessageResponse {
        success: true,
        message: "Password changed successfully".into(),
    }))
}

#[instrument(skip_all)]
pub async fn list_users(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<UserListResponse>, ApiError> {
    authorize_admin(&current)?;

    let users: Vec<PublicUser> = User::list_all(&state.db)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Json(UserListResponse {
        success: true,
        count: users.len(),
        users,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn current(role: Role) -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            full_name: "Test User".into(),
            email: "test@example.com".into(),
            role,
        }
    }

    #[test]
    fn authorize_self_accepts_own_id_only() {
        let user = current(Role::User);
        assert!(authorize_self(&user, user.id).is_ok());

        let err = authorize_self(&user, Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[test]
    fn authorize_admin_requires_admin_role() {
        assert!(authorize_admin(&current(Role::Admin)).is_ok());

        let err = authorize_admin(&current(Role::User)).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
        assert_eq!(err.to_string(), "Access denied. Admins only");
    }
}
