use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::repo_types::{Role, User};
use crate::error::{ApiError, FieldError};

const FULL_NAME_MAX: usize = 50;
const PASSWORD_MIN: usize = 6;
const PASSWORD_MAX: usize = 100;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn check_full_name(full_name: &str, errors: &mut Vec<FieldError>) {
    if full_name.is_empty() {
        errors.push(FieldError {
            field: "full_name",
            message: "Full name cannot be empty".into(),
        });
    } else if full_name.chars().count() > FULL_NAME_MAX {
        errors.push(FieldError {
            field: "full_name",
            message: format!("Full name must be at most {FULL_NAME_MAX} characters"),
        });
    }
}

fn check_email(email: &str, errors: &mut Vec<FieldError>) {
    if !is_valid_email(email) {
        errors.push(FieldError {
            field: "email",
            message: "Invalid email address".into(),
        });
    }
}

fn check_password(field: &'static str, password: &str, errors: &mut Vec<FieldError>) {
    let len = password.chars().count();
    if len < PASSWORD_MIN || len > PASSWORD_MAX {
        errors.push(FieldError {
            field,
            message: format!("Password must be {PASSWORD_MIN}-{PASSWORD_MAX} characters"),
        });
    } else if password.chars().any(char::is_whitespace) {
        errors.push(FieldError {
            field,
            message: "Password must not contain whitespace".into(),
        });
    }
}

/// Request body for signup.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
}

impl SignupRequest {
    /// Trims name and email, then checks every field, collecting all
    /// failures into one 422.
    pub fn validate(&mut self) -> Result<(), ApiError> {
        self.full_name = self.full_name.trim().to_owned();
        self.email = self.email.trim().to_owned();

        let mut errors = Vec::new();
        check_full_name(&self.full_name, &mut errors);
        check_email(&self.email, &mut errors);
        check_password("password", &self.password, &mut errors);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(errors))
        }
    }
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Partial profile update; absent fields are left untouched.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
}

impl UpdateProfileRequest {
    pub fn has_fields(&self) -> bool {
        self.full_name.is_some() || self.email.is_some()
    }

    pub fn validate(&mut self) -> Result<(), ApiError> {
        let mut errors = Vec::new();
        if let Some(full_name) = self.full_name.as_mut() {
            *full_name = full_name.trim().to_owned();
            check_full_name(full_name, &mut errors);
        }
        if let Some(email) = self.email.as_mut() {
            *email = email.trim().to_owned();
            check_email(email, &mut errors);
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(errors))
        }
    }
}

/// Request body for change-password.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

impl ChangePasswordRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = Vec::new();
        check_password("new_password", &self.new_password, &mut errors);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(errors))
        }
    }
}

/// Public part of the user returned to the client. The password hash never
/// crosses this boundary.
#[derive(Debug, Clone, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub role: Role,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name,
            email: user.email,
            role: user.role,
        }
    }
}

/// Response carrying a message and a user, e.g. after signup or update.
#[derive(Debug, Serialize)]
pub struct UserMessageResponse {
    pub success: bool,
    pub message: String,
    pub user: PublicUser,
}

/// Response returned after login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub access_token: String,
    pub token_type: &'static str,
}

/// Response carrying just the authenticated user.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub success: bool,
    pub user: PublicUser,
}

/// Bare success acknowledgement.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

/// Admin listing of every user.
#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub success: bool,
    pub count: usize,
    pub users: Vec<PublicUser>,
}
