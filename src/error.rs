//! Central error type + Axum integration.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// A single failed input check, reported under a 422 response.
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Domain error taxonomy. Every expected business outcome is a variant here;
/// `Internal` is the catch-all for genuinely unexpected faults.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("Email already registered")]
    EmailAlreadyRegistered,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("No fields to update")]
    NoFieldsToUpdate,

    #[error("Current password is incorrect")]
    CurrentPasswordIncorrect,

    #[error("Too many requests. Please try again later")]
    RateLimited,

    #[error("{0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::EmailAlreadyRegistered | ApiError::NoFieldsToUpdate => {
                StatusCode::BAD_REQUEST
            }
            ApiError::InvalidCredentials
            | ApiError::Unauthorized(_)
            | ApiError::CurrentPasswordIncorrect => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if let ApiError::Internal(ref e) = self {
            tracing::error!(error = %e, "internal error");
        }

        let body = match &self {
            ApiError::Validation(errors) => serde_json::json!({
                "success": false,
                "errors": errors,
            }),
            other => serde_json::json!({
                "success": false,
                "message": other.to_string(),
            }),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_the_taxonomy() {
        assert_eq!(
            ApiError::Validation(vec![]).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::EmailAlreadyRegistered.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::InvalidCredentials.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Unauthorized("Authorization token missing").status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Forbidden("Access denied. Admins only").status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::NotFound("User not found").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::NoFieldsToUpdate.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::CurrentPasswordIncorrect.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::RateLimited.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ApiError::Internal(anyhow::anyhow!("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn error_messages_match_the_api_contract() {
        assert_eq!(
            ApiError::EmailAlreadyRegistered.to_string(),
            "Email already registered"
        );
        assert_eq!(
            ApiError::InvalidCredentials.to_string(),
            "Invalid credentials"
        );
        assert_eq!(
            ApiError::CurrentPasswordIncorrect.to_string(),
            "Current password is incorrect"
        );
        assert_eq!(ApiError::NoFieldsToUpdate.to_string(), "No fields to update");
    }

    #[test]
    fn internal_error_surfaces_the_underlying_message() {
        // Current behavior: the 500 body carries the raw error text.
        let err = ApiError::Internal(anyhow::anyhow!("connection refused"));
        assert_eq!(err.to_string(), "connection refused");
    }

    #[tokio::test]
    async fn into_response_sets_status_and_json() {
        let response = ApiError::RateLimited.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(response
            .headers()
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap()
            .contains("application/json"));
    }
}
