use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use vigil_core::error::{AuthError, Error, StorageError, TokenError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Not found")]
    NotFound,

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Internal server error")]
    Internal,
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match &err {
            // Blocked, invalid credentials, and disabled accounts share a
            // status so the response shape does not reveal which one fired.
            Error::Auth(AuthError::Blocked { .. })
            | Error::Auth(AuthError::InvalidCredentials)
            | Error::Auth(AuthError::AccountDisabled) => {
                ApiError::Unauthorized(err.to_string())
            }
            Error::Auth(AuthError::AlreadyExists) => ApiError::BadRequest(err.to_string()),
            Error::Token(TokenError::Invalid)
            | Error::Token(TokenError::Revoked)
            | Error::Token(TokenError::Expired)
            | Error::Token(TokenError::Verification(_)) => {
                ApiError::Unauthorized(err.to_string())
            }
            Error::Validation(_) => ApiError::BadRequest(err.to_string()),
            Error::Storage(StorageError::NotFound) => ApiError::NotFound,
            _ => {
                tracing::error!(error = %err, "Unexpected error");
                ApiError::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.as_str()),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden"),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Not found"),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
            ApiError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "Unexpected server error"),
        };

        let body = Json(json!({
            "error": error_message,
            "code": status.as_u16()
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
