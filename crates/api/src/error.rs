// Maps domain errors to HTTP status codes and stable error codes.

use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use workhub_auth::AuthError;
use workhub_authz::AuthzError;
use workhub_tenant::TenantError;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: &str, message: &str) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
        }
    }
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn error_response(status: StatusCode, error: &str, message: &str) -> ApiError {
    (status, Json(ErrorResponse::new(error, message)))
}

pub fn validation_error(message: &str) -> ApiError {
    error_response(StatusCode::BAD_REQUEST, "validation_error", message)
}

fn internal_error(detail: &dyn std::fmt::Display) -> ApiError {
    tracing::error!(error = %detail, "request failed");
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal_error",
        "An internal error occurred",
    )
}

pub fn auth_error(err: AuthError) -> ApiError {
    match &err {
        AuthError::ValidationError(msg) => validation_error(msg),
        AuthError::WeakPassword(msg) => error_response(StatusCode::BAD_REQUEST, "weak_password", msg),
        AuthError::InvalidCredentials => error_response(
            StatusCode::UNAUTHORIZED,
            "invalid_credentials",
            "Invalid email or password",
        ),
        AuthError::Unauthorized(msg) => error_response(StatusCode::UNAUTHORIZED, "unauthorized", msg),
        AuthError::InvalidToken(_) => error_response(
            StatusCode::UNAUTHORIZED,
            "invalid_token",
            "Session token is invalid",
        ),
        AuthError::TokenExpired => error_response(
            StatusCode::UNAUTHORIZED,
            "token_expired",
            "Session token has expired",
        ),
        AuthError::Forbidden(msg) => error_response(StatusCode::FORBIDDEN, "forbidden", msg),
        AuthError::NotFound(msg) => error_response(StatusCode::NOT_FOUND, "not_found", msg),
        AuthError::Conflict(msg) => error_response(StatusCode::BAD_REQUEST, "conflict", msg),
        AuthError::AccountExists => error_response(
            StatusCode::BAD_REQUEST,
            "account_exists",
            "An account with this email already exists; sign in instead",
        ),
        AuthError::AlreadyConsumed(msg) => {
            error_response(StatusCode::BAD_REQUEST, "already_consumed", msg)
        }
        AuthError::Expired(msg) => error_response(StatusCode::BAD_REQUEST, "expired", msg),
        AuthError::UpstreamDelivery(cause) => {
            tracing::warn!(error = %cause, "notification delivery failed after commit");
            error_response(
                StatusCode::BAD_GATEWAY,
                "upstream_delivery_failed",
                &format!(
                    "Saved, but the notification could not be delivered ({})",
                    cause.kind()
                ),
            )
        }
        AuthError::DatabaseError(_)
        | AuthError::PasswordHashError(_)
        | AuthError::JwtError(_)
        | AuthError::Internal(_)
        | AuthError::ConfigurationError(_) => internal_error(&err),
    }
}

pub fn authz_error(err: AuthzError) -> ApiError {
    match &err {
        AuthzError::NotFound(msg) => error_response(StatusCode::NOT_FOUND, "not_found", msg),
        AuthzError::Forbidden(msg) => error_response(StatusCode::FORBIDDEN, "forbidden", msg),
        AuthzError::Database(_) => internal_error(&err),
    }
}

pub fn tenant_error(err: TenantError) -> ApiError {
    match err {
        TenantError::Authz(inner) => authz_error(inner),
        TenantError::NotFound(msg) => error_response(StatusCode::NOT_FOUND, "not_found", &msg),
        TenantError::Forbidden(msg) => error_response(StatusCode::FORBIDDEN, "forbidden", &msg),
        TenantError::Validation(msg) => validation_error(&msg),
        TenantError::Conflict(msg) => error_response(StatusCode::BAD_REQUEST, "conflict", &msg),
        TenantError::Database(e) => internal_error(&e),
    }
}
