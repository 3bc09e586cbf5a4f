use crate::error::{auth_error, error_response, ApiError};
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use uuid::Uuid;
use workhub_auth::Claims;

/// Authenticated user context
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
}

impl TryFrom<Claims> for AuthUser {
    type Error = ApiError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let user_id = claims.user_id().map_err(auth_error)?;
        Ok(Self {
            user_id,
            email: claims.email,
        })
    }
}

/// Extract the bearer token from the Authorization header
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| {
            error_response(
                StatusCode::UNAUTHORIZED,
                "missing_auth_header",
                "Authorization header is required",
            )
        })?
        .to_str()
        .map_err(|_| {
            error_response(
                StatusCode::UNAUTHORIZED,
                "invalid_auth_header",
                "Invalid Authorization header format",
            )
        })?;

    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            error_response(
                StatusCode::UNAUTHORIZED,
                "invalid_auth_scheme",
                "Authorization header must use Bearer scheme",
            )
        })
}

/// Middleware to require authentication
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(&headers)?;
    let claims = state.auth_service.authenticate(token).map_err(|e| {
        tracing::debug!(error = %e, "bearer token rejected");
        auth_error(e)
    })?;

    request.extensions_mut().insert(AuthUser::try_from(claims)?);

    Ok(next.run(request).await)
}
