use crate::error::{auth_error, ApiError};
use crate::handlers::json_body;
use crate::middleware::AuthUser;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use std::sync::Arc;
use workhub_auth::{LoginRequest, LoginResponse};
use workhub_models::UserView;

/// Exchange email + password for a session token
pub async fn login(
    State(state): State<Arc<AppState>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let request = json_body(body)?;
    let response = state.auth_service.login(request).await.map_err(auth_error)?;
    Ok(Json(response))
}

/// Current user projection
pub async fn me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserView>, ApiError> {
    let view = state
        .auth_service
        .me(user.user_id)
        .await
        .map_err(auth_error)?;
    Ok(Json(view))
}
