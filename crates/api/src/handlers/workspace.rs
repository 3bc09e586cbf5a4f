use crate::error::{tenant_error, ApiError};
use crate::handlers::json_body;
use crate::middleware::AuthUser;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use std::sync::Arc;
use uuid::Uuid;
use workhub_models::{CreateWorkspace, UpdateWorkspace, Workspace, WorkspaceView};

pub async fn create_workspace(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    body: Result<Json<CreateWorkspace>, JsonRejection>,
) -> Result<(StatusCode, Json<Workspace>), ApiError> {
    let request = json_body(body)?;
    tracing::debug!(actor = %user.email, slug = %request.slug, "creating workspace");

    let workspace = state
        .workspace_service
        .create(user.user_id, request)
        .await
        .map_err(tenant_error)?;

    Ok((StatusCode::CREATED, Json(workspace)))
}

/// Composed workspace, redacted to what the caller may see
pub async fn get_workspace(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(workspace_id): Path<Uuid>,
) -> Result<Json<WorkspaceView>, ApiError> {
    let view = state
        .composer
        .compose_for(user.user_id, workspace_id)
        .await
        .map_err(tenant_error)?;
    Ok(Json(view))
}

pub async fn update_workspace(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(workspace_id): Path<Uuid>,
    body: Result<Json<UpdateWorkspace>, JsonRejection>,
) -> Result<Json<Workspace>, ApiError> {
    let request = json_body(body)?;
    let workspace = state
        .workspace_service
        .update(user.user_id, workspace_id, request)
        .await
        .map_err(tenant_error)?;
    Ok(Json(workspace))
}
