use crate::error::{auth_error, ApiError};
use crate::handlers::{json_body, query_params, TokenQuery};
use crate::middleware::AuthUser;
use crate::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Extension, Json,
};
use std::sync::Arc;
use uuid::Uuid;
use workhub_auth::{AcceptInvitation, AcceptedInvitation, InvitationDetails, IssuedInvitation};
use workhub_models::{CreateInvitation, Invitation};
use workhub_tenant::WorkspaceContext;

/// Issue an invitation (workspace admin only)
pub async fn create_invitation(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    body: Result<Json<CreateInvitation>, JsonRejection>,
) -> Result<(StatusCode, Json<IssuedInvitation>), ApiError> {
    let request = json_body(body)?;
    let issued = state
        .invitation_service
        .create(user.user_id, request)
        .await
        .map_err(auth_error)?;

    Ok((StatusCode::CREATED, Json(issued)))
}

pub async fn list_invitations(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    workspace: WorkspaceContext,
) -> Result<Json<Vec<Invitation>>, ApiError> {
    let invitations = state
        .invitation_service
        .list(user.user_id, workspace.workspace_id)
        .await
        .map_err(auth_error)?;
    Ok(Json(invitations))
}

pub async fn revoke_invitation(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    workspace: WorkspaceContext,
    Path(invitation_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .invitation_service
        .revoke(user.user_id, workspace.workspace_id, invitation_id)
        .await
        .map_err(auth_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Public: what the accept page shows before the visitor sets a password
pub async fn lookup_invitation(
    State(state): State<Arc<AppState>>,
    query: Result<Query<TokenQuery>, QueryRejection>,
) -> Result<Json<InvitationDetails>, ApiError> {
    let TokenQuery { token } = query_params(query)?;
    let details = state
        .invitation_service
        .lookup(&token)
        .await
        .map_err(auth_error)?;
    Ok(Json(details))
}

/// Public: consume the token, create or attach the account and sign in
pub async fn accept_invitation(
    State(state): State<Arc<AppState>>,
    body: Result<Json<AcceptInvitation>, JsonRejection>,
) -> Result<Json<AcceptedInvitation>, ApiError> {
    let request = json_body(body)?;
    let accepted = state
        .invitation_service
        .accept(request)
        .await
        .map_err(auth_error)?;
    Ok(Json(accepted))
}
