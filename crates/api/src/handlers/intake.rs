use crate::error::{auth_error, ApiError};
use crate::handlers::{json_body, query_params, TokenQuery};
use crate::middleware::AuthUser;
use crate::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use workhub_auth::{CreateIntake, IntakeContext, IssuedIntake, SubmittedIntake};
use workhub_models::ClientIntake;
use workhub_tenant::WorkspaceContext;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicIntakeRequest {
    pub workspace_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct SubmitIntakeRequest {
    pub token: String,
    pub payload: serde_json::Value,
}

/// Admin-issued intake link
pub async fn create_intake(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    body: Result<Json<CreateIntake>, JsonRejection>,
) -> Result<(StatusCode, Json<IssuedIntake>), ApiError> {
    let request = json_body(body)?;
    let issued = state
        .intake_service
        .create(user.user_id, request)
        .await
        .map_err(auth_error)?;
    Ok((StatusCode::CREATED, Json(issued)))
}

pub async fn create_public_intake(
    State(state): State<Arc<AppState>>,
    body: Result<Json<PublicIntakeRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<IssuedIntake>), ApiError> {
    let request = json_body(body)?;
    let issued = state
        .intake_service
        .create_public(request.workspace_id)
        .await
        .map_err(auth_error)?;
    Ok((StatusCode::CREATED, Json(issued)))
}

pub async fn lookup_intake(
    State(state): State<Arc<AppState>>,
    query: Result<Query<TokenQuery>, QueryRejection>,
) -> Result<Json<IntakeContext>, ApiError> {
    let TokenQuery { token } = query_params(query)?;
    let context = state
        .intake_service
        .lookup(&token)
        .await
        .map_err(auth_error)?;
    Ok(Json(context))
}

/// A webhook failure surfaces as 502 but the submission stays committed.
pub async fn submit_intake(
    State(state): State<Arc<AppState>>,
    body: Result<Json<SubmitIntakeRequest>, JsonRejection>,
) -> Result<Json<SubmittedIntake>, ApiError> {
    let request = json_body(body)?;
    let submitted = state
        .intake_service
        .submit(&request.token, request.payload)
        .await
        .map_err(auth_error)?;
    Ok(Json(submitted))
}

pub async fn list_intakes(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    workspace: WorkspaceContext,
) -> Result<Json<Vec<ClientIntake>>, ApiError> {
    let intakes = state
        .intake_service
        .list(user.user_id, workspace.workspace_id)
        .await
        .map_err(auth_error)?;
    Ok(Json(intakes))
}
