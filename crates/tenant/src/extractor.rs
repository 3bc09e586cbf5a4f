// Extracts the target workspace from the `workspaceId` query parameter or the
// `X-Workspace-Id` header (query wins).

use crate::context::WorkspaceContext;
use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::collections::HashMap;
use uuid::Uuid;

pub const WORKSPACE_HEADER: &str = "x-workspace-id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceRejection {
    Missing,
    Malformed(String),
}

impl IntoResponse for WorkspaceRejection {
    fn into_response(self) -> Response {
        let message = match self {
            WorkspaceRejection::Missing => "workspaceId is required".to_string(),
            WorkspaceRejection::Malformed(raw) => format!("Invalid workspaceId: {}", raw),
        };
        (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": "validation_error",
                "message": message,
            })),
        )
            .into_response()
    }
}

pub fn workspace_id_from_parts(parts: &Parts) -> Result<Uuid, WorkspaceRejection> {
    let from_query = Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
        .ok()
        .and_then(|Query(params)| params.get("workspaceId").cloned());

    let raw = match from_query {
        Some(raw) => raw,
        None => parts
            .headers
            .get(WORKSPACE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or(WorkspaceRejection::Missing)?,
    };

    Uuid::parse_str(raw.trim()).map_err(|_| WorkspaceRejection::Malformed(raw))
}

#[async_trait]
impl<S> FromRequestParts<S> for WorkspaceContext
where
    S: Send + Sync,
{
    type Rejection = WorkspaceRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        workspace_id_from_parts(parts).map(WorkspaceContext::new)
    }
}
