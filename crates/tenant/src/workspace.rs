// Workspace create / update. The read side lives in `compose`.

use crate::error::{Result, TenantError};
use uuid::Uuid;
use validator::Validate;
use workhub_authz::AuthorizationResolver;
use workhub_database::DynTenantStore;
use workhub_models::{CreateWorkspace, NewWorkspace, UpdateWorkspace, Workspace};

#[derive(Clone)]
pub struct WorkspaceService {
    tenants: DynTenantStore,
    authz: AuthorizationResolver,
}

fn ensure_object(settings: &Option<serde_json::Value>) -> Result<()> {
    match settings {
        Some(value) if !value.is_object() => Err(TenantError::Validation(
            "settings must be a JSON object".to_string(),
        )),
        _ => Ok(()),
    }
}

impl WorkspaceService {
    pub fn new(tenants: DynTenantStore, authz: AuthorizationResolver) -> Self {
        Self { tenants, authz }
    }

    /// The creator becomes owner with an ADMIN membership.
    pub async fn create(&self, owner_id: Uuid, mut request: CreateWorkspace) -> Result<Workspace> {
        request.name = request.name.trim().to_string();
        request.validate()?;
        ensure_object(&request.settings)?;

        let workspace = self
            .tenants
            .create_workspace(NewWorkspace {
                id: Uuid::new_v4(),
                name: request.name,
                slug: request.slug,
                owner_id,
                settings: request.settings.unwrap_or_else(|| serde_json::json!({})),
            })
            .await
            .map_err(|e| {
                if e.is_duplicate() {
                    TenantError::Conflict("Slug is already taken".to_string())
                } else {
                    TenantError::Database(e)
                }
            })?;

        tracing::info!(workspace_id = %workspace.id, %owner_id, slug = %workspace.slug, "workspace created");
        Ok(workspace)
    }

    pub async fn update(
        &self,
        actor_id: Uuid,
        workspace_id: Uuid,
        mut request: UpdateWorkspace,
    ) -> Result<Workspace> {
        request.name = request.name.map(|name| name.trim().to_string());
        request.validate()?;
        ensure_object(&request.settings)?;
        self.authz
            .require_workspace_admin(actor_id, workspace_id)
            .await?;

        self.tenants
            .update_workspace(workspace_id, request)
            .await?
            .ok_or_else(|| TenantError::NotFound(format!("Workspace {}", workspace_id)))
    }
}
