//! Effective permissions for a user against a workspace or project.
//!
//! Precedence: global ADMIN overrides everything; otherwise the workspace
//! membership role decides; otherwise ProjectMember rows grant read access to
//! those projects only. Results reflect current state and must not be cached
//! across requests.

use crate::error::{AuthzError, Result};
use serde::Serialize;
use uuid::Uuid;
use workhub_database::{DynIdentityStore, DynTenantStore};
use workhub_models::{GlobalRole, WorkspaceRole};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "projectIds", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkspaceAccess {
    Admin,
    Member,
    /// No workspace membership, but explicit membership on these projects.
    ProjectScoped(Vec<Uuid>),
    None,
}

impl WorkspaceAccess {
    pub fn is_admin(&self) -> bool {
        matches!(self, WorkspaceAccess::Admin)
    }

    /// Workspace-wide read: admins and any membership row.
    pub fn can_read_workspace(&self) -> bool {
        matches!(self, WorkspaceAccess::Admin | WorkspaceAccess::Member)
    }

    pub fn can_read_project(&self, project_id: Uuid) -> bool {
        match self {
            WorkspaceAccess::Admin | WorkspaceAccess::Member => true,
            WorkspaceAccess::ProjectScoped(ids) => ids.contains(&project_id),
            WorkspaceAccess::None => false,
        }
    }
}

pub fn resolve_access(
    global_role: GlobalRole,
    membership: Option<WorkspaceRole>,
    project_ids: Vec<Uuid>,
) -> WorkspaceAccess {
    if global_role == GlobalRole::Admin {
        return WorkspaceAccess::Admin;
    }
    match membership {
        Some(WorkspaceRole::Admin) => WorkspaceAccess::Admin,
        Some(WorkspaceRole::User) => WorkspaceAccess::Member,
        None if !project_ids.is_empty() => WorkspaceAccess::ProjectScoped(project_ids),
        None => WorkspaceAccess::None,
    }
}

#[derive(Clone)]
pub struct AuthorizationResolver {
    identities: DynIdentityStore,
    tenants: DynTenantStore,
}

impl AuthorizationResolver {
    pub fn new(identities: DynIdentityStore, tenants: DynTenantStore) -> Self {
        Self {
            identities,
            tenants,
        }
    }

    async fn global_role(&self, user_id: Uuid) -> Result<Option<GlobalRole>> {
        Ok(self.identities.find_user(user_id).await?.map(|u| u.role))
    }

    pub async fn workspace_access(&self, user_id: Uuid, workspace_id: Uuid) -> Result<WorkspaceAccess> {
        let Some(global_role) = self.global_role(user_id).await? else {
            return Ok(WorkspaceAccess::None);
        };
        if global_role == GlobalRole::Admin {
            return Ok(WorkspaceAccess::Admin);
        }

        let membership = self
            .tenants
            .find_workspace_member(workspace_id, user_id)
            .await?
            .map(|m| m.role);

        let project_ids = match membership {
            Some(_) => Vec::new(),
            None => {
                self.tenants
                    .project_ids_for_member(workspace_id, user_id)
                    .await?
            }
        };

        Ok(resolve_access(global_role, membership, project_ids))
    }

    pub async fn is_workspace_admin(&self, user_id: Uuid, workspace_id: Uuid) -> Result<bool> {
        Ok(self.workspace_access(user_id, workspace_id).await?.is_admin())
    }

    pub async fn can_read_workspace(&self, user_id: Uuid, workspace_id: Uuid) -> Result<bool> {
        Ok(self
            .workspace_access(user_id, workspace_id)
            .await?
            .can_read_workspace())
    }

    /// Workspace-wide access to the owning workspace, or an explicit
    /// ProjectMember row. Unknown projects are never readable.
    pub async fn can_read_project(&self, user_id: Uuid, project_id: Uuid) -> Result<bool> {
        let Some(project) = self.tenants.find_project(project_id).await? else {
            return Ok(false);
        };

        let Some(global_role) = self.global_role(user_id).await? else {
            return Ok(false);
        };
        if global_role == GlobalRole::Admin {
            return Ok(true);
        }

        if self
            .tenants
            .find_workspace_member(project.workspace_id, user_id)
            .await?
            .is_some()
        {
            return Ok(true);
        }

        Ok(self
            .tenants
            .find_project_member(project_id, user_id)
            .await?
            .is_some())
    }

    pub async fn require_workspace_admin(&self, user_id: Uuid, workspace_id: Uuid) -> Result<()> {
        if self.is_workspace_admin(user_id, workspace_id).await? {
            return Ok(());
        }
        tracing::debug!(%user_id, %workspace_id, "workspace admin required");
        Err(AuthzError::Forbidden(
            "Workspace admin access required".to_string(),
        ))
    }
}
