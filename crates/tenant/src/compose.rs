//! Workspace read-model composer.
//!
//! Builds the nested [`WorkspaceView`] from normalized rows with a fixed
//! number of store round-trips regardless of how many users the workspace
//! references:
//!
//! 1. workspace row
//! 2. members and projects (concurrently)
//! 3. project members and tasks for every project id (concurrently)
//! 4. every referenced user in one batched lookup
//!
//! Assembly is bottom-up (tasks, then projects, then workspace) so each
//! attachment is a map lookup. References whose user row is gone resolve to
//! `None` rather than a dangling id. The queries do not share a transaction,
//! so a concurrent write may be observed half-applied.

use crate::error::{Result, TenantError};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;
use workhub_authz::{AuthorizationResolver, WorkspaceAccess};
use workhub_database::{DynIdentityStore, DynTenantStore};
use workhub_models::{
    ProjectMemberView, ProjectView, TaskView, UserView, WorkspaceMemberView, WorkspaceView,
};

#[derive(Clone)]
pub struct WorkspaceComposer {
    identities: DynIdentityStore,
    tenants: DynTenantStore,
    authz: AuthorizationResolver,
}

impl WorkspaceComposer {
    pub fn new(
        identities: DynIdentityStore,
        tenants: DynTenantStore,
        authz: AuthorizationResolver,
    ) -> Self {
        Self {
            identities,
            tenants,
            authz,
        }
    }

    /// Full, unredacted view.
    pub async fn compose(&self, workspace_id: Uuid) -> Result<WorkspaceView> {
        self.compose_scoped(workspace_id, &WorkspaceAccess::Admin).await
    }

    /// View as seen by `viewer_id`. Admins get everything; workspace members
    /// lose `settings`; project-only members additionally see only their own
    /// projects and no member roster.
    pub async fn compose_for(&self, viewer_id: Uuid, workspace_id: Uuid) -> Result<WorkspaceView> {
        let access = self.authz.workspace_access(viewer_id, workspace_id).await?;

        match &access {
            WorkspaceAccess::Admin => self.compose(workspace_id).await,
            WorkspaceAccess::Member => {
                let mut view = self.compose(workspace_id).await?;
                view.settings = None;
                Ok(view)
            }
            WorkspaceAccess::ProjectScoped(_) => {
                let mut view = self.compose_scoped(workspace_id, &access).await?;
                view.settings = None;
                view.members.clear();
                Ok(view)
            }
            WorkspaceAccess::None => {
                if self.tenants.find_workspace(workspace_id).await?.is_none() {
                    return Err(TenantError::NotFound(format!("Workspace {}", workspace_id)));
                }
                tracing::debug!(%viewer_id, %workspace_id, "workspace read denied");
                Err(TenantError::Forbidden(
                    "No access to this workspace".to_string(),
                ))
            }
        }
    }

    async fn compose_scoped(
        &self,
        workspace_id: Uuid,
        access: &WorkspaceAccess,
    ) -> Result<WorkspaceView> {
        let workspace = self
            .tenants
            .find_workspace(workspace_id)
            .await?
            .ok_or_else(|| TenantError::NotFound(format!("Workspace {}", workspace_id)))?;

        let (members, mut projects) = tokio::try_join!(
            self.tenants.list_workspace_members(workspace_id),
            self.tenants.list_projects(workspace_id),
        )?;

        projects.retain(|p| access.can_read_project(p.id));

        let project_ids: Vec<Uuid> = projects.iter().map(|p| p.id).collect();
        let (project_members, tasks) = tokio::try_join!(
            self.tenants.list_project_members(&project_ids),
            self.tenants.list_tasks(&project_ids),
        )?;

        let mut user_ids: HashSet<Uuid> = HashSet::new();
        user_ids.insert(workspace.owner_id);
        user_ids.extend(members.iter().map(|m| m.user_id));
        user_ids.extend(projects.iter().filter_map(|p| p.team_lead_id));
        user_ids.extend(project_members.iter().map(|m| m.user_id));
        user_ids.extend(tasks.iter().filter_map(|t| t.assignee_id));
        let user_ids: Vec<Uuid> = user_ids.into_iter().collect();

        // Credentials are dropped here; only projections leave this point.
        let users: HashMap<Uuid, UserView> = self
            .identities
            .find_users_by_ids(&user_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, UserView::from(u)))
            .collect();
        let resolve = |id: Option<Uuid>| id.and_then(|id| users.get(&id).cloned());

        let mut tasks_by_project: HashMap<Uuid, Vec<TaskView>> = HashMap::new();
        for task in tasks {
            let assignee = resolve(task.assignee_id);
            tasks_by_project
                .entry(task.project_id)
                .or_default()
                .push(TaskView { task, assignee });
        }

        let mut members_by_project: HashMap<Uuid, Vec<ProjectMemberView>> = HashMap::new();
        for member in project_members {
            let user = resolve(Some(member.user_id));
            members_by_project
                .entry(member.project_id)
                .or_default()
                .push(ProjectMemberView { member, user });
        }

        let projects = projects
            .into_iter()
            .map(|project| ProjectView {
                team_lead: resolve(project.team_lead_id),
                members: members_by_project.remove(&project.id).unwrap_or_default(),
                tasks: tasks_by_project.remove(&project.id).unwrap_or_default(),
                project,
            })
            .collect();

        let members = members
            .into_iter()
            .map(|member| {
                let user = resolve(Some(member.user_id));
                WorkspaceMemberView::new(member, user)
            })
            .collect();

        Ok(WorkspaceView {
            id: workspace.id,
            name: workspace.name,
            slug: workspace.slug,
            owner: resolve(Some(workspace.owner_id)),
            owner_id: workspace.owner_id,
            settings: Some(workspace.settings),
            members,
            projects,
            created_at: workspace.created_at,
            updated_at: workspace.updated_at,
        })
    }
}
