//! In-process store for local development (`STORE_BACKEND=memory`) and tests.
//!
//! Every trait call that would hit Postgres counts as one query, which lets
//! callers assert batching behaviour. The `seed_*` helpers stand in for the
//! plain CRUD surface and are not counted.

use crate::error::{DatabaseError, Result};
use crate::store::{
    AcceptOutcome, AccountResolution, IdentityStore, IntakeSubmission, InvitationAcceptance,
    TenantStore,
};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;
use workhub_models::{
    Client, ClientIntake, GlobalRole, IntakeStatus, Invitation, NewIntake, NewInvitation,
    NewUser, NewWorkspace, Project, ProjectMember, Task, UpdateWorkspace, User, Workspace,
    WorkspaceMember, WorkspaceRole,
};

#[derive(Default)]
struct State {
    users: Vec<User>,
    workspaces: Vec<Workspace>,
    workspace_members: Vec<WorkspaceMember>,
    projects: Vec<Project>,
    project_members: Vec<ProjectMember>,
    tasks: Vec<Task>,
    clients: Vec<Client>,
    invitations: Vec<Invitation>,
    intakes: Vec<ClientIntake>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
    queries: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of store queries issued since creation or the last reset.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn reset_query_count(&self) {
        self.queries.store(0, Ordering::SeqCst);
    }

    fn tick(&self) {
        self.queries.fetch_add(1, Ordering::SeqCst);
    }

    pub async fn seed_user(
        &self,
        name: &str,
        email: &str,
        role: GlobalRole,
        password_hash: Option<String>,
    ) -> User {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_lowercase(),
            password_hash,
            role,
            created_at: now,
            updated_at: now,
        };
        self.state.write().await.users.push(user.clone());
        user
    }

    /// Workspace plus the owner's ADMIN membership.
    pub async fn seed_workspace(&self, owner_id: Uuid, name: &str, slug: &str) -> Workspace {
        let now = Utc::now();
        let workspace = Workspace {
            id: Uuid::new_v4(),
            name: name.to_string(),
            slug: slug.to_string(),
            owner_id,
            settings: serde_json::json!({}),
            created_at: now,
            updated_at: now,
        };
        let mut state = self.state.write().await;
        state.workspaces.push(workspace.clone());
        state.workspace_members.push(WorkspaceMember {
            id: Uuid::new_v4(),
            workspace_id: workspace.id,
            user_id: owner_id,
            role: WorkspaceRole::Admin,
            message: None,
            joined_at: now,
        });
        workspace
    }

    pub async fn seed_member(
        &self,
        workspace_id: Uuid,
        user_id: Uuid,
        role: WorkspaceRole,
    ) -> WorkspaceMember {
        let member = WorkspaceMember {
            id: Uuid::new_v4(),
            workspace_id,
            user_id,
            role,
            message: None,
            joined_at: Utc::now(),
        };
        self.state.write().await.workspace_members.push(member.clone());
        member
    }

    pub async fn seed_project(
        &self,
        workspace_id: Uuid,
        name: &str,
        team_lead_id: Option<Uuid>,
    ) -> Project {
        let project = Project {
            id: Uuid::new_v4(),
            workspace_id,
            name: name.to_string(),
            priority: "MEDIUM".to_string(),
            status: "ACTIVE".to_string(),
            start_date: None,
            end_date: None,
            team_lead_id,
            progress: 0,
            created_at: Utc::now(),
        };
        self.state.write().await.projects.push(project.clone());
        project
    }

    pub async fn seed_project_member(&self, project_id: Uuid, user_id: Uuid) -> ProjectMember {
        let member = ProjectMember {
            id: Uuid::new_v4(),
            project_id,
            user_id,
            added_at: Utc::now(),
        };
        self.state.write().await.project_members.push(member.clone());
        member
    }

    pub async fn seed_task(&self, project_id: Uuid, title: &str, assignee_id: Option<Uuid>) -> Task {
        let task = Task {
            id: Uuid::new_v4(),
            project_id,
            title: title.to_string(),
            status: "TODO".to_string(),
            task_type: "TASK".to_string(),
            priority: "MEDIUM".to_string(),
            assignee_id,
            due_date: None,
            created_at: Utc::now(),
        };
        self.state.write().await.tasks.push(task.clone());
        task
    }

    pub async fn seed_client(&self, workspace_id: Uuid, name: &str) -> Client {
        let client = Client {
            id: Uuid::new_v4(),
            workspace_id,
            name: name.to_string(),
            company: None,
            email: None,
            phone: None,
            website: None,
            industry: None,
            details: serde_json::json!({}),
            portal_workspace_id: None,
            created_at: Utc::now(),
        };
        self.state.write().await.clients.push(client.clone());
        client
    }

    /// Removes a user row, leaving references to it dangling.
    pub async fn remove_user(&self, user_id: Uuid) {
        self.state.write().await.users.retain(|u| u.id != user_id);
    }

    pub async fn clients(&self) -> Vec<Client> {
        self.state.read().await.clients.clone()
    }
}

fn user_from(new_user: NewUser) -> User {
    let now = Utc::now();
    User {
        id: new_user.id,
        name: new_user.name,
        email: new_user.email.to_lowercase(),
        password_hash: new_user.password_hash,
        role: new_user.role,
        created_at: now,
        updated_at: now,
    }
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        self.tick();
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.tick();
        let email = email.to_lowercase();
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_users_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.tick();
        let state = self.state.read().await;
        Ok(state
            .users
            .iter()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect())
    }

    async fn create_user(&self, user: NewUser) -> Result<User> {
        self.tick();
        let mut state = self.state.write().await;
        let email = user.email.to_lowercase();
        if state.users.iter().any(|u| u.email == email) {
            return Err(DatabaseError::duplicate("User", "email"));
        }
        let user = user_from(user);
        state.users.push(user.clone());
        Ok(user)
    }
}

#[async_trait]
impl TenantStore for MemoryStore {
    async fn find_workspace(&self, id: Uuid) -> Result<Option<Workspace>> {
        self.tick();
        let state = self.state.read().await;
        Ok(state.workspaces.iter().find(|w| w.id == id).cloned())
    }

    async fn create_workspace(&self, workspace: NewWorkspace) -> Result<Workspace> {
        self.tick();
        let mut state = self.state.write().await;
        if state.workspaces.iter().any(|w| w.slug == workspace.slug) {
            return Err(DatabaseError::duplicate("Workspace", "slug"));
        }
        let now = Utc::now();
        let workspace = Workspace {
            id: workspace.id,
            name: workspace.name,
            slug: workspace.slug,
            owner_id: workspace.owner_id,
            settings: workspace.settings,
            created_at: now,
            updated_at: now,
        };
        state.workspaces.push(workspace.clone());
        state.workspace_members.push(WorkspaceMember {
            id: Uuid::new_v4(),
            workspace_id: workspace.id,
            user_id: workspace.owner_id,
            role: WorkspaceRole::Admin,
            message: None,
            joined_at: now,
        });
        Ok(workspace)
    }

    async fn update_workspace(
        &self,
        id: Uuid,
        update: UpdateWorkspace,
    ) -> Result<Option<Workspace>> {
        self.tick();
        let mut state = self.state.write().await;
        let Some(workspace) = state.workspaces.iter_mut().find(|w| w.id == id) else {
            return Ok(None);
        };
        if let Some(name) = update.name {
            workspace.name = name;
        }
        if let Some(settings) = update.settings {
            workspace.settings = settings;
        }
        workspace.updated_at = Utc::now();
        Ok(Some(workspace.clone()))
    }

    async fn list_workspace_members(&self, workspace_id: Uuid) -> Result<Vec<WorkspaceMember>> {
        self.tick();
        let state = self.state.read().await;
        Ok(state
            .workspace_members
            .iter()
            .filter(|m| m.workspace_id == workspace_id)
            .cloned()
            .collect())
    }

    async fn find_workspace_member(
        &self,
        workspace_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<WorkspaceMember>> {
        self.tick();
        let state = self.state.read().await;
        Ok(state
            .workspace_members
            .iter()
            .find(|m| m.workspace_id == workspace_id && m.user_id == user_id)
            .cloned())
    }

    async fn list_projects(&self, workspace_id: Uuid) -> Result<Vec<Project>> {
        self.tick();
        let state = self.state.read().await;
        Ok(state
            .projects
            .iter()
            .filter(|p| p.workspace_id == workspace_id)
            .cloned()
            .collect())
    }

    async fn find_project(&self, id: Uuid) -> Result<Option<Project>> {
        self.tick();
        let state = self.state.read().await;
        Ok(state.projects.iter().find(|p| p.id == id).cloned())
    }

    async fn list_project_members(&self, project_ids: &[Uuid]) -> Result<Vec<ProjectMember>> {
        if project_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.tick();
        let state = self.state.read().await;
        Ok(state
            .project_members
            .iter()
            .filter(|m| project_ids.contains(&m.project_id))
            .cloned()
            .collect())
    }

    async fn list_tasks(&self, project_ids: &[Uuid]) -> Result<Vec<Task>> {
        if project_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.tick();
        let state = self.state.read().await;
        Ok(state
            .tasks
            .iter()
            .filter(|t| project_ids.contains(&t.project_id))
            .cloned()
            .collect())
    }

    async fn find_project_member(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<ProjectMember>> {
        self.tick();
        let state = self.state.read().await;
        Ok(state
            .project_members
            .iter()
            .find(|m| m.project_id == project_id && m.user_id == user_id)
            .cloned())
    }

    async fn project_ids_for_member(&self, workspace_id: Uuid, user_id: Uuid) -> Result<Vec<Uuid>> {
        self.tick();
        let state = self.state.read().await;
        Ok(state
            .projects
            .iter()
            .filter(|p| p.workspace_id == workspace_id)
            .filter(|p| {
                state
                    .project_members
                    .iter()
                    .any(|m| m.project_id == p.id && m.user_id == user_id)
            })
            .map(|p| p.id)
            .collect())
    }

    async fn find_client(&self, id: Uuid) -> Result<Option<Client>> {
        self.tick();
        let state = self.state.read().await;
        Ok(state.clients.iter().find(|c| c.id == id).cloned())
    }

    async fn create_invitation(&self, invitation: NewInvitation) -> Result<Invitation> {
        self.tick();
        let mut state = self.state.write().await;
        if state
            .invitations
            .iter()
            .any(|i| i.token_hash == invitation.token_hash)
        {
            return Err(DatabaseError::duplicate("Invitation", "token"));
        }
        let invitation = Invitation {
            id: invitation.id,
            email: invitation.email.to_lowercase(),
            role: invitation.role,
            workspace_id: invitation.workspace_id,
            project_id: invitation.project_id,
            token_hash: invitation.token_hash,
            invited_by: invitation.invited_by,
            expires_at: invitation.expires_at,
            accepted_at: None,
            created_at: Utc::now(),
        };
        state.invitations.push(invitation.clone());
        Ok(invitation)
    }

    async fn find_invitation_by_token_hash(&self, token_hash: &str) -> Result<Option<Invitation>> {
        self.tick();
        let state = self.state.read().await;
        Ok(state
            .invitations
            .iter()
            .find(|i| i.token_hash == token_hash)
            .cloned())
    }

    async fn list_invitations(&self, workspace_id: Uuid) -> Result<Vec<Invitation>> {
        self.tick();
        let state = self.state.read().await;
        let mut invitations: Vec<Invitation> = state
            .invitations
            .iter()
            .filter(|i| i.workspace_id == workspace_id)
            .cloned()
            .collect();
        invitations.reverse();
        Ok(invitations)
    }

    async fn delete_pending_invitation(&self, workspace_id: Uuid, id: Uuid) -> Result<bool> {
        self.tick();
        let mut state = self.state.write().await;
        let before = state.invitations.len();
        state.invitations.retain(|i| {
            !(i.id == id && i.workspace_id == workspace_id && i.accepted_at.is_none())
        });
        Ok(state.invitations.len() < before)
    }

    async fn accept_invitation(&self, acceptance: InvitationAcceptance) -> Result<AcceptOutcome> {
        self.tick();
        let mut state = self.state.write().await;
        let now = acceptance.accepted_at;

        // Every check runs before the first mutation so a rejected commit
        // leaves no partial writes behind.
        let Some(invitation_idx) = state.invitations.iter().position(|i| {
            i.id == acceptance.invitation_id && i.accepted_at.is_none() && i.expires_at > now
        }) else {
            return Ok(AcceptOutcome::AlreadyConsumed);
        };

        let user = match acceptance.account {
            AccountResolution::Create(new_user) => {
                let email = new_user.email.to_lowercase();
                if state.users.iter().any(|u| u.email == email) {
                    return Ok(AcceptOutcome::AccountClaimed);
                }
                let user = user_from(new_user);
                state.users.push(user.clone());
                user
            }
            AccountResolution::AttachCredentials {
                user_id,
                password_hash,
                role,
            } => {
                let Some(user) = state
                    .users
                    .iter_mut()
                    .find(|u| u.id == user_id && u.password_hash.is_none())
                else {
                    return Ok(AcceptOutcome::AccountClaimed);
                };
                user.password_hash = Some(password_hash);
                user.role = role;
                user.updated_at = now;
                user.clone()
            }
        };

        state.invitations[invitation_idx].accepted_at = Some(now);

        match state
            .workspace_members
            .iter_mut()
            .find(|m| m.workspace_id == acceptance.workspace_id && m.user_id == user.id)
        {
            Some(member) => {
                if member.role != WorkspaceRole::Admin {
                    member.role = acceptance.workspace_role;
                }
            }
            None => state.workspace_members.push(WorkspaceMember {
                id: Uuid::new_v4(),
                workspace_id: acceptance.workspace_id,
                user_id: user.id,
                role: acceptance.workspace_role,
                message: None,
                joined_at: now,
            }),
        }

        if let Some(project_id) = acceptance.project_id {
            let exists = state
                .project_members
                .iter()
                .any(|m| m.project_id == project_id && m.user_id == user.id);
            if !exists {
                state.project_members.push(ProjectMember {
                    id: Uuid::new_v4(),
                    project_id,
                    user_id: user.id,
                    added_at: now,
                });
            }
        }

        Ok(AcceptOutcome::Accepted(user))
    }

    async fn create_intake(&self, intake: NewIntake) -> Result<ClientIntake> {
        self.tick();
        let mut state = self.state.write().await;
        if state.intakes.iter().any(|i| i.token_hash == intake.token_hash) {
            return Err(DatabaseError::duplicate("ClientIntake", "token"));
        }
        let intake = ClientIntake {
            id: intake.id,
            workspace_id: intake.workspace_id,
            client_id: intake.client_id,
            token_hash: intake.token_hash,
            status: IntakeStatus::Open,
            source: intake.source,
            expires_at: intake.expires_at,
            name: None,
            company: None,
            email: None,
            phone: None,
            website: None,
            industry: None,
            service_type: None,
            business_details: None,
            files: serde_json::json!([]),
            payload: None,
            submitted_at: None,
            created_at: Utc::now(),
        };
        state.intakes.push(intake.clone());
        Ok(intake)
    }

    async fn find_intake_by_token_hash(&self, token_hash: &str) -> Result<Option<ClientIntake>> {
        self.tick();
        let state = self.state.read().await;
        Ok(state
            .intakes
            .iter()
            .find(|i| i.token_hash == token_hash)
            .cloned())
    }

    async fn list_intakes(&self, workspace_id: Uuid) -> Result<Vec<ClientIntake>> {
        self.tick();
        let state = self.state.read().await;
        let mut intakes: Vec<ClientIntake> = state
            .intakes
            .iter()
            .filter(|i| i.workspace_id == workspace_id)
            .cloned()
            .collect();
        intakes.reverse();
        Ok(intakes)
    }

    async fn submit_intake(&self, submission: IntakeSubmission) -> Result<Option<ClientIntake>> {
        self.tick();
        let mut state = self.state.write().await;
        let now = submission.submitted_at;

        let Some(idx) = state.intakes.iter().position(|i| {
            i.id == submission.intake_id && i.status == IntakeStatus::Open && i.expires_at > now
        }) else {
            return Ok(None);
        };

        let client_id = match submission.new_client {
            Some(new_client) => {
                let client = Client {
                    id: new_client.id,
                    workspace_id: new_client.workspace_id,
                    name: new_client.name,
                    company: new_client.company,
                    email: new_client.email,
                    phone: new_client.phone,
                    website: new_client.website,
                    industry: new_client.industry,
                    details: new_client.details,
                    portal_workspace_id: None,
                    created_at: now,
                };
                let id = client.id;
                state.clients.push(client);
                Some(id)
            }
            None => state.intakes[idx].client_id,
        };

        let fields = submission.fields;
        let intake = &mut state.intakes[idx];
        intake.status = IntakeStatus::Submitted;
        intake.submitted_at = Some(now);
        intake.client_id = client_id;
        intake.name = fields.name;
        intake.company = fields.company;
        intake.email = fields.email;
        intake.phone = fields.phone;
        intake.website = fields.website;
        intake.industry = fields.industry;
        intake.service_type = fields.service_type;
        intake.business_details = fields.business_details;
        intake.files = serde_json::json!(fields.files);
        intake.payload = Some(submission.payload);

        Ok(Some(intake.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use workhub_models::{IntakeFields, IntakeSource, InvitationRole};

    #[tokio::test]
    async fn test_batch_lookup_with_no_ids_issues_no_query() {
        let store = MemoryStore::new();
        assert!(store.find_users_by_ids(&[]).await.unwrap().is_empty());
        assert!(store.list_tasks(&[]).await.unwrap().is_empty());
        assert!(store.list_project_members(&[]).await.unwrap().is_empty());
        assert_eq!(store.query_count(), 0);
    }

    #[tokio::test]
    async fn test_create_user_rejects_duplicate_email() {
        let store = MemoryStore::new();
        store
            .seed_user("Ada", "ada@example.com", GlobalRole::User, None)
            .await;

        let result = store
            .create_user(NewUser {
                id: Uuid::new_v4(),
                name: "Ada Again".to_string(),
                email: "ADA@example.com".to_string(),
                password_hash: None,
                role: GlobalRole::User,
            })
            .await;

        assert!(matches!(result, Err(DatabaseError::DuplicateEntry(_))));
    }

    #[tokio::test]
    async fn test_accept_invitation_is_compare_and_swap() {
        let store = MemoryStore::new();
        let owner = store
            .seed_user("Owner", "owner@example.com", GlobalRole::User, None)
            .await;
        let workspace = store.seed_workspace(owner.id, "Acme", "acme").await;
        let invitation = store
            .create_invitation(NewInvitation {
                id: Uuid::new_v4(),
                email: "new@example.com".to_string(),
                role: InvitationRole::User,
                workspace_id: workspace.id,
                project_id: None,
                token_hash: "a".repeat(64),
                invited_by: Some(owner.id),
                expires_at: Utc::now() + Duration::days(7),
            })
            .await
            .unwrap();

        let acceptance = |email: &str| InvitationAcceptance {
            invitation_id: invitation.id,
            workspace_id: workspace.id,
            project_id: None,
            workspace_role: WorkspaceRole::User,
            account: AccountResolution::Create(NewUser {
                id: Uuid::new_v4(),
                name: "New".to_string(),
                email: email.to_string(),
                password_hash: Some("hash".to_string()),
                role: GlobalRole::User,
            }),
            accepted_at: Utc::now(),
        };

        let first = store.accept_invitation(acceptance("new@example.com")).await.unwrap();
        assert!(matches!(first, AcceptOutcome::Accepted(_)));

        let second = store.accept_invitation(acceptance("other@example.com")).await.unwrap();
        assert!(matches!(second, AcceptOutcome::AlreadyConsumed));
        assert!(store.find_user_by_email("other@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_submit_intake_only_once() {
        let store = MemoryStore::new();
        let owner = store
            .seed_user("Owner", "owner@example.com", GlobalRole::User, None)
            .await;
        let workspace = store.seed_workspace(owner.id, "Acme", "acme").await;
        let intake = store
            .create_intake(NewIntake {
                id: Uuid::new_v4(),
                workspace_id: workspace.id,
                client_id: None,
                token_hash: "b".repeat(64),
                source: IntakeSource::Public,
                expires_at: Utc::now() + Duration::days(14),
            })
            .await
            .unwrap();

        let submission = IntakeSubmission {
            intake_id: intake.id,
            fields: IntakeFields::default(),
            payload: serde_json::json!({}),
            new_client: None,
            submitted_at: Utc::now(),
        };

        let first = store.submit_intake(submission.clone()).await.unwrap();
        assert_eq!(first.unwrap().status, IntakeStatus::Submitted);
        assert!(store.submit_intake(submission).await.unwrap().is_none());
    }
}
