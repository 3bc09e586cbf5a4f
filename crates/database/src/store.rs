//! Store contracts shared by the Postgres repositories and [`crate::MemoryStore`].
//!
//! Batch lookups (`*_by_ids`, `list_*(&[Uuid])`) accept an id slice and must
//! issue at most one query; an empty slice returns an empty result without
//! touching the store.

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;
use workhub_models::{
    Client, ClientIntake, GlobalRole, IntakeFields, Invitation, NewClient, NewIntake,
    NewInvitation, NewUser, NewWorkspace, Project, ProjectMember, Task, UpdateWorkspace, User,
    Workspace, WorkspaceMember, WorkspaceRole,
};

#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>>;

    /// Emails are stored lowercased; lookups are case-insensitive.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn find_users_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>>;

    async fn create_user(&self, user: NewUser) -> Result<User>;
}

#[async_trait]
pub trait TenantStore: Send + Sync {
    async fn find_workspace(&self, id: Uuid) -> Result<Option<Workspace>>;

    /// Inserts the workspace and the owner's ADMIN membership atomically.
    async fn create_workspace(&self, workspace: NewWorkspace) -> Result<Workspace>;

    async fn update_workspace(
        &self,
        id: Uuid,
        update: UpdateWorkspace,
    ) -> Result<Option<Workspace>>;

    async fn list_workspace_members(&self, workspace_id: Uuid) -> Result<Vec<WorkspaceMember>>;

    async fn find_workspace_member(
        &self,
        workspace_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<WorkspaceMember>>;

    async fn list_projects(&self, workspace_id: Uuid) -> Result<Vec<Project>>;

    async fn find_project(&self, id: Uuid) -> Result<Option<Project>>;

    async fn list_project_members(&self, project_ids: &[Uuid]) -> Result<Vec<ProjectMember>>;

    async fn list_tasks(&self, project_ids: &[Uuid]) -> Result<Vec<Task>>;

    async fn find_project_member(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<ProjectMember>>;

    /// Projects of `workspace_id` on which the user has an explicit ProjectMember row.
    async fn project_ids_for_member(&self, workspace_id: Uuid, user_id: Uuid) -> Result<Vec<Uuid>>;

    async fn find_client(&self, id: Uuid) -> Result<Option<Client>>;

    async fn create_invitation(&self, invitation: NewInvitation) -> Result<Invitation>;

    async fn find_invitation_by_token_hash(&self, token_hash: &str) -> Result<Option<Invitation>>;

    async fn list_invitations(&self, workspace_id: Uuid) -> Result<Vec<Invitation>>;

    /// Deletes an unaccepted invitation. Returns false when nothing matched.
    async fn delete_pending_invitation(&self, workspace_id: Uuid, id: Uuid) -> Result<bool>;

    /// Consumes the invitation and applies the account/membership writes as one
    /// commit. The consume step is conditional on `accepted_at IS NULL` and
    /// `expires_at > accepted_at`; when it matches nothing no write happens.
    async fn accept_invitation(&self, acceptance: InvitationAcceptance) -> Result<AcceptOutcome>;

    async fn create_intake(&self, intake: NewIntake) -> Result<ClientIntake>;

    async fn find_intake_by_token_hash(&self, token_hash: &str) -> Result<Option<ClientIntake>>;

    async fn list_intakes(&self, workspace_id: Uuid) -> Result<Vec<ClientIntake>>;

    /// Flips an OPEN, unexpired intake to SUBMITTED, creating the client row
    /// when one is supplied. Returns `None` when the intake was not OPEN.
    async fn submit_intake(&self, submission: IntakeSubmission) -> Result<Option<ClientIntake>>;
}

pub type DynIdentityStore = Arc<dyn IdentityStore>;
pub type DynTenantStore = Arc<dyn TenantStore>;

/// How the accepting account is obtained.
#[derive(Debug, Clone)]
pub enum AccountResolution {
    Create(NewUser),
    /// Attach a password to an existing account that has none yet.
    AttachCredentials {
        user_id: Uuid,
        password_hash: String,
        role: GlobalRole,
    },
}

#[derive(Debug, Clone)]
pub struct InvitationAcceptance {
    pub invitation_id: Uuid,
    pub workspace_id: Uuid,
    pub project_id: Option<Uuid>,
    pub workspace_role: WorkspaceRole,
    pub account: AccountResolution,
    pub accepted_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub enum AcceptOutcome {
    Accepted(User),
    /// The invitation was accepted (or expired) before this commit ran.
    AlreadyConsumed,
    /// The email now belongs to an account with a password.
    AccountClaimed,
}

#[derive(Debug, Clone)]
pub struct IntakeSubmission {
    pub intake_id: Uuid,
    pub fields: IntakeFields,
    pub payload: serde_json::Value,
    pub new_client: Option<NewClient>,
    pub submitted_at: DateTime<Utc>,
}
