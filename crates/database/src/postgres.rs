//! Store trait implementations for [`Database`], delegating to the repositories.

use crate::connection::Database;
use crate::error::Result;
use crate::store::{
    AcceptOutcome, IdentityStore, IntakeSubmission, InvitationAcceptance, TenantStore,
};
use async_trait::async_trait;
use uuid::Uuid;
use workhub_models::{
    Client, ClientIntake, Invitation, NewIntake, NewInvitation, NewUser, NewWorkspace, Project,
    ProjectMember, Task, UpdateWorkspace, User, Workspace, WorkspaceMember,
};

#[async_trait]
impl IdentityStore for Database {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        self.users().find_by_id(id).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.users().find_by_email(email).await
    }

    async fn find_users_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>> {
        self.users().find_by_ids(ids).await
    }

    async fn create_user(&self, user: NewUser) -> Result<User> {
        self.users().create(&user).await
    }
}

#[async_trait]
impl TenantStore for Database {
    async fn find_workspace(&self, id: Uuid) -> Result<Option<Workspace>> {
        self.workspaces().find_by_id(id).await
    }

    async fn create_workspace(&self, workspace: NewWorkspace) -> Result<Workspace> {
        self.workspaces().create(&workspace).await
    }

    async fn update_workspace(
        &self,
        id: Uuid,
        update: UpdateWorkspace,
    ) -> Result<Option<Workspace>> {
        self.workspaces().update(id, &update).await
    }

    async fn list_workspace_members(&self, workspace_id: Uuid) -> Result<Vec<WorkspaceMember>> {
        self.workspaces().list_members(workspace_id).await
    }

    async fn find_workspace_member(
        &self,
        workspace_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<WorkspaceMember>> {
        self.workspaces().find_member(workspace_id, user_id).await
    }

    async fn list_projects(&self, workspace_id: Uuid) -> Result<Vec<Project>> {
        self.projects().list_by_workspace(workspace_id).await
    }

    async fn find_project(&self, id: Uuid) -> Result<Option<Project>> {
        self.projects().find_by_id(id).await
    }

    async fn list_project_members(&self, project_ids: &[Uuid]) -> Result<Vec<ProjectMember>> {
        self.projects().list_members(project_ids).await
    }

    async fn list_tasks(&self, project_ids: &[Uuid]) -> Result<Vec<Task>> {
        self.projects().list_tasks(project_ids).await
    }

    async fn find_project_member(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<ProjectMember>> {
        self.projects().find_member(project_id, user_id).await
    }

    async fn project_ids_for_member(&self, workspace_id: Uuid, user_id: Uuid) -> Result<Vec<Uuid>> {
        self.projects().project_ids_for_member(workspace_id, user_id).await
    }

    async fn find_client(&self, id: Uuid) -> Result<Option<Client>> {
        self.clients().find_by_id(id).await
    }

    async fn create_invitation(&self, invitation: NewInvitation) -> Result<Invitation> {
        self.invitations().create(&invitation).await
    }

    async fn find_invitation_by_token_hash(&self, token_hash: &str) -> Result<Option<Invitation>> {
        self.invitations().find_by_token_hash(token_hash).await
    }

    async fn list_invitations(&self, workspace_id: Uuid) -> Result<Vec<Invitation>> {
        self.invitations().list_by_workspace(workspace_id).await
    }

    async fn delete_pending_invitation(&self, workspace_id: Uuid, id: Uuid) -> Result<bool> {
        self.invitations().delete_pending(workspace_id, id).await
    }

    async fn accept_invitation(&self, acceptance: InvitationAcceptance) -> Result<AcceptOutcome> {
        self.invitations().accept(&acceptance).await
    }

    async fn create_intake(&self, intake: NewIntake) -> Result<ClientIntake> {
        self.intakes().create(&intake).await
    }

    async fn find_intake_by_token_hash(&self, token_hash: &str) -> Result<Option<ClientIntake>> {
        self.intakes().find_by_token_hash(token_hash).await
    }

    async fn list_intakes(&self, workspace_id: Uuid) -> Result<Vec<ClientIntake>> {
        self.intakes().list_by_workspace(workspace_id).await
    }

    async fn submit_intake(&self, submission: IntakeSubmission) -> Result<Option<ClientIntake>> {
        self.intakes().submit(&submission).await
    }
}
