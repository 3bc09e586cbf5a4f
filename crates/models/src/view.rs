//! Denormalized read-model returned by `GET /workspaces/:id`.
//!
//! Every user reference is either a resolved [`UserView`] or `null`; raw user
//! rows never appear here, so credentials cannot leak through this tree.

use crate::project::{Project, ProjectMember, Task};
use crate::user::UserView;
use crate::workspace::{WorkspaceMember, WorkspaceRole};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    #[serde(flatten)]
    pub task: Task,
    pub assignee: Option<UserView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMemberView {
    #[serde(flatten)]
    pub member: ProjectMember,
    pub user: Option<UserView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectView {
    #[serde(flatten)]
    pub project: Project,
    pub team_lead: Option<UserView>,
    pub members: Vec<ProjectMemberView>,
    pub tasks: Vec<TaskView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceMemberView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub role: WorkspaceRole,
    pub message: Option<String>,
    pub joined_at: DateTime<Utc>,
    pub user: Option<UserView>,
}

impl WorkspaceMemberView {
    pub fn new(member: WorkspaceMember, user: Option<UserView>) -> Self {
        Self {
            id: member.id,
            user_id: member.user_id,
            role: member.role,
            message: member.message,
            joined_at: member.joined_at,
            user,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceView {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub owner_id: Uuid,
    pub owner: Option<UserView>,

    /// Hidden from viewers without admin rights
    pub settings: Option<serde_json::Value>,

    pub members: Vec<WorkspaceMemberView>,
    pub projects: Vec<ProjectView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkspaceView {
    /// Every user projection reachable from this view.
    pub fn users(&self) -> Vec<&UserView> {
        let mut users: Vec<&UserView> = Vec::new();
        users.extend(self.owner.iter());
        users.extend(self.members.iter().filter_map(|m| m.user.as_ref()));
        for project in &self.projects {
            users.extend(project.team_lead.iter());
            users.extend(project.members.iter().filter_map(|m| m.user.as_ref()));
            users.extend(project.tasks.iter().filter_map(|t| t.assignee.as_ref()));
        }
        users
    }
}
