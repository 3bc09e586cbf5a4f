use crate::user::GlobalRole;
use crate::workspace::WorkspaceRole;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Role offered by an invitation. `Member` is project-scoped and only valid
/// together with a project id.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "varchar", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum InvitationRole {
    Admin,
    User,
    Member,
}

impl InvitationRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvitationRole::Admin => "ADMIN",
            InvitationRole::User => "USER",
            InvitationRole::Member => "MEMBER",
        }
    }

    pub fn requires_project(&self) -> bool {
        matches!(self, InvitationRole::Member)
    }

    pub fn workspace_role(&self) -> WorkspaceRole {
        match self {
            InvitationRole::Admin => WorkspaceRole::Admin,
            InvitationRole::User | InvitationRole::Member => WorkspaceRole::User,
        }
    }

    /// Only a literal ADMIN invitation yields a global admin account.
    pub fn global_role(&self) -> GlobalRole {
        match self {
            InvitationRole::Admin => GlobalRole::Admin,
            InvitationRole::User | InvitationRole::Member => GlobalRole::User,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
    pub id: Uuid,
    pub email: String,
    pub role: InvitationRole,
    pub workspace_id: Uuid,
    pub project_id: Option<Uuid>,

    #[serde(skip_serializing, default)]
    pub token_hash: String,

    pub invited_by: Option<Uuid>,
    pub expires_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Invitation {
    pub fn is_accepted(&self) -> bool {
        self.accepted_at.is_some()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[derive(Debug, Clone)]
pub struct NewInvitation {
    pub id: Uuid,
    pub email: String,
    pub role: InvitationRole,
    pub workspace_id: Uuid,
    pub project_id: Option<Uuid>,
    pub token_hash: String,
    pub invited_by: Option<Uuid>,
    pub expires_at: DateTime<Utc>,
}

/// Create invitation request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvitation {
    #[validate(email)]
    pub email: String,
    pub role: InvitationRole,
    pub workspace_id: Uuid,
    pub project_id: Option<Uuid>,
}
