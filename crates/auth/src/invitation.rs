//! Invitation lifecycle: ISSUED -> ACCEPTED (terminal).
//!
//! Acceptance is a single conditional commit in the store; when two requests
//! race on one token exactly one of them creates the account and membership,
//! the other sees `AlreadyConsumed`.

use crate::config::OnboardingConfig;
use crate::error::{AuthError, Result};
use crate::jwt::JwtService;
use crate::notifier::{DynNotifier, InvitationEmail};
use crate::password::PasswordHasher;
use crate::token::{hash_token, SecretToken};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;
use workhub_authz::AuthorizationResolver;
use workhub_database::{
    AcceptOutcome, AccountResolution, DynIdentityStore, DynTenantStore, InvitationAcceptance,
};
use workhub_models::{
    name_from_email, CreateInvitation, Invitation, InvitationRole, NewInvitation, NewUser,
    UserView,
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedInvitation {
    #[serde(flatten)]
    pub invitation: Invitation,
    pub email_sent: bool,
    /// Only ever delivered through the accept link.
    #[serde(skip)]
    pub token: String,
}

/// What an unauthenticated visitor may learn about a pending invitation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationDetails {
    pub email: String,
    pub role: InvitationRole,
    pub workspace_id: Uuid,
    pub workspace_name: Option<String>,
    pub project_id: Option<Uuid>,
    pub project_name: Option<String>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptInvitation {
    pub token: String,
    pub password: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptedInvitation {
    pub token: String,
    pub user: UserView,
    pub workspace_id: Uuid,
    pub project_id: Option<Uuid>,
}

#[derive(Clone)]
pub struct InvitationService {
    identities: DynIdentityStore,
    tenants: DynTenantStore,
    authz: AuthorizationResolver,
    notifier: DynNotifier,
    jwt: JwtService,
    config: OnboardingConfig,
}

impl InvitationService {
    pub fn new(
        identities: DynIdentityStore,
        tenants: DynTenantStore,
        authz: AuthorizationResolver,
        notifier: DynNotifier,
        jwt: JwtService,
        config: OnboardingConfig,
    ) -> Self {
        Self {
            identities,
            tenants,
            authz,
            notifier,
            jwt,
            config,
        }
    }

    /// Issue an invitation and email the accept link. The invitation is kept
    /// even when the email cannot be delivered.
    pub async fn create(&self, actor_id: Uuid, request: CreateInvitation) -> Result<IssuedInvitation> {
        request.validate()?;
        if request.role.requires_project() && request.project_id.is_none() {
            return Err(AuthError::ValidationError(
                "projectId is required for MEMBER invitations".to_string(),
            ));
        }

        self.authz
            .require_workspace_admin(actor_id, request.workspace_id)
            .await?;

        let workspace = self
            .tenants
            .find_workspace(request.workspace_id)
            .await?
            .ok_or_else(|| AuthError::NotFound("Workspace not found".to_string()))?;

        if let Some(project_id) = request.project_id {
            let belongs = self
                .tenants
                .find_project(project_id)
                .await?
                .is_some_and(|p| p.workspace_id == workspace.id);
            if !belongs {
                return Err(AuthError::ValidationError(
                    "Project does not belong to this workspace".to_string(),
                ));
            }
        }

        let email = request.email.trim().to_lowercase();
        if let Some(existing) = self.identities.find_user_by_email(&email).await? {
            if self
                .tenants
                .find_workspace_member(workspace.id, existing.id)
                .await?
                .is_some()
            {
                return Err(AuthError::Conflict(
                    "User is already a member of this workspace".to_string(),
                ));
            }
        }

        let secret = SecretToken::generate();
        let invitation = self
            .tenants
            .create_invitation(NewInvitation {
                id: Uuid::new_v4(),
                email: email.clone(),
                role: request.role,
                workspace_id: workspace.id,
                project_id: request.project_id,
                token_hash: secret.hash,
                invited_by: Some(actor_id),
                expires_at: Utc::now() + self.config.invitation_ttl,
            })
            .await?;

        let inviter_name = self
            .identities
            .find_user(actor_id)
            .await?
            .map(|u| u.name)
            .unwrap_or_else(|| "A team member".to_string());

        let delivery = self
            .notifier
            .send_invitation(&InvitationEmail {
                to: email,
                inviter_name,
                workspace_name: workspace.name,
                role: invitation.role,
                accept_url: self.config.accept_invitation_url(&secret.token),
                expires_at: invitation.expires_at,
            })
            .await;

        let email_sent = match delivery {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(invitation_id = %invitation.id, error = %e, "invitation email not delivered");
                false
            }
        };

        tracing::info!(
            invitation_id = %invitation.id,
            workspace_id = %invitation.workspace_id,
            role = invitation.role.as_str(),
            "invitation issued"
        );

        Ok(IssuedInvitation {
            invitation,
            email_sent,
            token: secret.token,
        })
    }

    /// Token must exist, be unaccepted and unexpired.
    async fn find_active(&self, token: &str) -> Result<Invitation> {
        let invitation = self
            .tenants
            .find_invitation_by_token_hash(&hash_token(token))
            .await?
            .ok_or_else(|| AuthError::NotFound("Invitation not found".to_string()))?;

        if invitation.is_accepted() {
            return Err(AuthError::AlreadyConsumed(
                "Invitation has already been accepted".to_string(),
            ));
        }
        if invitation.is_expired(Utc::now()) {
            return Err(AuthError::Expired("Invitation has expired".to_string()));
        }
        Ok(invitation)
    }

    pub async fn lookup(&self, token: &str) -> Result<InvitationDetails> {
        let invitation = self.find_active(token).await?;

        let workspace = self.tenants.find_workspace(invitation.workspace_id).await?;
        let project = match invitation.project_id {
            Some(project_id) => self.tenants.find_project(project_id).await?,
            None => None,
        };

        Ok(InvitationDetails {
            email: invitation.email,
            role: invitation.role,
            workspace_id: invitation.workspace_id,
            workspace_name: workspace.map(|w| w.name),
            project_id: invitation.project_id,
            project_name: project.map(|p| p.name),
            expires_at: invitation.expires_at,
        })
    }

    pub async fn accept(&self, request: AcceptInvitation) -> Result<AcceptedInvitation> {
        let invitation = self.find_active(&request.token).await?;
        let password_hash = PasswordHasher::hash(&request.password)?;
        let role = invitation.role.global_role();

        let account = match self.identities.find_user_by_email(&invitation.email).await? {
            Some(user) if user.has_password() => return Err(AuthError::AccountExists),
            Some(user) => AccountResolution::AttachCredentials {
                user_id: user.id,
                password_hash,
                role,
            },
            None => {
                let name = request
                    .name
                    .as_deref()
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .map(str::to_string)
                    .unwrap_or_else(|| name_from_email(&invitation.email));
                AccountResolution::Create(NewUser {
                    id: Uuid::new_v4(),
                    name,
                    email: invitation.email.clone(),
                    password_hash: Some(password_hash),
                    role,
                })
            }
        };

        let now = Utc::now();
        let outcome = self
            .tenants
            .accept_invitation(InvitationAcceptance {
                invitation_id: invitation.id,
                workspace_id: invitation.workspace_id,
                project_id: invitation.project_id,
                workspace_role: invitation.role.workspace_role(),
                account,
                accepted_at: now,
            })
            .await?;

        let user = match outcome {
            AcceptOutcome::Accepted(user) => user,
            AcceptOutcome::AlreadyConsumed if invitation.is_expired(now) => {
                return Err(AuthError::Expired("Invitation has expired".to_string()))
            }
            AcceptOutcome::AlreadyConsumed => {
                return Err(AuthError::AlreadyConsumed(
                    "Invitation has already been accepted".to_string(),
                ))
            }
            AcceptOutcome::AccountClaimed => return Err(AuthError::AccountExists),
        };

        let token = self.jwt.issue(&user)?;

        tracing::info!(
            invitation_id = %invitation.id,
            workspace_id = %invitation.workspace_id,
            user_id = %user.id,
            "invitation accepted"
        );

        Ok(AcceptedInvitation {
            token,
            user: UserView::from(user),
            workspace_id: invitation.workspace_id,
            project_id: invitation.project_id,
        })
    }

    pub async fn list(&self, actor_id: Uuid, workspace_id: Uuid) -> Result<Vec<Invitation>> {
        self.authz
            .require_workspace_admin(actor_id, workspace_id)
            .await?;
        Ok(self.tenants.list_invitations(workspace_id).await?)
    }

    /// Deletes a pending invitation; its token then resolves to NotFound.
    pub async fn revoke(&self, actor_id: Uuid, workspace_id: Uuid, invitation_id: Uuid) -> Result<()> {
        self.authz
            .require_workspace_admin(actor_id, workspace_id)
            .await?;

        if !self
            .tenants
            .delete_pending_invitation(workspace_id, invitation_id)
            .await?
        {
            return Err(AuthError::NotFound("Pending invitation not found".to_string()));
        }

        tracing::info!(%invitation_id, %workspace_id, "invitation revoked");
        Ok(())
    }
}
