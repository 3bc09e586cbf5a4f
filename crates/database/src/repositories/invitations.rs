use super::users;
use crate::error::Result;
use crate::store::{AcceptOutcome, AccountResolution, InvitationAcceptance};
use sqlx::PgPool;
use uuid::Uuid;
use workhub_models::{Invitation, NewInvitation, User};

#[derive(Clone)]
pub struct InvitationRepository {
    pool: PgPool,
}

impl InvitationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persist a freshly issued invitation
    pub async fn create(&self, invitation: &NewInvitation) -> Result<Invitation> {
        let invitation = sqlx::query_as::<_, Invitation>(
            r#"
            INSERT INTO invitations
                (id, email, role, workspace_id, project_id, token_hash, invited_by, expires_at)
            VALUES ($1, LOWER($2), $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(invitation.id)
        .bind(&invitation.email)
        .bind(invitation.role)
        .bind(invitation.workspace_id)
        .bind(invitation.project_id)
        .bind(&invitation.token_hash)
        .bind(invitation.invited_by)
        .bind(invitation.expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(invitation)
    }

    /// Find invitation by token digest, whatever its state
    pub async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<Invitation>> {
        let invitation =
            sqlx::query_as::<_, Invitation>("SELECT * FROM invitations WHERE token_hash = $1")
                .bind(token_hash)
                .fetch_optional(&self.pool)
                .await?;

        Ok(invitation)
    }

    /// List invitations for a workspace, newest first
    pub async fn list_by_workspace(&self, workspace_id: Uuid) -> Result<Vec<Invitation>> {
        let invitations = sqlx::query_as::<_, Invitation>(
            r#"
            SELECT * FROM invitations
            WHERE workspace_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(workspace_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(invitations)
    }

    /// Revoke a pending invitation
    pub async fn delete_pending(&self, workspace_id: Uuid, id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM invitations
            WHERE id = $1 AND workspace_id = $2 AND accepted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(workspace_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Consume the invitation and write account + memberships in one transaction
    pub async fn accept(&self, acceptance: &InvitationAcceptance) -> Result<AcceptOutcome> {
        let mut tx = self.pool.begin().await?;

        // Compare-and-swap on accepted_at: concurrent accepts of one token
        // serialize on the row lock and only the first sees a match.
        let consumed = sqlx::query(
            r#"
            UPDATE invitations
            SET accepted_at = $2
            WHERE id = $1 AND accepted_at IS NULL AND expires_at > $2
            "#,
        )
        .bind(acceptance.invitation_id)
        .bind(acceptance.accepted_at)
        .execute(&mut *tx)
        .await?;

        if consumed.rows_affected() == 0 {
            return Ok(AcceptOutcome::AlreadyConsumed);
        }

        let user = match &acceptance.account {
            AccountResolution::Create(new_user) => match users::insert(&mut *tx, new_user).await {
                Ok(user) => user,
                Err(e) if e.is_duplicate() => return Ok(AcceptOutcome::AccountClaimed),
                Err(e) => return Err(e),
            },
            AccountResolution::AttachCredentials {
                user_id,
                password_hash,
                role,
            } => {
                let attached = sqlx::query_as::<_, User>(
                    r#"
                    UPDATE users
                    SET password_hash = $2, role = $3, updated_at = NOW()
                    WHERE id = $1 AND password_hash IS NULL
                    RETURNING *
                    "#,
                )
                .bind(user_id)
                .bind(password_hash)
                .bind(role)
                .fetch_optional(&mut *tx)
                .await?;

                match attached {
                    Some(user) => user,
                    None => return Ok(AcceptOutcome::AccountClaimed),
                }
            }
        };

        // Never downgrade an existing ADMIN membership
        sqlx::query(
            r#"
            INSERT INTO workspace_members (id, workspace_id, user_id, role)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (workspace_id, user_id) DO UPDATE
            SET role = CASE
                WHEN workspace_members.role = 'ADMIN' THEN 'ADMIN'
                ELSE EXCLUDED.role
            END
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(acceptance.workspace_id)
        .bind(user.id)
        .bind(acceptance.workspace_role)
        .execute(&mut *tx)
        .await?;

        if let Some(project_id) = acceptance.project_id {
            sqlx::query(
                r#"
                INSERT INTO project_members (id, project_id, user_id)
                VALUES ($1, $2, $3)
                ON CONFLICT (project_id, user_id) DO NOTHING
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(project_id)
            .bind(user.id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(AcceptOutcome::Accepted(user))
    }
}
