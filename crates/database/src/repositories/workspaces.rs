use crate::error::{is_unique_violation, DatabaseError, Result};
use sqlx::PgPool;
use uuid::Uuid;
use workhub_models::{NewWorkspace, UpdateWorkspace, Workspace, WorkspaceMember, WorkspaceRole};

#[derive(Clone)]
pub struct WorkspaceRepository {
    pool: PgPool,
}

impl WorkspaceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a workspace together with its owner's ADMIN membership
    pub async fn create(&self, new_workspace: &NewWorkspace) -> Result<Workspace> {
        let mut tx = self.pool.begin().await?;

        let workspace = sqlx::query_as::<_, Workspace>(
            r#"
            INSERT INTO workspaces (id, name, slug, owner_id, settings)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(new_workspace.id)
        .bind(&new_workspace.name)
        .bind(&new_workspace.slug)
        .bind(new_workspace.owner_id)
        .bind(&new_workspace.settings)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DatabaseError::duplicate("Workspace", "slug")
            } else {
                e.into()
            }
        })?;

        sqlx::query(
            r#"
            INSERT INTO workspace_members (id, workspace_id, user_id, role)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(workspace.id)
        .bind(workspace.owner_id)
        .bind(WorkspaceRole::Admin)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(workspace)
    }

    /// Find workspace by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Workspace>> {
        let workspace = sqlx::query_as::<_, Workspace>("SELECT * FROM workspaces WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(workspace)
    }

    /// Update name and/or settings; absent fields keep their current value
    pub async fn update(&self, id: Uuid, update: &UpdateWorkspace) -> Result<Option<Workspace>> {
        let workspace = sqlx::query_as::<_, Workspace>(
            r#"
            UPDATE workspaces
            SET name = COALESCE($2, name),
                settings = COALESCE($3, settings),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&update.name)
        .bind(&update.settings)
        .fetch_optional(&self.pool)
        .await?;

        Ok(workspace)
    }

    /// List all members of a workspace
    pub async fn list_members(&self, workspace_id: Uuid) -> Result<Vec<WorkspaceMember>> {
        let members = sqlx::query_as::<_, WorkspaceMember>(
            r#"
            SELECT * FROM workspace_members
            WHERE workspace_id = $1
            ORDER BY joined_at ASC
            "#,
        )
        .bind(workspace_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(members)
    }

    /// Get a specific membership
    pub async fn find_member(
        &self,
        workspace_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<WorkspaceMember>> {
        let member = sqlx::query_as::<_, WorkspaceMember>(
            "SELECT * FROM workspace_members WHERE workspace_id = $1 AND user_id = $2",
        )
        .bind(workspace_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(member)
    }
}
