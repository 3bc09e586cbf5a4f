use crate::error::Result;
use sqlx::PgPool;
use uuid::Uuid;
use workhub_models::{Project, ProjectMember, Task};

#[derive(Clone)]
pub struct ProjectRepository {
    pool: PgPool,
}

impl ProjectRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List all projects of a workspace
    pub async fn list_by_workspace(&self, workspace_id: Uuid) -> Result<Vec<Project>> {
        let projects = sqlx::query_as::<_, Project>(
            "SELECT * FROM projects WHERE workspace_id = $1 ORDER BY created_at ASC",
        )
        .bind(workspace_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(projects)
    }

    /// Find project by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Project>> {
        let project = sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(project)
    }

    /// Project members for a set of projects
    pub async fn list_members(&self, project_ids: &[Uuid]) -> Result<Vec<ProjectMember>> {
        if project_ids.is_empty() {
            return Ok(Vec::new());
        }

        let members = sqlx::query_as::<_, ProjectMember>(
            r#"
            SELECT * FROM project_members
            WHERE project_id = ANY($1)
            ORDER BY added_at ASC
            "#,
        )
        .bind(project_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(members)
    }

    /// Tasks for a set of projects
    pub async fn list_tasks(&self, project_ids: &[Uuid]) -> Result<Vec<Task>> {
        if project_ids.is_empty() {
            return Ok(Vec::new());
        }

        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT * FROM tasks
            WHERE project_id = ANY($1)
            ORDER BY created_at ASC
            "#,
        )
        .bind(project_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(tasks)
    }

    /// Get a specific project membership
    pub async fn find_member(&self, project_id: Uuid, user_id: Uuid) -> Result<Option<ProjectMember>> {
        let member = sqlx::query_as::<_, ProjectMember>(
            "SELECT * FROM project_members WHERE project_id = $1 AND user_id = $2",
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(member)
    }

    /// IDs of the workspace's projects the user was added to directly
    pub async fn project_ids_for_member(&self, workspace_id: Uuid, user_id: Uuid) -> Result<Vec<Uuid>> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT p.id
            FROM projects p
            INNER JOIN project_members pm ON pm.project_id = p.id
            WHERE p.workspace_id = $1 AND pm.user_id = $2
            "#,
        )
        .bind(workspace_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }
}
