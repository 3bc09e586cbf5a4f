use crate::error::Result;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;
use workhub_models::{Client, NewClient};

#[derive(Clone)]
pub struct ClientRepository {
    pool: PgPool,
}

impl ClientRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find client by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Client>> {
        let client = sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(client)
    }
}

pub(crate) async fn insert(conn: &mut PgConnection, client: &NewClient) -> Result<Client> {
    let client = sqlx::query_as::<_, Client>(
        r#"
        INSERT INTO clients (id, workspace_id, name, company, email, phone, website, industry, details)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING *
        "#,
    )
    .bind(client.id)
    .bind(client.workspace_id)
    .bind(&client.name)
    .bind(&client.company)
    .bind(&client.email)
    .bind(&client.phone)
    .bind(&client.website)
    .bind(&client.industry)
    .bind(&client.details)
    .fetch_one(conn)
    .await?;

    Ok(client)
}
