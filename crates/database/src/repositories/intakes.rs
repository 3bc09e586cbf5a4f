use super::clients;
use crate::error::Result;
use crate::store::IntakeSubmission;
use sqlx::PgPool;
use uuid::Uuid;
use workhub_models::{ClientIntake, NewIntake};

#[derive(Clone)]
pub struct IntakeRepository {
    pool: PgPool,
}

impl IntakeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persist an OPEN intake
    pub async fn create(&self, intake: &NewIntake) -> Result<ClientIntake> {
        let intake = sqlx::query_as::<_, ClientIntake>(
            r#"
            INSERT INTO client_intakes (id, workspace_id, client_id, token_hash, source, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(intake.id)
        .bind(intake.workspace_id)
        .bind(intake.client_id)
        .bind(&intake.token_hash)
        .bind(intake.source)
        .bind(intake.expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(intake)
    }

    /// Find intake by token digest, whatever its state
    pub async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<ClientIntake>> {
        let intake =
            sqlx::query_as::<_, ClientIntake>("SELECT * FROM client_intakes WHERE token_hash = $1")
                .bind(token_hash)
                .fetch_optional(&self.pool)
                .await?;

        Ok(intake)
    }

    /// List intakes for a workspace, newest first
    pub async fn list_by_workspace(&self, workspace_id: Uuid) -> Result<Vec<ClientIntake>> {
        let intakes = sqlx::query_as::<_, ClientIntake>(
            r#"
            SELECT * FROM client_intakes
            WHERE workspace_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(workspace_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(intakes)
    }

    /// OPEN -> SUBMITTED, plus the optional client row, in one transaction
    pub async fn submit(&self, submission: &IntakeSubmission) -> Result<Option<ClientIntake>> {
        let mut tx = self.pool.begin().await?;
        let fields = &submission.fields;

        let submitted = sqlx::query_as::<_, ClientIntake>(
            r#"
            UPDATE client_intakes
            SET status = 'SUBMITTED',
                submitted_at = $2,
                name = $3,
                company = $4,
                email = $5,
                phone = $6,
                website = $7,
                industry = $8,
                service_type = $9,
                business_details = $10,
                files = $11,
                payload = $12
            WHERE id = $1 AND status = 'OPEN' AND expires_at > $2
            RETURNING *
            "#,
        )
        .bind(submission.intake_id)
        .bind(submission.submitted_at)
        .bind(&fields.name)
        .bind(&fields.company)
        .bind(&fields.email)
        .bind(&fields.phone)
        .bind(&fields.website)
        .bind(&fields.industry)
        .bind(&fields.service_type)
        .bind(&fields.business_details)
        .bind(serde_json::json!(fields.files))
        .bind(&submission.payload)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(mut intake) = submitted else {
            return Ok(None);
        };

        if let Some(new_client) = &submission.new_client {
            let client = clients::insert(&mut *tx, new_client).await?;

            intake = sqlx::query_as::<_, ClientIntake>(
                "UPDATE client_intakes SET client_id = $2 WHERE id = $1 RETURNING *",
            )
            .bind(intake.id)
            .bind(client.id)
            .fetch_one(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(Some(intake))
    }
}
