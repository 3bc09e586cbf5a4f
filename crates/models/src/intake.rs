use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "varchar", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum IntakeStatus {
    Open,
    Submitted,
}

/// Where an intake came from: the unauthenticated public form or an
/// admin-issued intake link.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "varchar", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum IntakeSource {
    Public,
    Intake,
}

impl IntakeSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntakeSource::Public => "PUBLIC",
            IntakeSource::Intake => "INTAKE",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ClientIntake {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub client_id: Option<Uuid>,

    #[serde(skip_serializing, default)]
    pub token_hash: String,

    pub status: IntakeStatus,
    pub source: IntakeSource,
    pub expires_at: DateTime<Utc>,

    // Normalized submission fields, populated on submit
    pub name: Option<String>,
    pub company: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub industry: Option<String>,
    pub service_type: Option<String>,
    pub business_details: Option<String>,
    pub files: serde_json::Value,
    pub payload: Option<serde_json::Value>,

    pub submitted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ClientIntake {
    pub fn is_open(&self) -> bool {
        self.status == IntakeStatus::Open
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[derive(Debug, Clone)]
pub struct NewIntake {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub client_id: Option<Uuid>,
    pub token_hash: String,
    pub source: IntakeSource,
    pub expires_at: DateTime<Utc>,
}

/// Submission fields extracted from a raw intake payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntakeFields {
    pub name: Option<String>,
    pub company: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub industry: Option<String>,
    pub service_type: Option<String>,
    pub business_details: Option<String>,
    pub files: Vec<String>,
}
