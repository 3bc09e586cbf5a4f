//! Client intake lifecycle: OPEN -> SUBMITTED (terminal), 14-day window.
//!
//! Submission commits the intake (and a synthesized client when the intake
//! has none) before any webhook call. A failed webhook is reported to the
//! caller but never reopens the intake.

use crate::config::OnboardingConfig;
use crate::error::{AuthError, Result};
use crate::notifier::DynNotifier;
use crate::token::{hash_token, SecretToken};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use uuid::Uuid;
use workhub_authz::AuthorizationResolver;
use workhub_database::{DynTenantStore, IntakeSubmission};
use workhub_models::{
    ClientIntake, IntakeFields, IntakeSource, IntakeStatus, NewClient, NewIntake, Workspace,
};

/// Keys that make up the sales-funnel webhook body.
const SALES_FUNNEL_FIELDS: [&str; 4] = ["name", "email", "business_model", "biggest_bottleneck"];

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIntake {
    pub workspace_id: Uuid,
    pub client_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedIntake {
    #[serde(flatten)]
    pub intake: ClientIntake,
    pub token: String,
    pub link: String,
}

/// Display context for the intake form; never the raw row.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntakeContext {
    pub intake_id: Uuid,
    pub status: IntakeStatus,
    pub source: IntakeSource,
    pub expires_at: DateTime<Utc>,
    pub workspace_id: Uuid,
    pub workspace_name: Option<String>,
    pub client_id: Option<Uuid>,
    pub client_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedIntake {
    #[serde(flatten)]
    pub intake: ClientIntake,
    pub webhook_sent: bool,
}

#[derive(Clone)]
pub struct IntakeService {
    tenants: DynTenantStore,
    authz: AuthorizationResolver,
    notifier: DynNotifier,
    config: OnboardingConfig,
}

impl IntakeService {
    pub fn new(
        tenants: DynTenantStore,
        authz: AuthorizationResolver,
        notifier: DynNotifier,
        config: OnboardingConfig,
    ) -> Self {
        Self {
            tenants,
            authz,
            notifier,
            config,
        }
    }

    /// Admin-issued intake, optionally pre-linked to an existing client.
    pub async fn create(&self, actor_id: Uuid, request: CreateIntake) -> Result<IssuedIntake> {
        self.authz
            .require_workspace_admin(actor_id, request.workspace_id)
            .await?;
        let workspace = self.workspace(request.workspace_id).await?;

        if let Some(client_id) = request.client_id {
            let belongs = self
                .tenants
                .find_client(client_id)
                .await?
                .is_some_and(|c| c.workspace_id == workspace.id);
            if !belongs {
                return Err(AuthError::ValidationError(
                    "Client does not belong to this workspace".to_string(),
                ));
            }
        }

        self.issue(&workspace, request.client_id, IntakeSource::Intake)
            .await
    }

    /// Unauthenticated intake keyed only by workspace.
    pub async fn create_public(&self, workspace_id: Uuid) -> Result<IssuedIntake> {
        let workspace = self.workspace(workspace_id).await?;
        self.issue(&workspace, None, IntakeSource::Public).await
    }

    async fn workspace(&self, workspace_id: Uuid) -> Result<Workspace> {
        self.tenants
            .find_workspace(workspace_id)
            .await?
            .ok_or_else(|| AuthError::NotFound("Workspace not found".to_string()))
    }

    async fn issue(
        &self,
        workspace: &Workspace,
        client_id: Option<Uuid>,
        source: IntakeSource,
    ) -> Result<IssuedIntake> {
        let secret = SecretToken::generate();
        let intake = self
            .tenants
            .create_intake(NewIntake {
                id: Uuid::new_v4(),
                workspace_id: workspace.id,
                client_id,
                token_hash: secret.hash,
                source,
                expires_at: Utc::now() + self.config.intake_ttl,
            })
            .await?;

        tracing::info!(
            intake_id = %intake.id,
            workspace_id = %workspace.id,
            source = source.as_str(),
            "client intake opened"
        );

        Ok(IssuedIntake {
            link: self.config.intake_url(&secret.token),
            token: secret.token,
            intake,
        })
    }

    /// Token must exist, be OPEN and unexpired.
    async fn find_open(&self, token: &str) -> Result<ClientIntake> {
        let intake = self
            .tenants
            .find_intake_by_token_hash(&hash_token(token))
            .await?
            .ok_or_else(|| AuthError::NotFound("Intake not found".to_string()))?;

        if !intake.is_open() {
            return Err(AuthError::AlreadyConsumed(
                "Intake has already been submitted".to_string(),
            ));
        }
        if intake.is_expired(Utc::now()) {
            return Err(AuthError::Expired("Intake link has expired".to_string()));
        }
        Ok(intake)
    }

    pub async fn lookup(&self, token: &str) -> Result<IntakeContext> {
        let intake = self.find_open(token).await?;

        let workspace = self.tenants.find_workspace(intake.workspace_id).await?;
        let client = match intake.client_id {
            Some(client_id) => self.tenants.find_client(client_id).await?,
            None => None,
        };

        Ok(IntakeContext {
            intake_id: intake.id,
            status: intake.status,
            source: intake.source,
            expires_at: intake.expires_at,
            workspace_id: intake.workspace_id,
            workspace_name: workspace.map(|w| w.name),
            client_id: intake.client_id,
            client_name: client.map(|c| c.name),
        })
    }

    pub async fn submit(&self, token: &str, payload: Value) -> Result<SubmittedIntake> {
        let intake = self.find_open(token).await?;
        let Some(object) = payload.as_object() else {
            return Err(AuthError::ValidationError(
                "payload must be a JSON object".to_string(),
            ));
        };

        let fields = normalize(object);
        let new_client = match intake.client_id {
            Some(_) => None,
            None => Some(synthesize_client(&intake, &fields)?),
        };
        let sales_funnel = sales_funnel_payload(object);

        let now = Utc::now();
        let submitted = self
            .tenants
            .submit_intake(IntakeSubmission {
                intake_id: intake.id,
                fields,
                payload,
                new_client,
                submitted_at: now,
            })
            .await?;

        let Some(submitted) = submitted else {
            if intake.is_expired(now) {
                return Err(AuthError::Expired("Intake link has expired".to_string()));
            }
            return Err(AuthError::AlreadyConsumed(
                "Intake has already been submitted".to_string(),
            ));
        };

        tracing::info!(
            intake_id = %submitted.id,
            workspace_id = %submitted.workspace_id,
            client_id = ?submitted.client_id,
            "client intake submitted"
        );

        let webhook_sent = match sales_funnel {
            Some(body) if self.notifier.webhook_configured() => {
                self.notifier.post_webhook(&body).await.map_err(|e| {
                    tracing::error!(intake_id = %submitted.id, error = %e, "sales funnel webhook failed");
                    AuthError::UpstreamDelivery(e)
                })?;
                true
            }
            _ => false,
        };

        Ok(SubmittedIntake {
            intake: submitted,
            webhook_sent,
        })
    }

    pub async fn list(&self, actor_id: Uuid, workspace_id: Uuid) -> Result<Vec<ClientIntake>> {
        self.authz
            .require_workspace_admin(actor_id, workspace_id)
            .await?;
        Ok(self.tenants.list_intakes(workspace_id).await?)
    }
}

fn text(object: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| object.get(*key))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(str::to_string)
}

/// Extract the known submission fields. Both camelCase and snake_case keys
/// are accepted; blank strings count as absent.
pub fn normalize(object: &Map<String, Value>) -> IntakeFields {
    let files = object
        .get("files")
        .and_then(Value::as_array)
        .map(|files| {
            files
                .iter()
                .filter_map(|file| match file {
                    Value::String(s) => Some(s.clone()),
                    Value::Object(o) => o
                        .get("url")
                        .or_else(|| o.get("name"))
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();

    IntakeFields {
        name: text(object, &["name", "contactName", "contact_name"]),
        company: text(object, &["company", "companyName", "company_name"]),
        email: text(object, &["email"]).map(|e| e.to_lowercase()),
        phone: text(object, &["phone"]),
        website: text(object, &["website"]),
        industry: text(object, &["industry"]),
        service_type: text(object, &["serviceType", "service_type"]),
        business_details: text(
            object,
            &["businessDetails", "business_details", "business_model"],
        ),
        files,
    }
}

fn synthesize_client(intake: &ClientIntake, fields: &IntakeFields) -> Result<NewClient> {
    let name = fields
        .name
        .clone()
        .or_else(|| fields.company.clone())
        .or_else(|| fields.email.clone())
        .ok_or_else(|| {
            AuthError::ValidationError(
                "Submission must include a name, company or email".to_string(),
            )
        })?;

    Ok(NewClient {
        id: Uuid::new_v4(),
        workspace_id: intake.workspace_id,
        name,
        company: fields.company.clone(),
        email: fields.email.clone(),
        phone: fields.phone.clone(),
        website: fields.website.clone(),
        industry: fields.industry.clone(),
        details: json!({
            "source": intake.source.as_str(),
            "serviceType": fields.service_type,
            "businessDetails": fields.business_details,
            "files": fields.files,
            "intakeId": intake.id,
        }),
    })
}

/// The four sales-funnel fields, when every one of them is present as a
/// string. Other keys in the payload are not forwarded.
pub fn sales_funnel_payload(object: &Map<String, Value>) -> Option<Value> {
    let mut body = Map::new();
    for key in SALES_FUNNEL_FIELDS {
        let value = object.get(key)?.as_str()?;
        body.insert(key.to_string(), Value::String(value.to_string()));
    }
    Some(Value::Object(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NotifyError;
    use crate::testing::RecordingNotifier;
    use chrono::Duration;
    use std::sync::Arc;
    use workhub_database::MemoryStore;
    use workhub_models::{GlobalRole, User, WorkspaceRole};

    struct Fixture {
        store: Arc<MemoryStore>,
        notifier: Arc<RecordingNotifier>,
        service: IntakeService,
        owner: User,
        workspace: Workspace,
    }

    async fn fixture_with(notifier: RecordingNotifier, config: OnboardingConfig) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(notifier);
        let owner = store
            .seed_user("Grace", "grace@example.com", GlobalRole::User, None)
            .await;
        let workspace = store.seed_workspace(owner.id, "Acme", "acme").await;
        let service = IntakeService::new(
            store.clone(),
            AuthorizationResolver::new(store.clone(), store.clone()),
            notifier.clone(),
            config,
        );
        Fixture {
            store,
            notifier,
            service,
            owner,
            workspace,
        }
    }

    async fn fixture() -> Fixture {
        fixture_with(RecordingNotifier::with_webhook(), OnboardingConfig::default()).await
    }

    fn funnel() -> Value {
        json!({
            "name": "Ada Lovelace",
            "email": "Ada@Example.com",
            "business_model": "Subscriptions",
            "biggest_bottleneck": "Lead quality",
        })
    }

    #[tokio::test]
    async fn test_submit_twice() {
        let f = fixture().await;
        let issued = f.service.create_public(f.workspace.id).await.unwrap();
        assert_eq!(issued.intake.status, IntakeStatus::Open);
        assert_eq!(issued.intake.source, IntakeSource::Public);

        let first = f.service.submit(&issued.token, funnel()).await.unwrap();
        assert_eq!(first.intake.status, IntakeStatus::Submitted);
        assert!(first.intake.submitted_at.is_some());
        assert!(first.intake.client_id.is_some());

        let second = f.service.submit(&issued.token, funnel()).await;
        assert!(matches!(second, Err(AuthError::AlreadyConsumed(_))));
        assert_eq!(f.store.clients().await.len(), 1);
    }

    #[tokio::test]
    async fn test_synthesized_client_records_provenance() {
        let f = fixture().await;
        let issued = f.service.create_public(f.workspace.id).await.unwrap();

        let payload = json!({
            "companyName": "Analytical Engines",
            "email": "ada@example.com",
            "serviceType": "Consulting",
            "businessDetails": "Looms",
            "files": ["https://files.example.com/a.pdf", { "name": "b.png" }, 7],
        });
        let submitted = f.service.submit(&issued.token, payload).await.unwrap();

        let clients = f.store.clients().await;
        let client = &clients[0];
        assert_eq!(Some(client.id), submitted.intake.client_id);
        assert_eq!(client.name, "Analytical Engines");
        assert_eq!(client.workspace_id, f.workspace.id);
        assert_eq!(client.details["source"], "PUBLIC");
        assert_eq!(client.details["serviceType"], "Consulting");
        assert_eq!(client.details["businessDetails"], "Looms");
        assert_eq!(
            client.details["files"],
            json!(["https://files.example.com/a.pdf", "b.png"])
        );
        assert_eq!(client.details["intakeId"], json!(issued.intake.id));
        assert_eq!(submitted.intake.company.as_deref(), Some("Analytical Engines"));
    }

    #[tokio::test]
    async fn test_prelinked_client_is_not_duplicated() {
        let f = fixture().await;
        let client = f.store.seed_client(f.workspace.id, "Existing").await;

        let issued = f
            .service
            .create(
                f.owner.id,
                CreateIntake {
                    workspace_id: f.workspace.id,
                    client_id: Some(client.id),
                },
            )
            .await
            .unwrap();
        assert_eq!(issued.intake.source, IntakeSource::Intake);
        assert!(issued
            .link
            .starts_with("http://localhost:5173/client-intake?token="));

        let context = f.service.lookup(&issued.token).await.unwrap();
        assert_eq!(context.client_name.as_deref(), Some("Existing"));
        assert_eq!(context.workspace_name.as_deref(), Some("Acme"));

        let submitted = f
            .service
            .submit(&issued.token, json!({ "name": "Someone" }))
            .await
            .unwrap();
        assert_eq!(submitted.intake.client_id, Some(client.id));
        assert_eq!(f.store.clients().await.len(), 1);
    }

    #[tokio::test]
    async fn test_admin_create_checks() {
        let f = fixture().await;
        let outsider = f
            .store
            .seed_user("Out", "out@example.com", GlobalRole::User, None)
            .await;
        let other = f.store.seed_workspace(outsider.id, "Other", "other").await;
        let foreign = f.store.seed_client(other.id, "Foreign").await;

        let forbidden = f
            .service
            .create(
                outsider.id,
                CreateIntake {
                    workspace_id: f.workspace.id,
                    client_id: None,
                },
            )
            .await;
        assert!(matches!(forbidden, Err(AuthError::Forbidden(_))));

        let invalid = f
            .service
            .create(
                f.owner.id,
                CreateIntake {
                    workspace_id: f.workspace.id,
                    client_id: Some(foreign.id),
                },
            )
            .await;
        assert!(matches!(invalid, Err(AuthError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_public_create_for_unknown_workspace() {
        let f = fixture().await;
        let result = f.service.create_public(Uuid::new_v4()).await;
        assert!(matches!(result, Err(AuthError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_expired_intake() {
        let config = OnboardingConfig {
            intake_ttl: Duration::days(-1),
            ..OnboardingConfig::default()
        };
        let f = fixture_with(RecordingNotifier::with_webhook(), config).await;
        let issued = f.service.create_public(f.workspace.id).await.unwrap();

        assert!(matches!(
            f.service.lookup(&issued.token).await,
            Err(AuthError::Expired(_))
        ));
        assert!(matches!(
            f.service.submit(&issued.token, funnel()).await,
            Err(AuthError::Expired(_))
        ));
        assert!(f.store.clients().await.is_empty());
        assert!(f.notifier.webhooks().is_empty());
    }

    #[tokio::test]
    async fn test_webhook_receives_exactly_the_funnel_fields() {
        let f = fixture().await;
        let issued = f.service.create_public(f.workspace.id).await.unwrap();
        let mut payload = funnel();
        payload["phone"] = json!("555-0100");

        let submitted = f.service.submit(&issued.token, payload).await.unwrap();

        assert!(submitted.webhook_sent);
        assert_eq!(f.notifier.webhooks(), vec![funnel()]);
    }

    #[tokio::test]
    async fn test_incomplete_funnel_payload_skips_webhook() {
        let f = fixture().await;
        let issued = f.service.create_public(f.workspace.id).await.unwrap();
        let mut payload = funnel();
        payload["biggest_bottleneck"] = json!(3);

        let submitted = f.service.submit(&issued.token, payload).await.unwrap();

        assert!(!submitted.webhook_sent);
        assert!(f.notifier.webhooks().is_empty());
    }

    #[tokio::test]
    async fn test_unconfigured_webhook_is_skipped() {
        let f = fixture_with(RecordingNotifier::new(), OnboardingConfig::default()).await;
        let issued = f.service.create_public(f.workspace.id).await.unwrap();

        let submitted = f.service.submit(&issued.token, funnel()).await.unwrap();

        assert!(!submitted.webhook_sent);
        assert!(f.notifier.webhooks().is_empty());
    }

    #[tokio::test]
    async fn test_webhook_failure_after_commit() {
        let f = fixture_with(
            RecordingNotifier::with_webhook().failing_webhook(NotifyError::Timeout),
            OnboardingConfig::default(),
        )
        .await;
        let issued = f.service.create_public(f.workspace.id).await.unwrap();

        let result = f.service.submit(&issued.token, funnel()).await;
        assert!(matches!(
            result,
            Err(AuthError::UpstreamDelivery(NotifyError::Timeout))
        ));

        // Committed regardless: the token is spent and the client exists.
        assert_eq!(f.store.clients().await.len(), 1);
        assert!(matches!(
            f.service.submit(&issued.token, funnel()).await,
            Err(AuthError::AlreadyConsumed(_))
        ));
        assert_eq!(f.notifier.webhooks().len(), 1);
    }

    #[tokio::test]
    async fn test_payload_must_identify_someone() {
        let f = fixture().await;
        let issued = f.service.create_public(f.workspace.id).await.unwrap();

        let not_object = f.service.submit(&issued.token, json!(["a"])).await;
        assert!(matches!(not_object, Err(AuthError::ValidationError(_))));

        let anonymous = f
            .service
            .submit(&issued.token, json!({ "industry": "Textiles" }))
            .await;
        assert!(matches!(anonymous, Err(AuthError::ValidationError(_))));

        assert!(f.service.lookup(&issued.token).await.is_ok());
    }

    #[tokio::test]
    async fn test_concurrent_submits_create_one_client() {
        let f = fixture().await;
        let issued = f.service.create_public(f.workspace.id).await.unwrap();

        let (a, b) = tokio::join!(
            f.service.submit(&issued.token, funnel()),
            f.service.submit(&issued.token, funnel()),
        );

        assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
        assert_eq!(f.store.clients().await.len(), 1);
        assert_eq!(f.notifier.webhooks().len(), 1);
    }

    #[tokio::test]
    async fn test_list_requires_admin() {
        let f = fixture().await;
        f.service.create_public(f.workspace.id).await.unwrap();
        let member = f
            .store
            .seed_user("Member", "member@example.com", GlobalRole::User, None)
            .await;
        f.store
            .seed_member(f.workspace.id, member.id, WorkspaceRole::User)
            .await;

        assert_eq!(f.service.list(f.owner.id, f.workspace.id).await.unwrap().len(), 1);
        assert!(matches!(
            f.service.list(member.id, f.workspace.id).await,
            Err(AuthError::Forbidden(_))
        ));
    }

    #[test]
    fn test_normalize() {
        let payload = json!({
            "contact_name": "  Ada  ",
            "company": "",
            "email": "ADA@EXAMPLE.COM",
            "service_type": "Audit",
            "business_model": "B2B",
        });
        let fields = normalize(payload.as_object().unwrap());

        assert_eq!(fields.name.as_deref(), Some("Ada"));
        assert_eq!(fields.company, None);
        assert_eq!(fields.email.as_deref(), Some("ada@example.com"));
        assert_eq!(fields.service_type.as_deref(), Some("Audit"));
        assert_eq!(fields.business_details.as_deref(), Some("B2B"));
        assert!(fields.files.is_empty());
    }

    #[test]
    fn test_sales_funnel_shape() {
        let full = funnel();
        assert_eq!(sales_funnel_payload(full.as_object().unwrap()), Some(funnel()));

        let partial = json!({ "name": "Ada", "email": "ada@example.com", "business_model": "B2B" });
        assert_eq!(sales_funnel_payload(partial.as_object().unwrap()), None);
    }
}
