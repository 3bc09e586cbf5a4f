//! Outbound side effects of the onboarding flows.
//!
//! Callers invoke these only after their state transition has committed and
//! never retry; a failure is reported once.

use crate::email::{templates, EmailMessage, EmailService};
use crate::error::NotifyError;
use crate::webhook::WebhookClient;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use workhub_models::InvitationRole;

#[derive(Debug, Clone)]
pub struct InvitationEmail {
    pub to: String,
    pub inviter_name: String,
    pub workspace_name: String,
    pub role: InvitationRole,
    pub accept_url: String,
    pub expires_at: DateTime<Utc>,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_invitation(&self, email: &InvitationEmail) -> Result<(), NotifyError>;

    /// Whether a sales-funnel webhook destination exists.
    fn webhook_configured(&self) -> bool;

    async fn post_webhook(&self, body: &serde_json::Value) -> Result<(), NotifyError>;
}

pub type DynNotifier = Arc<dyn Notifier>;

/// Email over SMTP plus an optional webhook endpoint.
#[derive(Clone)]
pub struct DeliveryNotifier {
    email: EmailService,
    webhook: Option<WebhookClient>,
}

impl DeliveryNotifier {
    pub fn new(email: EmailService, webhook: Option<WebhookClient>) -> Self {
        Self { email, webhook }
    }
}

#[async_trait]
impl Notifier for DeliveryNotifier {
    async fn send_invitation(&self, invite: &InvitationEmail) -> Result<(), NotifyError> {
        let (text_body, html_body) = templates::workspace_invitation(
            &invite.inviter_name,
            &invite.workspace_name,
            invite.role.as_str(),
            &invite.accept_url,
            &invite.expires_at,
        );

        self.email
            .send(EmailMessage {
                to: invite.to.clone(),
                subject: format!("You've been invited to join {}", invite.workspace_name),
                text_body,
                html_body: Some(html_body),
            })
            .await
    }

    fn webhook_configured(&self) -> bool {
        self.webhook.is_some()
    }

    async fn post_webhook(&self, body: &serde_json::Value) -> Result<(), NotifyError> {
        match &self.webhook {
            Some(client) => client.post(body).await,
            None => Err(NotifyError::NotConfigured),
        }
    }
}
