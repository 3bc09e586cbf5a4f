//! Recording notifier for service and router tests.

use crate::error::NotifyError;
use crate::notifier::{InvitationEmail, Notifier};
use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
pub struct RecordingNotifier {
    webhook_configured: bool,
    email_failure: Option<NotifyError>,
    webhook_failure: Option<NotifyError>,
    invitations: Mutex<Vec<InvitationEmail>>,
    webhooks: Mutex<Vec<serde_json::Value>>,
}

fn guard<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_webhook() -> Self {
        Self {
            webhook_configured: true,
            ..Self::default()
        }
    }

    pub fn failing_email(mut self, error: NotifyError) -> Self {
        self.email_failure = Some(error);
        self
    }

    pub fn failing_webhook(mut self, error: NotifyError) -> Self {
        self.webhook_failure = Some(error);
        self
    }

    pub fn invitations(&self) -> Vec<InvitationEmail> {
        guard(&self.invitations).clone()
    }

    pub fn webhooks(&self) -> Vec<serde_json::Value> {
        guard(&self.webhooks).clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_invitation(&self, email: &InvitationEmail) -> Result<(), NotifyError> {
        guard(&self.invitations).push(email.clone());
        match &self.email_failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn webhook_configured(&self) -> bool {
        self.webhook_configured
    }

    async fn post_webhook(&self, body: &serde_json::Value) -> Result<(), NotifyError> {
        guard(&self.webhooks).push(body.clone());
        match &self.webhook_failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}
