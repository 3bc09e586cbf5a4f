use crate::error::NotifyError;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::Duration;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "X-Workhub-Signature";
pub const TIMESTAMP_HEADER: &str = "X-Workhub-Timestamp";

#[derive(Debug, Clone)]
pub struct WebhookConfig {
    pub url: Option<String>,
    pub secret: Option<String>,
    pub timeout: Duration,
}

impl WebhookConfig {
    pub fn from_env() -> Self {
        Self {
            url: std::env::var("SALES_FUNNEL_WEBHOOK_URL")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            secret: std::env::var("WEBHOOK_SECRET")
                .ok()
                .filter(|v| !v.is_empty()),
            timeout: Duration::from_secs(
                std::env::var("WEBHOOK_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(10),
            ),
        }
    }
}

/// Sign `timestamp.payload` with HMAC-SHA256, hex encoded.
pub fn sign_payload(secret: &str, timestamp: i64, payload: &str) -> String {
    let message = format!("{}.{}", timestamp, payload);
    // HMAC accepts keys of any length, so this cannot fail
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Posts JSON bodies to one configured URL with a hard timeout.
#[derive(Clone)]
pub struct WebhookClient {
    client: reqwest::Client,
    url: String,
    host: String,
    secret: Option<String>,
}

impl WebhookClient {
    pub fn new(url: String, secret: Option<String>, timeout: Duration) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifyError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        let host = reqwest::Url::parse(&url)
            .map_err(|e| NotifyError::Transport(format!("Invalid webhook URL: {}", e)))?
            .host_str()
            .unwrap_or_default()
            .to_string();

        Ok(Self {
            client,
            url,
            host,
            secret,
        })
    }

    pub fn from_config(config: &WebhookConfig) -> Result<Option<Self>, NotifyError> {
        match &config.url {
            Some(url) => Ok(Some(Self::new(url.clone(), config.secret.clone(), config.timeout)?)),
            None => Ok(None),
        }
    }

    /// Host part only; the full URL may carry a secret path.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Exactly one attempt; non-2xx, timeouts and network errors are failures.
    pub async fn post(&self, body: &serde_json::Value) -> Result<(), NotifyError> {
        let payload = serde_json::to_string(body)
            .map_err(|e| NotifyError::Transport(format!("Failed to serialize payload: {}", e)))?;

        let mut request = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "application/json");

        if let Some(secret) = &self.secret {
            let timestamp = Utc::now().timestamp();
            request = request
                .header(
                    SIGNATURE_HEADER,
                    format!("sha256={}", sign_payload(secret, timestamp, &payload)),
                )
                .header(TIMESTAMP_HEADER, timestamp.to_string());
        }

        let response = request.body(payload).send().await.map_err(|e| {
            if e.is_timeout() {
                NotifyError::Timeout
            } else {
                NotifyError::Transport(e.without_url().to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(host = %self.host, status = status.as_u16(), "webhook rejected payload");
            return Err(NotifyError::Status(status.as_u16()));
        }

        tracing::info!(host = %self.host, status = status.as_u16(), "webhook delivered");
        Ok(())
    }
}
