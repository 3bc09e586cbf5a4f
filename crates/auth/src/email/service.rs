use crate::error::NotifyError;
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub enum EmailProvider {
    Smtp {
        host: String,
        port: u16,
        username: Option<String>,
        password: Option<String>,
        from_email: String,
        from_name: String,
    },
    MailHog {
        host: String,
        port: u16,
        from_email: String,
        from_name: String,
    },
    /// Messages are logged and dropped.
    Disabled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: Option<String>,
}

#[derive(Clone)]
pub struct EmailService {
    provider: EmailProvider,
    timeout: Duration,
}

impl EmailService {
    pub fn new(provider: EmailProvider) -> Self {
        Self {
            provider,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Upper bound on one delivery, connection and SMTP dialogue included.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn disabled() -> Self {
        Self::new(EmailProvider::Disabled)
    }

    pub fn from_env() -> Result<Self, String> {
        let provider_name =
            std::env::var("EMAIL_PROVIDER").unwrap_or_else(|_| "mailhog".to_string());
        let from_name =
            std::env::var("EMAIL_FROM_NAME").unwrap_or_else(|_| "Workhub".to_string());

        let provider = match provider_name.as_str() {
            "mailhog" => EmailProvider::MailHog {
                host: std::env::var("MAILHOG_HOST").unwrap_or_else(|_| "localhost".to_string()),
                port: std::env::var("MAILHOG_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(1025),
                from_email: std::env::var("EMAIL_FROM")
                    .unwrap_or_else(|_| "noreply@workhub.dev".to_string()),
                from_name,
            },
            "smtp" => EmailProvider::Smtp {
                host: std::env::var("SMTP_HOST")
                    .map_err(|_| "SMTP_HOST not configured".to_string())?,
                port: std::env::var("SMTP_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(587),
                username: std::env::var("SMTP_USERNAME").ok(),
                password: std::env::var("SMTP_PASSWORD").ok(),
                from_email: std::env::var("EMAIL_FROM")
                    .map_err(|_| "EMAIL_FROM not configured".to_string())?,
                from_name,
            },
            "disabled" | "none" => EmailProvider::Disabled,
            other => return Err(format!("Unknown email provider: {}", other)),
        };

        let timeout = Duration::from_secs(
            std::env::var("EMAIL_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        );

        Ok(Self::new(provider).with_timeout(timeout))
    }

    pub async fn send(&self, email: EmailMessage) -> Result<(), NotifyError> {
        match &self.provider {
            EmailProvider::Smtp {
                host,
                port,
                username,
                password,
                from_email,
                from_name,
            } => {
                let credentials = match (username, password) {
                    (Some(user), Some(pass)) => Some(Credentials::new(user.clone(), pass.clone())),
                    _ => None,
                };
                let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(host)
                    .map_err(|e| NotifyError::Email(format!("SMTP transport: {}", e)))?
                    .port(*port);
                if let Some(credentials) = credentials {
                    builder = builder.credentials(credentials);
                }
                self.deliver(builder.build(), from_email, from_name, email).await
            }
            EmailProvider::MailHog {
                host,
                port,
                from_email,
                from_name,
            } => {
                // MailHog speaks plain SMTP without TLS or auth
                let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
                    .port(*port)
                    .build();
                self.deliver(transport, from_email, from_name, email).await
            }
            EmailProvider::Disabled => {
                tracing::info!(to = %email.to, subject = %email.subject, "email delivery disabled, dropping message");
                Ok(())
            }
        }
    }

    async fn deliver(
        &self,
        mailer: AsyncSmtpTransport<Tokio1Executor>,
        from_email: &str,
        from_name: &str,
        email: EmailMessage,
    ) -> Result<(), NotifyError> {
        let message = build_message(from_email, from_name, &email)?;

        match tokio::time::timeout(self.timeout, mailer.send(message)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(NotifyError::Email(e.to_string())),
            Err(_) => {
                tracing::warn!(to = %email.to, timeout_secs = self.timeout.as_secs_f64(), "email delivery timed out");
                return Err(NotifyError::Timeout);
            }
        }

        tracing::info!(to = %email.to, subject = %email.subject, "email sent");
        Ok(())
    }
}

fn build_message(from_email: &str, from_name: &str, email: &EmailMessage) -> Result<Message, NotifyError> {
    let from = format!("{} <{}>", from_name, from_email)
        .parse::<Mailbox>()
        .map_err(|e| NotifyError::Email(format!("Invalid from address: {}", e)))?;
    let to = email
        .to
        .parse::<Mailbox>()
        .map_err(|e| NotifyError::Email(format!("Invalid to address: {}", e)))?;

    let builder = Message::builder().from(from).to(to).subject(&email.subject);

    let message = match &email.html_body {
        Some(html) => builder.multipart(
            MultiPart::alternative()
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_PLAIN)
                        .body(email.text_body.clone()),
                )
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_HTML)
                        .body(html.clone()),
                ),
        ),
        None => builder.body(email.text_body.clone()),
    };

    message.map_err(|e| NotifyError::Email(format!("Failed to build email: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(to: &str) -> EmailMessage {
        EmailMessage {
            to: to.to_string(),
            subject: "Hello".to_string(),
            text_body: "Plain".to_string(),
            html_body: Some("<p>Html</p>".to_string()),
        }
    }

    #[test]
    fn test_build_multipart_message() {
        let built = build_message("noreply@workhub.dev", "Workhub", &message("ada@example.com"));
        assert!(built.is_ok());
    }

    #[test]
    fn test_invalid_recipient() {
        let built = build_message("noreply@workhub.dev", "Workhub", &message("not an address"));
        assert!(matches!(built, Err(NotifyError::Email(_))));
    }

    #[tokio::test]
    async fn test_silent_smtp_peer_times_out() {
        // Accepts connections but never sends the SMTP greeting
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let holder = tokio::spawn(async move {
            let mut open = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                open.push(socket);
            }
        });

        let service = EmailService::new(EmailProvider::MailHog {
            host: "127.0.0.1".to_string(),
            port,
            from_email: "noreply@workhub.dev".to_string(),
            from_name: "Workhub".to_string(),
        })
        .with_timeout(Duration::from_millis(300));

        let started = std::time::Instant::now();
        let result = service.send(message("ada@example.com")).await;

        assert!(matches!(result, Err(NotifyError::Timeout)), "got {:?}", result);
        assert!(started.elapsed() < Duration::from_secs(5));
        holder.abort();
    }

    #[tokio::test]
    async fn test_disabled_provider_accepts_everything() {
        let service = EmailService::disabled();
        assert!(service.send(message("ada@example.com")).await.is_ok());
    }
}
