use anyhow::{bail, Context};
use workhub_auth::{OnboardingConfig, WebhookConfig};
use workhub_cache::CacheConfig;
use workhub_database::DatabaseConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl StoreBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreBackend::Postgres => "postgres",
            StoreBackend::Memory => "memory",
        }
    }

    fn parse(raw: &str) -> anyhow::Result<Self> {
        match raw.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => bail!("Unknown STORE_BACKEND: {}", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub store: StoreBackend,
    pub database: DatabaseConfig,
    pub cache: Option<CacheConfig>,
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub onboarding: OnboardingConfig,
    pub webhook: WebhookConfig,
    /// Set when running behind a reverse proxy that rewrites X-Forwarded-For.
    pub trust_proxy_headers: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let store = match std::env::var("STORE_BACKEND") {
            Ok(raw) => StoreBackend::parse(&raw)?,
            Err(_) => StoreBackend::Postgres,
        };

        let jwt_secret = std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        if jwt_secret.trim().is_empty() {
            bail!("JWT_SECRET must not be empty");
        }

        Ok(Self {
            server_host: std::env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: std::env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            store,
            database: DatabaseConfig::from_env(),
            cache: CacheConfig::from_env(),
            jwt_secret,
            jwt_expiration_hours: std::env::var("JWT_EXPIRATION_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(24),
            onboarding: OnboardingConfig::from_env(),
            webhook: WebhookConfig::from_env(),
            trust_proxy_headers: std::env::var("TRUST_PROXY_HEADERS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        })
    }
}
