use chrono::Duration;

/// Link bases and token lifetimes for invitations and client intakes.
#[derive(Debug, Clone)]
pub struct OnboardingConfig {
    pub app_base_url: String,
    pub intake_base_url: String,
    pub invitation_ttl: Duration,
    pub intake_ttl: Duration,
}

impl Default for OnboardingConfig {
    fn default() -> Self {
        Self {
            app_base_url: "http://localhost:5173".to_string(),
            intake_base_url: "http://localhost:5173".to_string(),
            invitation_ttl: Duration::days(7),
            intake_ttl: Duration::days(14),
        }
    }
}

impl OnboardingConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let app_base_url = std::env::var("APP_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.app_base_url);
        let intake_base_url = std::env::var("INTAKE_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| app_base_url.clone());

        Self {
            app_base_url,
            intake_base_url,
            ..defaults
        }
    }

    pub fn accept_invitation_url(&self, token: &str) -> String {
        format!("{}/accept-invitation?token={}", self.app_base_url, token)
    }

    pub fn intake_url(&self, token: &str) -> String {
        format!("{}/client-intake?token={}", self.intake_base_url, token)
    }
}
