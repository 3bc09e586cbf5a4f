use thiserror::Error;
use workhub_authz::AuthzError;
use workhub_database::DatabaseError;

pub type Result<T> = std::result::Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("Password too weak: {0}")]
    WeakPassword(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// The invited email already has an account with a password.
    #[error("An account with this email already exists")]
    AccountExists,

    #[error("Already consumed: {0}")]
    AlreadyConsumed(String),

    #[error("Expired: {0}")]
    Expired(String),

    /// The state transition committed but the notification did not go out.
    #[error("Upstream delivery failed: {0}")]
    UpstreamDelivery(#[source] NotifyError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] DatabaseError),

    #[error("Password hashing error: {0}")]
    PasswordHashError(String),

    #[error("JWT error: {0}")]
    JwtError(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

/// Failures of the email / webhook side effects.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NotifyError {
    #[error("request timed out")]
    Timeout,

    #[error("webhook responded with status {0}")]
    Status(u16),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("email delivery failed: {0}")]
    Email(String),

    #[error("no webhook URL configured")]
    NotConfigured,
}

impl NotifyError {
    /// Coarse category, safe to show to callers.
    pub fn kind(&self) -> &'static str {
        match self {
            NotifyError::Timeout => "timeout",
            NotifyError::Status(_) => "status",
            NotifyError::Transport(_) => "transport",
            NotifyError::Email(_) => "email",
            NotifyError::NotConfigured => "not_configured",
        }
    }
}

impl From<AuthzError> for AuthError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::Database(e) => AuthError::DatabaseError(e),
            AuthzError::NotFound(msg) => AuthError::NotFound(msg),
            AuthzError::Forbidden(msg) => AuthError::Forbidden(msg),
        }
    }
}

impl From<argon2::password_hash::Error> for AuthError {
    fn from(err: argon2::password_hash::Error) -> Self {
        AuthError::PasswordHashError(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::JwtError(err.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for AuthError {
    fn from(err: validator::ValidationErrors) -> Self {
        AuthError::ValidationError(err.to_string())
    }
}
