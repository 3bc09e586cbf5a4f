use thiserror::Error;
use workhub_authz::AuthzError;
use workhub_database::DatabaseError;

pub type Result<T> = std::result::Result<T, TenantError>;

#[derive(Debug, Error)]
pub enum TenantError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Authz(#[from] AuthzError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    Forbidden(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

impl From<validator::ValidationErrors> for TenantError {
    fn from(err: validator::ValidationErrors) -> Self {
        TenantError::Validation(err.to_string())
    }
}
