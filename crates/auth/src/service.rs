use crate::error::{AuthError, Result};
use crate::jwt::{Claims, JwtService};
use crate::password::PasswordHasher;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;
use workhub_database::DynIdentityStore;
use workhub_models::UserView;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserView,
}

#[derive(Clone)]
pub struct AuthService {
    identities: DynIdentityStore,
    jwt: JwtService,
}

impl AuthService {
    pub fn new(identities: DynIdentityStore, jwt: JwtService) -> Self {
        Self { identities, jwt }
    }

    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse> {
        request.validate()?;

        // Unknown email, missing credential and wrong password look the same
        let user = self
            .identities
            .find_user_by_email(&request.email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let password_hash = user
            .password_hash
            .as_deref()
            .ok_or(AuthError::InvalidCredentials)?;

        if !PasswordHasher::verify(&request.password, password_hash)? {
            tracing::info!(user_id = %user.id, "login failed: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.jwt.issue(&user)?;
        tracing::info!(user_id = %user.id, "user logged in");

        Ok(LoginResponse {
            token,
            user: UserView::from(user),
        })
    }

    /// Validate a bearer token and return its claims.
    pub fn authenticate(&self, token: &str) -> Result<Claims> {
        self.jwt.validate(token)
    }

    pub async fn me(&self, user_id: Uuid) -> Result<UserView> {
        self.identities
            .find_user(user_id)
            .await?
            .map(UserView::from)
            .ok_or_else(|| AuthError::Unauthorized("Account no longer exists".to_string()))
    }
}
