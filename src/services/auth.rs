//! Authentication service: password login and JWT issuing

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;

use crate::{
    config::{AuthConfig, BootstrapUser},
    error::{AppError, AppResult},
    models::user::{Capability, User, UserClaims},
    repository::Repository,
};

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Verify credentials and return a bearer token with the user
    pub async fn login(&self, username: &str, password: &str) -> AppResult<(String, User)> {
        let user = self
            .repository
            .users
            .get_by_username(username)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid username or password".to_string()))?;

        if !verify_password(password, &user.password_hash) {
            tracing::info!("Rejected login for {}", username);
            return Err(AppError::Authentication(
                "Invalid username or password".to_string(),
            ));
        }

        let token = self.create_token_for_user(&user)?;
        tracing::info!("User {} logged in", user.username);
        Ok((token, user))
    }

    /// Decode a bearer token into claims
    pub fn decode_token(&self, token: &str) -> AppResult<UserClaims> {
        UserClaims::from_token(token, &self.config.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))
    }

    pub fn create_token_for_user(&self, user: &User) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let exp = now + (self.config.jwt_expiration_hours as i64 * 3600);

        UserClaims::for_user(user, now, exp)
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Identity behind the caller's token
    pub async fn current_user(&self, caller: Option<&UserClaims>) -> AppResult<User> {
        let claims = caller.ok_or(AppError::AuthenticationRequired)?;
        self.repository.users.get_by_id(claims.user_id).await
    }

    /// Create a user with a hashed password
    pub async fn create_user(
        &self,
        username: &str,
        password: &str,
        capabilities: &[Capability],
    ) -> AppResult<User> {
        if self.repository.users.get_by_username(username).await?.is_some() {
            return Err(AppError::Conflict(format!("Username {} is taken", username)));
        }

        let hash = hash_password(password)?;
        self.repository.users.create(username, &hash, capabilities).await
    }

    /// Make sure the configured staff account exists
    pub async fn ensure_bootstrap_user(&self, bootstrap: &BootstrapUser) -> AppResult<()> {
        if self
            .repository
            .users
            .get_by_username(&bootstrap.username)
            .await?
            .is_some()
        {
            return Ok(());
        }

        self.create_user(
            &bootstrap.username,
            &bootstrap.password,
            &[Capability::CanMarkReturned, Capability::CatalogStaff],
        )
        .await?;
        tracing::info!("Created bootstrap staff account {}", bootstrap.username);
        Ok(())
    }
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}
