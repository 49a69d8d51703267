// Account & Authentication Use Cases

use crate::domain::{normalize_email, User, UserProfile};
use crate::error::{AppError, Result};
use crate::port::{IdProvider, PasswordHasher, TimeProvider, TokenService, UserRepository};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Successful login
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: String,
    pub user: User,
}

/// Sign-up, login and bearer-token authentication
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenService>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenService>,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
            id_provider,
            time_provider,
        }
    }

    /// Register a new account and return its id
    pub async fn sign_up(&self, email: &str, password: &str, full_name: &str) -> Result<String> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() || full_name.trim().is_empty() {
            return Err(AppError::validation(
                "Email, password, and full name are required",
            ));
        }

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::validation("Email already registered"));
        }

        let password_hash = self.hash_password(password).await?;
        let user = User::new(
            self.id_provider.generate_id(),
            self.time_provider.now_millis(),
            &email,
            full_name.trim(),
            password_hash,
        );

        // unique index catches a concurrent sign-up with the same email
        match self.users.insert(&user).await {
            Err(AppError::Conflict(_)) => {
                return Err(AppError::validation("Email already registered"));
            }
            other => other?,
        }

        info!(user_id = %user.id, "User registered");
        Ok(user.id)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(AppError::validation("Email and password are required"));
        }

        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        if !self
            .verify_password(password, &user.password_hash)
            .await?
        {
            debug!(user_id = %user.id, "Rejected login with wrong password");
            return Err(AppError::Unauthorized("Invalid password".to_string()));
        }

        let token = self.tokens.issue(&user.id)?;
        info!(user_id = %user.id, "User logged in");
        Ok(LoginOutcome { token, user })
    }

    /// Resolve a bearer token to its (still existing) user
    pub async fn authenticate(&self, token: Option<&str>) -> Result<User> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::validation("Token is required"))?;

        let user_id = self
            .tokens
            .verify(token)
            .map_err(|_| AppError::Unauthorized("Invalid or expired token".to_string()))?;

        self.users
            .find_by_id(&user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    /// Optional authentication. `None` for missing or bad tokens and for
    /// tokens whose user no longer exists.
    pub async fn try_user_id(&self, token: Option<&str>) -> Option<String> {
        let token = token.map(str::trim).filter(|t| !t.is_empty())?;
        let user_id = self.tokens.verify(token).ok()?;
        match self.users.find_by_id(&user_id).await {
            Ok(Some(user)) => Some(user.id),
            Ok(None) => {
                debug!(user_id = %user_id, "Token for unknown user treated as anonymous");
                None
            }
            Err(e) => {
                warn!(error = %e, "User lookup failed, treating request as anonymous");
                None
            }
        }
    }

    pub async fn get_user_data(&self, token: Option<&str>) -> Result<UserProfile> {
        Ok(self.authenticate(token).await?.profile())
    }

    // Hashing runs on the blocking pool
    async fn hash_password(&self, password: &str) -> Result<String> {
        let hasher = self.hasher.clone();
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
    }

    async fn verify_password(&self, password: &str, hash: &str) -> Result<bool> {
        let hasher = self.hasher.clone();
        let password = password.to_string();
        let hash = hash.to_string();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| AppError::Internal(format!("Password check task failed: {}", e)))?
    }
}
