//! Domain service for registration, login and bearer authentication.

use serde::Serialize;
use thiserror::Error;

use crate::domain::UserId;
use crate::services::token::{IssuedToken, TokenError};

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("System not initialized. Please run migrations and create test user.")]
    SystemNotInitialized,

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

/// Public view of a user account.
#[derive(Debug, Clone, Serialize)]
pub struct UserInfo {
    pub id: UserId,
    pub username: String,
    pub email: String,
}

/// Result of a successful registration: the account plus a ready token.
#[derive(Debug, Clone)]
pub struct Registration {
    pub user: UserInfo,
    pub token: IssuedToken,
}

/// Identity attached to a request after bearer authentication.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: UserId,
    pub username: String,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Creates an account and signs a token for it.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] with the first failing rule, checked
    /// in order: required fields, email format, username taken, email taken,
    /// password length.
    async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Registration, AuthError>;

    /// Exchanges credentials for a token according to the configured login mode.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] on bad or empty credentials and
    /// [`AuthError::SystemNotInitialized`] when bootstrap mode has no user to
    /// hand out.
    async fn login(&self, username: &str, password: &str) -> Result<IssuedToken, AuthError>;

    /// Resolves a bearer token to a live user.
    async fn authenticate(&self, token: &str) -> Result<AuthenticatedUser, AuthError>;

    /// Creates the user if the username is free. Returns `true` when created.
    async fn ensure_user(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<bool, AuthError>;
}
