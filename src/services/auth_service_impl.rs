//! `SeaORM` implementation of the `AuthService` trait.

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use tracing::{info, warn};

use crate::config::{AuthConfig, LoginMode, SecurityConfig};
use crate::db::{CreateUserOutcome, Store, User};
use crate::services::auth_service::{
    AuthError, AuthService, AuthenticatedUser, Registration, UserInfo,
};
use crate::services::token::{IssuedToken, TokenError, TokenIssuer};

pub struct SeaOrmAuthService {
    store: Store,
    tokens: TokenIssuer,
    auth: AuthConfig,
    security: SecurityConfig,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(
        store: Store,
        tokens: TokenIssuer,
        auth: AuthConfig,
        security: SecurityConfig,
    ) -> Self {
        Self {
            store,
            tokens,
            auth,
            security,
        }
    }

    fn issue_for(&self, user: &User) -> Result<IssuedToken, AuthError> {
        Ok(self.tokens.issue(user.id, &user.username)?)
    }

    /// Accepts either the username or the email address as the login name.
    async fn find_login_user(&self, login: &str) -> Result<Option<User>, AuthError> {
        if let Some(user) = self.store.get_user_by_username(login).await? {
            return Ok(Some(user));
        }
        Ok(self.store.get_user_by_email(login).await?)
    }
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(
            r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*@(?:[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)+[A-Za-z]{2,63}$",
        )
        .expect("Invalid regex")
    });

    re.is_match(email)
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Registration, AuthError> {
        let username = username.trim();
        let email = email.trim();

        if username.is_empty() {
            return Err(AuthError::Validation("Username is required".to_string()));
        }
        if email.is_empty() {
            return Err(AuthError::Validation("Email is required".to_string()));
        }
        if password.is_empty() {
            return Err(AuthError::Validation("Password is required".to_string()));
        }
        if !is_valid_email(email) {
            return Err(AuthError::Validation("Invalid email format".to_string()));
        }
        if self.store.username_exists(username).await? {
            return Err(AuthError::Validation("Username already exists".to_string()));
        }
        if self.store.email_exists(email).await? {
            return Err(AuthError::Validation("Email already exists".to_string()));
        }

        let min_len = self.security.min_password_length;
        if password.chars().count() < min_len {
            return Err(AuthError::Validation(format!(
                "Password must be at least {min_len} characters long"
            )));
        }

        // The existence checks above race with concurrent registrations; the
        // unique indexes decide.
        let user = match self
            .store
            .create_user(username, email, password, &self.security)
            .await?
        {
            CreateUserOutcome::Created(user) => user,
            CreateUserOutcome::UsernameTaken => {
                return Err(AuthError::Validation("Username already exists".to_string()));
            }
            CreateUserOutcome::EmailTaken => {
                return Err(AuthError::Validation("Email already exists".to_string()));
            }
        };

        info!(user_id = %user.id, username = %user.username, "User registered");

        let token = self.issue_for(&user)?;
        Ok(Registration {
            user: UserInfo {
                id: user.id,
                username: user.username,
                email: user.email,
            },
            token,
        })
    }

    async fn login(&self, username: &str, password: &str) -> Result<IssuedToken, AuthError> {
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        match self.auth.login_mode {
            LoginMode::Password => {
                let Some(user) = self.find_login_user(username).await? else {
                    return Err(AuthError::InvalidCredentials);
                };

                if !self
                    .store
                    .verify_user_password(&user.username, password)
                    .await?
                {
                    return Err(AuthError::InvalidCredentials);
                }

                self.issue_for(&user)
            }
            LoginMode::Bootstrap => {
                let user = self
                    .store
                    .get_user_by_username(&self.auth.bootstrap_username)
                    .await?
                    .ok_or(AuthError::SystemNotInitialized)?;

                warn!(
                    bootstrap_user = %user.username,
                    "Issuing token in bootstrap login mode"
                );
                self.issue_for(&user)
            }
        }
    }

    async fn authenticate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let claims = self.tokens.validate(token)?;
        let user_id = claims.user_id()?;

        let user = self
            .store
            .get_user_by_id(user_id)
            .await?
            .ok_or(TokenError::InvalidOrExpired)?;

        Ok(AuthenticatedUser {
            id: user.id,
            username: user.username,
        })
    }

    async fn ensure_user(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<bool, AuthError> {
        if self.store.username_exists(username).await? {
            return Ok(false);
        }

        match self
            .store
            .create_user(username, email, password, &self.security)
            .await?
        {
            CreateUserOutcome::Created(user) => {
                info!(user_id = %user.id, username = %user.username, "Seeded user");
                Ok(true)
            }
            CreateUserOutcome::UsernameTaken => Ok(false),
            CreateUserOutcome::EmailTaken => {
                Err(AuthError::Validation("Email already exists".to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_format() {
        assert!(is_valid_email("alice@example.com"));
        assert!(is_valid_email("first.last+tag@mail.example.co.uk"));
        assert!(!is_valid_email("alice"));
        assert!(!is_valid_email("alice@"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("alice@example"));
        assert!(!is_valid_email("a b@example.com"));
    }
}
