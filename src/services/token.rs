//! Signed bearer tokens.
//!
//! Tokens are HS256 JWTs carrying the user id in `sub`. Expiry is checked
//! here rather than inside `jsonwebtoken` so the clock can be injected: a
//! token issued at `T` is accepted up to and including `T + lifetime`.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::UserId;

const ACCESS_TOKEN_TYPE: &str = "access";
pub const TOKEN_TYPE_BEARER: &str = "Bearer";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Authentication credentials were not provided.")]
    Missing,

    #[error("Given token not valid for any token type")]
    InvalidOrExpired,

    #[error("Failed to sign token: {0}")]
    Signing(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    pub token_type: String,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> Result<UserId, TokenError> {
        self.sub
            .parse::<i32>()
            .map(UserId::new)
            .map_err(|_| TokenError::InvalidOrExpired)
    }
}

/// A freshly signed token plus the metadata returned to clients.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime_seconds: i64,
}

impl TokenIssuer {
    #[must_use]
    pub fn new(secret: &str, lifetime_seconds: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            lifetime_seconds,
        }
    }

    #[must_use]
    pub const fn lifetime_seconds(&self) -> i64 {
        self.lifetime_seconds
    }

    pub fn issue(&self, user_id: UserId, username: &str) -> Result<IssuedToken, TokenError> {
        self.issue_at(user_id, username, Utc::now().timestamp())
    }

    /// Signs a token as if the current time were `now` (unix seconds).
    pub fn issue_at(
        &self,
        user_id: UserId,
        username: &str,
        now: i64,
    ) -> Result<IssuedToken, TokenError> {
        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            token_type: ACCESS_TOKEN_TYPE.to_string(),
            jti: uuid::Uuid::new_v4().simple().to_string(),
            iat: now,
            exp: now + self.lifetime_seconds,
        };

        let access_token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        Ok(IssuedToken {
            access_token,
            token_type: TOKEN_TYPE_BEARER,
            expires_in: self.lifetime_seconds,
        })
    }

    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        self.validate_at(token, Utc::now().timestamp())
    }

    /// Verifies signature, token type and expiry against `now` (unix seconds).
    pub fn validate_at(&self, token: &str, now: i64) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|_| TokenError::InvalidOrExpired)?;
        let claims = data.claims;

        if claims.token_type != ACCESS_TOKEN_TYPE || now > claims.exp {
            return Err(TokenError::InvalidOrExpired);
        }

        Ok(claims)
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: Option<&str>) -> Result<&str, TokenError> {
    let value = header.ok_or(TokenError::Missing)?;
    let mut parts = value.split_whitespace();

    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme == TOKEN_TYPE_BEARER => Ok(token),
        _ => Err(TokenError::Missing),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: i64 = 1_750_000_000;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new("unit-test-secret", 86_400)
    }

    #[test]
    fn token_is_valid_until_lifetime_boundary() {
        let issuer = issuer();
        let token = issuer.issue_at(UserId::new(3), "alice", T).unwrap();

        assert_eq!(token.token_type, "Bearer");
        assert_eq!(token.expires_in, 86_400);

        let claims = issuer.validate_at(&token.access_token, T).unwrap();
        assert_eq!(claims.user_id().unwrap(), UserId::new(3));
        assert_eq!(claims.username, "alice");

        assert!(issuer.validate_at(&token.access_token, T + 86_400).is_ok());
        assert_eq!(
            issuer
                .validate_at(&token.access_token, T + 86_400 + 1)
                .unwrap_err(),
            TokenError::InvalidOrExpired
        );
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = TokenIssuer::new("other", 60)
            .issue_at(UserId::new(1), "bob", T)
            .unwrap();

        assert_eq!(
            issuer().validate_at(&token.access_token, T).unwrap_err(),
            TokenError::InvalidOrExpired
        );
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(issuer().validate("not-a-jwt").is_err());
    }

    #[test]
    fn tokens_are_unique() {
        let issuer = issuer();
        let a = issuer.issue_at(UserId::new(1), "a", T).unwrap();
        let b = issuer.issue_at(UserId::new(1), "a", T).unwrap();
        assert_ne!(a.access_token, b.access_token);
    }

    #[test]
    fn bearer_header_parsing() {
        assert_eq!(bearer_token(Some("Bearer abc.def")), Ok("abc.def"));
        assert_eq!(bearer_token(None), Err(TokenError::Missing));
        assert_eq!(bearer_token(Some("Bearer")), Err(TokenError::Missing));
        assert_eq!(bearer_token(Some("Basic abc")), Err(TokenError::Missing));
        assert_eq!(bearer_token(Some("Bearer a b")), Err(TokenError::Missing));
    }
}
