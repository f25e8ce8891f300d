//! Domain service for per-user AI integration records.
//!
//! API keys are encrypted before they reach the store and never leave the
//! service in plaintext; views only report `has_api_key`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::UserId;
use crate::entities::ai_integrations;

#[derive(Debug, Error)]
pub enum IntegrationError {
    #[error("api_key is required")]
    MissingApiKey,

    #[error("provider is required and could not be auto-detected from API key")]
    ProviderRequired,

    #[error("Integration not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for IntegrationError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for IntegrationError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

impl From<crate::services::secrets::SecretError> for IntegrationError {
    fn from(err: crate::services::secrets::SecretError) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Body of `POST /api/ai-integrations/`. Blank strings count as absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateIntegrationRequest {
    pub api_key: Option<String>,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub name: Option<String>,
    pub is_active: Option<bool>,
}

/// Body of `PUT /api/ai-integrations/{provider}/`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateIntegrationRequest {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub name: Option<String>,
    pub is_active: Option<bool>,
}

/// Client-facing view of an integration. Never carries the key.
#[derive(Debug, Clone, Serialize)]
pub struct IntegrationView {
    pub id: i32,
    pub provider: String,
    pub model: String,
    pub base_url: Option<String>,
    pub name: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
    pub has_api_key: bool,
}

impl From<ai_integrations::Model> for IntegrationView {
    fn from(model: ai_integrations::Model) -> Self {
        Self {
            id: model.id,
            has_api_key: !model.encrypted_api_key.is_empty(),
            provider: model.provider,
            model: model.model,
            base_url: model.base_url,
            name: model.name,
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[async_trait::async_trait]
pub trait IntegrationService: Send + Sync {
    /// All integrations owned by `user`, oldest first.
    async fn list(&self, user: UserId) -> Result<Vec<IntegrationView>, IntegrationError>;

    /// # Errors
    ///
    /// Returns [`IntegrationError::NotFound`] when `user` has no record for
    /// `provider` (matched case-insensitively).
    async fn get(&self, user: UserId, provider: &str) -> Result<IntegrationView, IntegrationError>;

    /// Creates the record for the resolved provider or updates the existing one.
    ///
    /// Returns the stored view and `true` when a new row was inserted.
    async fn create_or_update(
        &self,
        user: UserId,
        request: CreateIntegrationRequest,
    ) -> Result<(IntegrationView, bool), IntegrationError>;

    async fn update(
        &self,
        user: UserId,
        provider: &str,
        request: UpdateIntegrationRequest,
    ) -> Result<IntegrationView, IntegrationError>;

    /// Decrypts the stored key for server-side use by AI clients.
    async fn api_key(&self, user: UserId, provider: &str) -> Result<String, IntegrationError>;
}
