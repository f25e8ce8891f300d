//! `SeaORM` implementation of the `IntegrationService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::db::{IntegrationPatch, IntegrationUpsert, Store};
use crate::domain::{Provider, UserId};
use crate::services::integration_service::{
    CreateIntegrationRequest, IntegrationError, IntegrationService, IntegrationView,
    UpdateIntegrationRequest,
};
use crate::services::providers;
use crate::services::secrets::SecretCipher;

pub struct SeaOrmIntegrationService {
    store: Store,
    cipher: SecretCipher,
}

impl SeaOrmIntegrationService {
    #[must_use]
    pub const fn new(store: Store, cipher: SecretCipher) -> Self {
        Self { store, cipher }
    }
}

/// Trims and drops blank strings.
fn supplied(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn normalize_provider(provider: &str) -> String {
    provider.trim().to_lowercase()
}

#[async_trait]
impl IntegrationService for SeaOrmIntegrationService {
    async fn list(&self, user: UserId) -> Result<Vec<IntegrationView>, IntegrationError> {
        let rows = self.store.list_integrations(user).await?;
        Ok(rows.into_iter().map(IntegrationView::from).collect())
    }

    async fn get(&self, user: UserId, provider: &str) -> Result<IntegrationView, IntegrationError> {
        let provider = normalize_provider(provider);
        self.store
            .get_integration(user, &provider)
            .await?
            .map(IntegrationView::from)
            .ok_or(IntegrationError::NotFound(provider))
    }

    async fn create_or_update(
        &self,
        user: UserId,
        request: CreateIntegrationRequest,
    ) -> Result<(IntegrationView, bool), IntegrationError> {
        let api_key = supplied(request.api_key).ok_or(IntegrationError::MissingApiKey)?;

        let provider = match supplied(request.provider) {
            Some(raw) => Provider::parse(&raw),
            None => providers::detect(&api_key),
        }
        .ok_or(IntegrationError::ProviderRequired)?;

        let values = IntegrationUpsert {
            provider: provider.as_str().to_string(),
            encrypted_api_key: self.cipher.encrypt(&api_key)?,
            model: supplied(request.model),
            base_url: supplied(request.base_url),
            name: supplied(request.name),
            is_active: request.is_active,
            default_model: providers::default_model(&provider).to_string(),
            default_base_url: providers::default_base_url(&provider).map(str::to_string),
        };

        let (row, created) = self.store.upsert_integration(user, values).await?;

        info!(
            user_id = %user,
            provider = %provider,
            created,
            "Integration saved"
        );

        Ok((IntegrationView::from(row), created))
    }

    async fn update(
        &self,
        user: UserId,
        provider: &str,
        request: UpdateIntegrationRequest,
    ) -> Result<IntegrationView, IntegrationError> {
        let provider = normalize_provider(provider);

        let encrypted_api_key = match supplied(request.api_key) {
            Some(key) => Some(self.cipher.encrypt(&key)?),
            None => None,
        };

        let patch = IntegrationPatch {
            encrypted_api_key,
            model: supplied(request.model),
            // A supplied but blank value clears the column.
            base_url: request.base_url.map(|v| supplied(Some(v))),
            name: request.name.map(|v| supplied(Some(v))),
            is_active: request.is_active,
        };

        let row = self
            .store
            .update_integration(user, &provider, patch)
            .await?
            .ok_or_else(|| IntegrationError::NotFound(provider.clone()))?;

        info!(user_id = %user, provider = %provider, "Integration updated");

        Ok(IntegrationView::from(row))
    }

    async fn api_key(&self, user: UserId, provider: &str) -> Result<String, IntegrationError> {
        let provider = normalize_provider(provider);
        let row = self
            .store
            .get_integration(user, &provider)
            .await?
            .ok_or(IntegrationError::NotFound(provider))?;

        Ok(self.cipher.decrypt(&row.encrypted_api_key)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_are_not_supplied() {
        assert_eq!(supplied(None), None);
        assert_eq!(supplied(Some("   ".to_string())), None);
        assert_eq!(supplied(Some(" gpt-4o ".to_string())), Some("gpt-4o".to_string()));
    }

    #[test]
    fn provider_path_segment_is_normalized() {
        assert_eq!(normalize_provider(" OpenAI "), "openai");
    }
}
