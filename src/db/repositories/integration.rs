use crate::domain::UserId;
use crate::entities::{ai_integrations, prelude::*};
use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
    sea_query::{Expr, OnConflict},
};

/// Values for a create-or-update. `None` means "not supplied by the caller":
/// inserts fall back to the defaults, conflicting updates keep the stored value.
#[derive(Debug, Clone)]
pub struct IntegrationUpsert {
    pub provider: String,
    pub encrypted_api_key: String,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub name: Option<String>,
    pub is_active: Option<bool>,
    pub default_model: String,
    pub default_base_url: Option<String>,
}

/// Partial update. Outer `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct IntegrationPatch {
    pub encrypted_api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<Option<String>>,
    pub name: Option<Option<String>>,
    pub is_active: Option<bool>,
}

pub struct IntegrationRepository {
    conn: DatabaseConnection,
}

impl IntegrationRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<ai_integrations::Model>> {
        AiIntegrations::find()
            .filter(ai_integrations::Column::UserId.eq(user_id.value()))
            .order_by_asc(ai_integrations::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list integrations")
    }

    pub async fn count(&self) -> Result<u64> {
        AiIntegrations::find()
            .count(&self.conn)
            .await
            .context("Failed to count integrations")
    }

    pub async fn get(
        &self,
        user_id: UserId,
        provider: &str,
    ) -> Result<Option<ai_integrations::Model>> {
        AiIntegrations::find()
            .filter(ai_integrations::Column::UserId.eq(user_id.value()))
            .filter(ai_integrations::Column::Provider.eq(provider))
            .one(&self.conn)
            .await
            .context("Failed to query integration")
    }

    /// Insert, or update on `(user_id, provider)` conflict.
    ///
    /// The first statement of the transaction is the insert, so the write
    /// lock is held before any read. Returns the stored row and whether it
    /// was newly created.
    pub async fn upsert(
        &self,
        user_id: UserId,
        values: IntegrationUpsert,
    ) -> Result<(ai_integrations::Model, bool)> {
        let txn = self.conn.begin().await?;

        let now = chrono::Utc::now().to_rfc3339();
        let provider = values.provider.clone();

        let active_model = ai_integrations::ActiveModel {
            user_id: Set(user_id.value()),
            provider: Set(provider.clone()),
            encrypted_api_key: Set(values.encrypted_api_key.clone()),
            model: Set(values
                .model
                .clone()
                .unwrap_or_else(|| values.default_model.clone())),
            base_url: Set(values
                .base_url
                .clone()
                .or_else(|| values.default_base_url.clone())),
            name: Set(Some(
                values.name.clone().unwrap_or_else(|| provider.clone()),
            )),
            is_active: Set(values.is_active.unwrap_or(true)),
            created_at: Set(now.clone()),
            updated_at: Set(now.clone()),
            ..Default::default()
        };

        let inserted = AiIntegrations::insert(active_model)
            .on_conflict(
                OnConflict::columns([
                    ai_integrations::Column::UserId,
                    ai_integrations::Column::Provider,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&txn)
            .await
            .context("Failed to insert integration")?;

        let created = inserted > 0;

        if !created {
            let mut update = AiIntegrations::update_many()
                .col_expr(
                    ai_integrations::Column::EncryptedApiKey,
                    Expr::value(values.encrypted_api_key),
                )
                .col_expr(ai_integrations::Column::UpdatedAt, Expr::value(now));
            if let Some(model) = values.model {
                update = update.col_expr(ai_integrations::Column::Model, Expr::value(model));
            }
            if let Some(base_url) = values.base_url {
                update = update.col_expr(ai_integrations::Column::BaseUrl, Expr::value(base_url));
            }
            if let Some(name) = values.name {
                update = update.col_expr(ai_integrations::Column::Name, Expr::value(name));
            }
            if let Some(is_active) = values.is_active {
                update = update.col_expr(ai_integrations::Column::IsActive, Expr::value(is_active));
            }

            update
                .filter(ai_integrations::Column::UserId.eq(user_id.value()))
                .filter(ai_integrations::Column::Provider.eq(provider.as_str()))
                .exec(&txn)
                .await
                .context("Failed to update integration")?;
        }

        let stored = AiIntegrations::find()
            .filter(ai_integrations::Column::UserId.eq(user_id.value()))
            .filter(ai_integrations::Column::Provider.eq(provider.as_str()))
            .one(&txn)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Integration vanished after upsert"))?;

        txn.commit().await?;

        Ok((stored, created))
    }

    /// Apply a partial update. Returns `None` when no row matches.
    pub async fn update(
        &self,
        user_id: UserId,
        provider: &str,
        patch: IntegrationPatch,
    ) -> Result<Option<ai_integrations::Model>> {
        let Some(existing) = self.get(user_id, provider).await? else {
            return Ok(None);
        };

        let mut active: ai_integrations::ActiveModel = existing.into();

        if let Some(key) = patch.encrypted_api_key {
            active.encrypted_api_key = Set(key);
        }
        if let Some(model) = patch.model {
            active.model = Set(model);
        }
        if let Some(base_url) = patch.base_url {
            active.base_url = Set(base_url);
        }
        if let Some(name) = patch.name {
            active.name = Set(name);
        }
        if let Some(is_active) = patch.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let updated = active
            .update(&self.conn)
            .await
            .context("Failed to update integration")?;

        Ok(Some(updated))
    }
}
