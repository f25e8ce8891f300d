use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AuthService, IntegrationService, RecipeService, SeaOrmAuthService, SeaOrmIntegrationService,
    SeaOrmRecipeService, SecretCipher, TokenIssuer,
};

/// Long-lived state shared by the HTTP server and CLI commands.
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub auth_service: Arc<dyn AuthService>,

    pub integration_service: Arc<dyn IntegrationService>,

    pub recipe_service: Arc<dyn RecipeService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        if config.auth.secret_key.is_empty() && store.count_integrations().await? > 0 {
            anyhow::bail!(
                "auth.secret_key is not set but encrypted API keys are stored; \
                 configure the secret they were written with (or LARDER_SECRET_KEY)"
            );
        }

        Ok(Self::with_store(config, store))
    }

    /// Wires services around an already migrated store.
    #[must_use]
    pub fn with_store(config: Config, store: Store) -> Self {
        // Tokens and stored API keys share one secret, so resolve it once.
        let secret = config.resolve_secret_key();
        let tokens = TokenIssuer::new(&secret, config.auth.token_lifetime_seconds);
        let cipher = SecretCipher::from_secret(&secret);

        let auth_service = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            tokens,
            config.auth.clone(),
            config.security.clone(),
        )) as Arc<dyn AuthService>;

        let integration_service =
            Arc::new(SeaOrmIntegrationService::new(store.clone(), cipher))
                as Arc<dyn IntegrationService>;

        let recipe_service =
            Arc::new(SeaOrmRecipeService::new(store.clone())) as Arc<dyn RecipeService>;

        Self {
            config: Arc::new(RwLock::new(config)),
            store,
            auth_service,
            integration_service,
            recipe_service,
        }
    }

    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }

    /// Creates the `[bootstrap]` user from configuration, if one is set.
    ///
    /// Returns `true` when a user was created by this call.
    pub async fn seed_bootstrap_user(&self) -> anyhow::Result<bool> {
        let Some(bootstrap) = self.config.read().await.bootstrap.clone() else {
            return Ok(false);
        };

        let created = self
            .auth_service
            .ensure_user(&bootstrap.username, &bootstrap.email, &bootstrap.password)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to seed bootstrap user: {e}"))?;

        if created {
            info!(username = %bootstrap.username, "Bootstrap user created");
        }

        Ok(created)
    }
}
