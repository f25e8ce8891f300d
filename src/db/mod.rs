use crate::config::SecurityConfig;
use crate::domain::UserId;
use crate::entities::ai_integrations;
use crate::models::recipe::Recipe;
use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

pub mod backup;
pub mod fixtures;
pub mod migrator;
pub mod repositories;

pub use repositories::integration::{IntegrationPatch, IntegrationUpsert};
pub use repositories::recipe::RecipeFilter;
pub use repositories::user::{CreateUserOutcome, User};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let db_file = backup::sqlite_file_path(db_url);
        if let Some(path) = &db_file {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !path.exists() {
                std::fs::File::create(path)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        if let Some(path) = &db_file {
            backup_before_migrating(&conn, path).await;
        }

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn integration_repo(&self) -> repositories::integration::IntegrationRepository {
        repositories::integration::IntegrationRepository::new(self.conn.clone())
    }

    fn recipe_repo(&self) -> repositories::recipe::RecipeRepository {
        repositories::recipe::RecipeRepository::new(self.conn.clone())
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn get_user_by_id(&self, id: UserId) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn username_exists(&self, username: &str) -> Result<bool> {
        self.user_repo().username_exists(username).await
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        self.user_repo().email_exists(email).await
    }

    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        password: &str,
        security: &SecurityConfig,
    ) -> Result<CreateUserOutcome> {
        self.user_repo()
            .create(username, email, password, security)
            .await
    }

    pub async fn verify_user_password(&self, username: &str, password: &str) -> Result<bool> {
        self.user_repo().verify_password(username, password).await
    }

    pub async fn list_integrations(
        &self,
        user_id: UserId,
    ) -> Result<Vec<ai_integrations::Model>> {
        self.integration_repo().list_for_user(user_id).await
    }

    pub async fn count_integrations(&self) -> Result<u64> {
        self.integration_repo().count().await
    }

    pub async fn get_integration(
        &self,
        user_id: UserId,
        provider: &str,
    ) -> Result<Option<ai_integrations::Model>> {
        self.integration_repo().get(user_id, provider).await
    }

    pub async fn upsert_integration(
        &self,
        user_id: UserId,
        values: IntegrationUpsert,
    ) -> Result<(ai_integrations::Model, bool)> {
        self.integration_repo().upsert(user_id, values).await
    }

    pub async fn update_integration(
        &self,
        user_id: UserId,
        provider: &str,
        patch: IntegrationPatch,
    ) -> Result<Option<ai_integrations::Model>> {
        self.integration_repo()
            .update(user_id, provider, patch)
            .await
    }

    pub async fn list_recipes(
        &self,
        filter: &RecipeFilter,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<Recipe>, u64)> {
        self.recipe_repo().list(filter, offset, limit).await
    }

    pub async fn get_recipe(&self, id: &str) -> Result<Option<Recipe>> {
        self.recipe_repo().get(id).await
    }

    pub async fn recipe_exists(&self, id: &str) -> Result<bool> {
        self.recipe_repo().exists(id).await
    }

    pub async fn save_recipe(&self, recipe: &Recipe) -> Result<()> {
        self.recipe_repo().save(recipe).await
    }

    pub async fn insert_recipe(&self, recipe: &Recipe) -> Result<bool> {
        self.recipe_repo().insert(recipe).await
    }

    pub async fn delete_recipe(&self, id: &str) -> Result<bool> {
        self.recipe_repo().delete(id).await
    }
}

/// Snapshots an existing database before pending migrations touch it.
/// A failed backup is logged and does not block startup.
async fn backup_before_migrating(conn: &DatabaseConnection, path: &Path) {
    use sea_orm_migration::MigratorTrait;

    let status = async {
        let applied = migrator::Migrator::get_applied_migrations(conn).await?;
        let pending = migrator::Migrator::get_pending_migrations(conn).await?;
        Ok::<_, sea_orm::DbErr>(!applied.is_empty() && !pending.is_empty())
    }
    .await;

    match status {
        Ok(true) => {
            let manager = backup::BackupManager::for_database(path);
            if let Err(e) = manager.snapshot(conn, backup::BACKUP_PREFIX).await {
                warn!("Pre-migration backup failed: {e:#}");
            }
        }
        Ok(false) => {}
        Err(e) => warn!("Could not inspect migration status: {e}"),
    }
}
