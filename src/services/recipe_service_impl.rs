//! `SeaORM` implementation of the `RecipeService` trait.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::db::{RecipeFilter, Store};
use crate::domain::DetailLevel;
use crate::models::recipe::{Recipe, RecipeUpdate};
use crate::services::recipe_service::{
    Pagination, RecipeError, RecipeItem, RecipePage, RecipeQuery, RecipeService, SeedReport,
};

pub struct SeaOrmRecipeService {
    store: Store,
}

impl SeaOrmRecipeService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[async_trait]
impl RecipeService for SeaOrmRecipeService {
    async fn list(&self, query: RecipeQuery) -> Result<RecipePage, RecipeError> {
        if query.page == 0 {
            return Err(RecipeError::Validation(
                "page must be greater than 0".to_string(),
            ));
        }
        if query.page_size == 0 {
            return Err(RecipeError::Validation(
                "page_size must be greater than 0".to_string(),
            ));
        }

        let offset = RecipeQuery::offset_for(query.page, query.page_size)
            .ok_or_else(|| RecipeError::Validation("page is out of range".to_string()))?;

        let filter = RecipeFilter {
            user_id: non_blank(query.user_id),
            search: non_blank(query.search),
        };

        let (recipes, total) = self
            .store
            .list_recipes(&filter, offset, query.page_size)
            .await?;

        debug!(
            page = query.page,
            page_size = query.page_size,
            total,
            "Listed recipes"
        );

        let recipes = recipes
            .into_iter()
            .map(|recipe| RecipeItem::shape(recipe, query.detail_level))
            .collect();

        Ok(RecipePage {
            recipes,
            pagination: Pagination::new(query.page, query.page_size, total),
        })
    }

    async fn get(&self, id: &str, detail_level: DetailLevel) -> Result<RecipeItem, RecipeError> {
        let recipe = self
            .store
            .get_recipe(id)
            .await?
            .ok_or(RecipeError::NotFound)?;

        Ok(RecipeItem::shape(recipe, detail_level))
    }

    async fn create(&self, recipe: Recipe) -> Result<Recipe, RecipeError> {
        if recipe.id.trim().is_empty() {
            return Err(RecipeError::Validation("id must not be empty".to_string()));
        }

        if !self.store.insert_recipe(&recipe).await? {
            return Err(RecipeError::AlreadyExists(recipe.id));
        }

        info!(recipe_id = %recipe.id, "Recipe created");
        Ok(recipe)
    }

    async fn update(&self, id: &str, changes: RecipeUpdate) -> Result<Recipe, RecipeError> {
        let mut recipe = self
            .store
            .get_recipe(id)
            .await?
            .ok_or(RecipeError::NotFound)?;

        changes.apply(&mut recipe, chrono::Utc::now().to_rfc3339());
        self.store.save_recipe(&recipe).await?;

        info!(recipe_id = %recipe.id, "Recipe updated");
        Ok(recipe)
    }

    async fn delete(&self, id: &str) -> Result<(), RecipeError> {
        if !self.store.delete_recipe(id).await? {
            return Err(RecipeError::NotFound);
        }

        info!(recipe_id = %id, "Recipe deleted");
        Ok(())
    }

    async fn seed(&self, recipes: Vec<Recipe>, force: bool) -> Result<SeedReport, RecipeError> {
        let mut report = SeedReport::default();

        for recipe in &recipes {
            let exists = self.store.recipe_exists(&recipe.id).await?;
            if exists && !force {
                report.skipped += 1;
                continue;
            }

            self.store.save_recipe(recipe).await?;
            if exists {
                report.replaced += 1;
            } else {
                report.created += 1;
            }
        }

        info!(
            created = report.created,
            replaced = report.replaced,
            skipped = report.skipped,
            "Recipe seeding finished"
        );

        Ok(report)
    }
}
