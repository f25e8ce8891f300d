use crate::entities::{prelude::*, recipes};
use crate::models::recipe::Recipe;
use anyhow::{Context, Result};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
    sea_query::{Expr, OnConflict},
};

/// Filters for a recipe page. `search` matches title, description or tags.
#[derive(Debug, Clone, Default)]
pub struct RecipeFilter {
    pub user_id: Option<String>,
    pub search: Option<String>,
}

pub struct RecipeRepository {
    conn: DatabaseConnection,
}

impl RecipeRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Fetch `limit` rows starting at `offset`, plus the total number of
    /// matching rows.
    pub async fn list(
        &self,
        filter: &RecipeFilter,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<Recipe>, u64)> {
        let mut query = Recipes::find()
            .order_by_desc(recipes::Column::CreatedAt)
            .order_by_asc(recipes::Column::Id);

        if let Some(user_id) = &filter.user_id {
            query = query.filter(recipes::Column::UserId.eq(user_id.as_str()));
        }

        if let Some(search) = &filter.search {
            // SQLite LIKE is case-insensitive for ASCII.
            query = query.filter(
                Condition::any()
                    .add(recipes::Column::Title.contains(search.as_str()))
                    .add(recipes::Column::Description.contains(search.as_str()))
                    .add(tag_matches(search)),
            );
        }

        let total = query
            .clone()
            .count(&self.conn)
            .await
            .context("Failed to count recipes")?;
        let rows = query
            .offset(offset)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to fetch recipe page")?;

        let recipes = rows
            .into_iter()
            .map(model_to_recipe)
            .collect::<Result<Vec<_>>>()?;

        Ok((recipes, total))
    }

    pub async fn get(&self, id: &str) -> Result<Option<Recipe>> {
        let row = Recipes::find_by_id(id.to_string())
            .one(&self.conn)
            .await
            .context("Failed to query recipe")?;

        row.map(model_to_recipe).transpose()
    }

    pub async fn exists(&self, id: &str) -> Result<bool> {
        Ok(self.get(id).await?.is_some())
    }

    /// Insert a recipe, replacing any row with the same id.
    pub async fn save(&self, recipe: &Recipe) -> Result<()> {
        Recipes::insert(recipe_to_active_model(recipe)?)
            .on_conflict(
                OnConflict::column(recipes::Column::Id)
                    .update_columns([
                        recipes::Column::UserId,
                        recipes::Column::Title,
                        recipes::Column::Description,
                        recipes::Column::PrepTime,
                        recipes::Column::CookTime,
                        recipes::Column::Servings,
                        recipes::Column::ImageUrl,
                        recipes::Column::Ingredients,
                        recipes::Column::Steps,
                        recipes::Column::Tags,
                        recipes::Column::CreatedAt,
                        recipes::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await
            .with_context(|| format!("Failed to save recipe {}", recipe.id))?;

        Ok(())
    }

    /// Insert a recipe unless its id is taken. Returns `false` on conflict.
    pub async fn insert(&self, recipe: &Recipe) -> Result<bool> {
        let inserted = Recipes::insert(recipe_to_active_model(recipe)?)
            .on_conflict(
                OnConflict::column(recipes::Column::Id)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await
            .with_context(|| format!("Failed to insert recipe {}", recipe.id))?;

        Ok(inserted > 0)
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = Recipes::delete_by_id(id.to_string())
            .exec(&self.conn)
            .await
            .with_context(|| format!("Failed to delete recipe {id}"))?;

        Ok(result.rows_affected > 0)
    }
}

fn recipe_to_active_model(recipe: &Recipe) -> Result<recipes::ActiveModel> {
    Ok(recipes::ActiveModel {
        id: Set(recipe.id.clone()),
        user_id: Set(recipe.user_id.clone()),
        title: Set(recipe.title.clone()),
        description: Set(recipe.description.clone()),
        prep_time: Set(recipe.prep_time),
        cook_time: Set(recipe.cook_time),
        servings: Set(recipe.servings),
        image_url: Set(recipe.image_url.clone()),
        ingredients: Set(serde_json::to_string(&recipe.ingredients)?),
        steps: Set(serde_json::to_string(&recipe.steps)?),
        tags: Set(serde_json::to_string(&recipe.tags)?),
        created_at: Set(recipe.created_at.clone()),
        updated_at: Set(recipe.updated_at.clone()),
    })
}

/// Matches individual tag values, not the JSON text they are stored as.
fn tag_matches(search: &str) -> sea_orm::sea_query::SimpleExpr {
    Expr::cust_with_values(
        r#"EXISTS (SELECT 1 FROM json_each("recipes"."tags") WHERE json_each.value LIKE ?)"#,
        [format!("%{search}%")],
    )
}

fn model_to_recipe(model: recipes::Model) -> Result<Recipe> {
    Ok(Recipe {
        ingredients: serde_json::from_str(&model.ingredients)
            .with_context(|| format!("Corrupt ingredients for recipe {}", model.id))?,
        steps: serde_json::from_str(&model.steps)
            .with_context(|| format!("Corrupt steps for recipe {}", model.id))?,
        tags: serde_json::from_str(&model.tags)
            .with_context(|| format!("Corrupt tags for recipe {}", model.id))?,
        id: model.id,
        user_id: model.user_id,
        title: model.title,
        description: model.description,
        prep_time: model.prep_time,
        cook_time: model.cook_time,
        servings: model.servings,
        image_url: model.image_url,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}
