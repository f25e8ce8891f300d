//! Domain service for recipes: paginated reads, edits and seeding.

use serde::Serialize;
use thiserror::Error;

use crate::domain::DetailLevel;
use crate::models::recipe::{Recipe, RecipeSummary, RecipeUpdate};

#[derive(Debug, Error)]
pub enum RecipeError {
    #[error("{0}")]
    Validation(String),

    #[error("Recipe not found")]
    NotFound,

    #[error("Recipe with id '{0}' already exists")]
    AlreadyExists(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for RecipeError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for RecipeError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

/// A validated recipe listing request. Pages are 1-indexed.
#[derive(Debug, Clone)]
pub struct RecipeQuery {
    pub page: u64,
    pub page_size: u64,
    pub search: Option<String>,
    pub user_id: Option<String>,
    pub detail_level: DetailLevel,
}

impl RecipeQuery {
    /// Row offset of a 1-indexed page. `None` when it does not fit an SQL
    /// `OFFSET` (a signed 64-bit integer).
    #[must_use]
    pub fn offset_for(page: u64, page_size: u64) -> Option<u64> {
        page.checked_sub(1)?
            .checked_mul(page_size)
            .filter(|offset| i64::try_from(*offset).is_ok())
    }
}

impl Default for RecipeQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 10,
            search: None,
            user_id: None,
            detail_level: DetailLevel::Detailed,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum RecipeItem {
    Simple(RecipeSummary),
    Detailed(Recipe),
}

impl RecipeItem {
    #[must_use]
    pub fn shape(recipe: Recipe, detail_level: DetailLevel) -> Self {
        match detail_level {
            DetailLevel::Simple => Self::Simple(RecipeSummary::from(recipe)),
            DetailLevel::Detailed => Self::Detailed(recipe),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u64,
    pub page_size: u64,
    pub total: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl Pagination {
    #[must_use]
    pub const fn new(page: u64, page_size: u64, total: u64) -> Self {
        let total_pages = if page_size == 0 {
            0
        } else {
            total.div_ceil(page_size)
        };

        Self {
            page,
            page_size,
            total,
            total_pages,
            has_next: page < total_pages,
            has_previous: page > 1,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipePage {
    pub recipes: Vec<RecipeItem>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub created: usize,
    pub replaced: usize,
    pub skipped: usize,
}

#[async_trait::async_trait]
pub trait RecipeService: Send + Sync {
    /// # Errors
    ///
    /// Returns [`RecipeError::Validation`] when `page` or `page_size` is zero
    /// or the page lies beyond any addressable offset.
    async fn list(&self, query: RecipeQuery) -> Result<RecipePage, RecipeError>;

    /// One recipe by id, shaped by `detail_level`.
    async fn get(&self, id: &str, detail_level: DetailLevel) -> Result<RecipeItem, RecipeError>;

    /// Stores a new recipe.
    ///
    /// # Errors
    ///
    /// Returns [`RecipeError::AlreadyExists`] when the id is taken.
    async fn create(&self, recipe: Recipe) -> Result<Recipe, RecipeError>;

    /// Applies a partial update and returns the stored recipe.
    async fn update(&self, id: &str, changes: RecipeUpdate) -> Result<Recipe, RecipeError>;

    async fn delete(&self, id: &str) -> Result<(), RecipeError>;

    /// Stores `recipes`. Existing ids are skipped unless `force` is set.
    async fn seed(&self, recipes: Vec<Recipe>, force: bool) -> Result<SeedReport, RecipeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_metadata() {
        let p = Pagination::new(1, 10, 25);
        assert_eq!(p.total_pages, 3);
        assert!(p.has_next);
        assert!(!p.has_previous);

        let p = Pagination::new(3, 10, 25);
        assert!(!p.has_next);
        assert!(p.has_previous);

        let p = Pagination::new(1, 10, 0);
        assert_eq!(p.total_pages, 0);
        assert!(!p.has_next);
    }

    #[test]
    fn offset_for_rejects_overflow() {
        assert_eq!(RecipeQuery::offset_for(1, 10), Some(0));
        assert_eq!(RecipeQuery::offset_for(3, 10), Some(20));
        assert_eq!(RecipeQuery::offset_for(0, 10), None);
        assert_eq!(RecipeQuery::offset_for(u64::MAX, 10), None);
        assert_eq!(RecipeQuery::offset_for(i64::MAX as u64, 2), None);
    }

    #[test]
    fn page_past_the_end_has_no_next() {
        let p = Pagination::new(9, 2, 3);
        assert_eq!(p.total_pages, 2);
        assert!(!p.has_next);
        assert!(p.has_previous);
    }
}
