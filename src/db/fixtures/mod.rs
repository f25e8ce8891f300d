//! Sample data bundled into the binary.

use anyhow::{Context, Result};

use crate::models::recipe::Recipe;

const RECIPES_JSON: &str = include_str!("recipes.json");

/// Recipes loaded by `larder seed-recipes`.
pub fn bundled_recipes() -> Result<Vec<Recipe>> {
    serde_json::from_str(RECIPES_JSON).context("Bundled recipe fixtures are invalid")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_recipes_parse() {
        let recipes = bundled_recipes().unwrap();
        assert!(!recipes.is_empty());
        assert!(recipes.iter().all(|r| !r.id.is_empty() && !r.title.is_empty()));
    }
}
