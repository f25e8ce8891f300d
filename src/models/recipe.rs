use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub prep_time: i32,
    pub cook_time: i32,
    pub servings: i32,
    pub image_url: String,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: String,
    pub name: String,
    pub amount: String,
    #[serde(default)]
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub id: String,
    pub instructions: String,
    /// Ids of the ingredients used in this step
    #[serde(default)]
    pub ingredients: Vec<String>,
}

/// Fields accepted by a recipe update. Absent fields keep their value;
/// `id` and `createdAt` never change.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeUpdate {
    pub user_id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub prep_time: Option<i32>,
    pub cook_time: Option<i32>,
    pub servings: Option<i32>,
    pub image_url: Option<String>,
    pub ingredients: Option<Vec<Ingredient>>,
    pub steps: Option<Vec<Step>>,
    pub tags: Option<Vec<String>>,
}

impl RecipeUpdate {
    /// Applies the supplied fields and stamps `updated_at`.
    pub fn apply(self, recipe: &mut Recipe, updated_at: String) {
        if let Some(v) = self.user_id {
            recipe.user_id = v;
        }
        if let Some(v) = self.title {
            recipe.title = v;
        }
        if let Some(v) = self.description {
            recipe.description = v;
        }
        if let Some(v) = self.prep_time {
            recipe.prep_time = v;
        }
        if let Some(v) = self.cook_time {
            recipe.cook_time = v;
        }
        if let Some(v) = self.servings {
            recipe.servings = v;
        }
        if let Some(v) = self.image_url {
            recipe.image_url = v;
        }
        if let Some(v) = self.ingredients {
            recipe.ingredients = v;
        }
        if let Some(v) = self.steps {
            recipe.steps = v;
        }
        if let Some(v) = self.tags {
            recipe.tags = v;
        }
        recipe.updated_at = updated_at;
    }
}

/// Card-sized projection used by `detail_level=simple`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeSummary {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub tags: Vec<String>,
}

impl From<Recipe> for RecipeSummary {
    fn from(recipe: Recipe) -> Self {
        Self {
            id: recipe.id,
            user_id: recipe.user_id,
            title: recipe.title,
            description: recipe.description,
            image_url: recipe.image_url,
            tags: recipe.tags,
        }
    }
}
