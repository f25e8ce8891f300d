use std::collections::HashMap;

use super::ApiError;
use crate::domain::DetailLevel;
use crate::models::recipe::Recipe;
use crate::services::RecipeQuery;

const DEFAULT_PAGE: i64 = 1;
const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: u64 = 100;

fn parse_int_param(
    params: &HashMap<String, String>,
    name: &str,
    default: i64,
) -> Result<i64, ApiError> {
    match params.get(name) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<i64>().map_err(|_| {
            ApiError::validation(format!(
                "Invalid parameter: {name} must be an integer, got '{raw}'"
            ))
        }),
    }
}

fn validate_positive(value: i64, name: &str) -> Result<u64, ApiError> {
    u64::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| ApiError::validation(format!("{name} must be greater than 0")))
}

pub fn validate_detail_level(raw: Option<&str>) -> Result<DetailLevel, ApiError> {
    match raw {
        None => Ok(DetailLevel::default()),
        Some(raw) => DetailLevel::parse(raw)
            .ok_or_else(|| ApiError::validation("detail_level must be 'simple' or 'detailed'")),
    }
}

/// Builds a recipe listing query from raw query-string parameters.
pub fn parse_recipe_query(params: &HashMap<String, String>) -> Result<RecipeQuery, ApiError> {
    let page = parse_int_param(params, "page", DEFAULT_PAGE)?;
    let page_size = parse_int_param(params, "page_size", DEFAULT_PAGE_SIZE)?;

    let page = validate_positive(page, "page")?;
    let page_size = validate_positive(page_size, "page_size")?;
    if page_size > MAX_PAGE_SIZE {
        return Err(ApiError::validation(format!(
            "page_size must be at most {MAX_PAGE_SIZE}"
        )));
    }
    if RecipeQuery::offset_for(page, page_size).is_none() {
        return Err(ApiError::validation("page is out of range"));
    }
    let detail_level = validate_detail_level(params.get("detail_level").map(String::as_str))?;

    Ok(RecipeQuery {
        page,
        page_size,
        search: params.get("search").cloned(),
        user_id: params.get("user_id").cloned(),
        detail_level,
    })
}

const REQUIRED_RECIPE_FIELDS: &[&str] = &[
    "id",
    "userId",
    "title",
    "description",
    "prepTime",
    "cookTime",
    "servings",
    "imageUrl",
    "ingredients",
    "steps",
    "tags",
    "createdAt",
    "updatedAt",
];

/// Parses a recipe creation body, naming every missing field at once.
pub fn parse_new_recipe(body: serde_json::Value) -> Result<Recipe, ApiError> {
    let Some(fields) = body.as_object() else {
        return Err(ApiError::validation("Recipe must be a JSON object"));
    };

    let missing: Vec<&str> = REQUIRED_RECIPE_FIELDS
        .iter()
        .copied()
        .filter(|field| fields.get(*field).is_none_or(serde_json::Value::is_null))
        .collect();
    if !missing.is_empty() {
        return Err(ApiError::validation(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    }

    serde_json::from_value(body).map_err(|e| ApiError::validation(format!("Invalid recipe: {e}")))
}
