use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use std::collections::HashMap;
use std::sync::Arc;

use super::validation::{parse_new_recipe, parse_recipe_query, validate_detail_level};
use super::{ApiError, ApiJson, AppState, MessageResponse};
use crate::models::recipe::{Recipe, RecipeUpdate};
use crate::services::{RecipeItem, RecipePage};

/// GET /recipes/
///
/// Query parameters are taken as raw strings so that malformed numbers get
/// the same `{"error": ...}` body as every other validation failure.
pub async fn list_recipes(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<RecipePage>, ApiError> {
    let query = parse_recipe_query(&params)?;
    let page = state.recipe_service().list(query).await?;
    Ok(Json(page))
}

/// GET /recipes/{id}/
pub async fn get_recipe(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<RecipeItem>, ApiError> {
    let detail_level = validate_detail_level(params.get("detail_level").map(String::as_str))?;
    let recipe = state.recipe_service().get(&id, detail_level).await?;
    Ok(Json(recipe))
}

/// POST /recipes/
pub async fn create_recipe(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<serde_json::Value>,
) -> Result<(StatusCode, Json<Recipe>), ApiError> {
    let recipe = parse_new_recipe(body)?;
    let recipe = state.recipe_service().create(recipe).await?;
    Ok((StatusCode::CREATED, Json(recipe)))
}

/// PUT /recipes/{id}/
pub async fn update_recipe(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(changes): ApiJson<RecipeUpdate>,
) -> Result<Json<Recipe>, ApiError> {
    let recipe = state.recipe_service().update(&id, changes).await?;
    Ok(Json(recipe))
}

/// DELETE /recipes/{id}/
pub async fn delete_recipe(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.recipe_service().delete(&id).await?;
    Ok(Json(MessageResponse::new("Recipe deleted successfully")))
}
