//! Integration tests for the recipe endpoints and seeding.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use larder::config::Config;
use larder::db::fixtures::bundled_recipes;
use larder::models::recipe::Recipe;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

async fn spawn_app() -> (Arc<larder::api::AppState>, Router, String) {
    let db_path =
        std::env::temp_dir().join(format!("larder-recipe-test-{}.db", uuid::Uuid::new_v4()));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.auth.secret_key = "recipe-test-secret".to_string();
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;

    let state = larder::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");

    let registration = state
        .shared
        .auth_service
        .register("chef", "chef@example.com", "mise-en-place")
        .await
        .expect("Failed to register test user");

    state
        .shared
        .recipe_service
        .seed(bundled_recipes().unwrap(), false)
        .await
        .expect("Failed to seed recipes");

    let router = larder::api::router(state.clone()).await;
    (state, router, registration.token.access_token)
}

async fn get(app: &Router, uri: &str, token: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(uri)
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", format!("Bearer {token}"));
    let body = match body {
        Some(json) => {
            builder = builder.header("Content-Type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn new_recipe(id: &str) -> Value {
    json!({
        "id": id,
        "userId": "1",
        "title": "Tomato Soup",
        "description": "Blended roast tomatoes.",
        "prepTime": 10,
        "cookTime": 40,
        "servings": 4,
        "imageUrl": "https://example.com/soup.jpg",
        "ingredients": [{"id": "i1", "name": "Tomatoes", "amount": "1", "unit": "kg"}],
        "steps": [{"id": "s1", "instructions": "Roast and blend.", "ingredients": ["i1"]}],
        "tags": ["Soup", "Vegan"],
        "createdAt": "2030-01-01T00:00:00Z",
        "updatedAt": "2030-01-01T00:00:00Z"
    })
}

fn ids(body: &Value) -> Vec<String> {
    body["recipes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_list_recipes_newest_first() {
    let (_, app, token) = spawn_app().await;

    let (status, body) = get(&app, "/api/recipes/", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec!["2", "1", "3"]);
    assert_eq!(
        body["pagination"],
        json!({
            "page": 1,
            "page_size": 10,
            "total": 3,
            "total_pages": 1,
            "has_next": false,
            "has_previous": false,
        })
    );

    let first = &body["recipes"][0];
    assert!(first["ingredients"].is_array());
    assert!(first["steps"].is_array());
    assert!(first["prepTime"].is_number());
}

#[tokio::test]
async fn test_list_recipes_pagination() {
    let (_, app, token) = spawn_app().await;

    let (_, body) = get(&app, "/api/recipes/?page=1&page_size=2", &token).await;
    assert_eq!(ids(&body), vec!["2", "1"]);
    assert_eq!(body["pagination"]["total_pages"], 2);
    assert_eq!(body["pagination"]["has_next"], true);
    assert_eq!(body["pagination"]["has_previous"], false);

    let (_, body) = get(&app, "/api/recipes/?page=2&page_size=2", &token).await;
    assert_eq!(ids(&body), vec!["3"]);
    assert_eq!(body["pagination"]["has_next"], false);
    assert_eq!(body["pagination"]["has_previous"], true);

    let (status, body) = get(&app, "/api/recipes/?page=5&page_size=2", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert!(ids(&body).is_empty());
}

#[tokio::test]
async fn test_simple_detail_level_omits_body() {
    let (_, app, token) = spawn_app().await;

    let (status, body) = get(&app, "/api/recipes/?detail_level=simple", &token).await;
    assert_eq!(status, StatusCode::OK);

    let recipe = body["recipes"][0].as_object().unwrap();
    let mut keys: Vec<&str> = recipe.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(
        keys,
        vec!["description", "id", "imageUrl", "tags", "title", "userId"]
    );
}

#[tokio::test]
async fn test_search_and_user_filter() {
    let (state, app, token) = spawn_app().await;

    let (_, body) = get(&app, "/api/recipes/?search=pasta", &token).await;
    assert_eq!(ids(&body), vec!["1"]);

    let (_, body) = get(&app, "/api/recipes/?search=chocolate", &token).await;
    assert_eq!(ids(&body), vec!["3"]);

    let (_, body) = get(&app, "/api/recipes/?search=vegetarian", &token).await;
    assert_eq!(ids(&body), vec!["2"]);

    let (_, body) = get(&app, "/api/recipes/?search=quick", &token).await;
    assert_eq!(ids(&body), vec!["2", "1"]);

    // Tags are matched as values, so JSON punctuation never matches.
    let (status, body) = get(&app, "/api/recipes/?search=%22", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert!(ids(&body).is_empty());

    let mut other: Recipe = bundled_recipes().unwrap().remove(0);
    other.id = "99".to_string();
    other.user_id = "2".to_string();
    other.created_at = "2024-01-01T00:00:00Z".to_string();
    state
        .shared
        .recipe_service
        .seed(vec![other], false)
        .await
        .unwrap();

    let (_, body) = get(&app, "/api/recipes/?user_id=2", &token).await;
    assert_eq!(ids(&body), vec!["99"]);
    assert_eq!(body["pagination"]["total"], 1);

    let (_, body) = get(&app, "/api/recipes/?user_id=1&page_size=1", &token).await;
    assert_eq!(body["pagination"]["total"], 3);
}

#[tokio::test]
async fn test_invalid_parameters() {
    let (_, app, token) = spawn_app().await;

    let cases = [
        ("/api/recipes/?page=0", "page must be greater than 0"),
        ("/api/recipes/?page_size=0", "page_size must be greater than 0"),
        (
            "/api/recipes/?detail_level=full",
            "detail_level must be 'simple' or 'detailed'",
        ),
        (
            "/api/recipes/?page_size=101",
            "page_size must be at most 100",
        ),
        (
            "/api/recipes/?page=9223372036854775807&page_size=10",
            "page is out of range",
        ),
    ];

    for (uri, expected) in cases {
        let (status, body) = get(&app, uri, &token).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["error"], expected);
    }

    let (status, body) = get(&app, "/api/recipes/?page=abc", &token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .starts_with("Invalid parameter:")
    );
}

#[tokio::test]
async fn test_get_recipe_by_id() {
    let (_, app, token) = spawn_app().await;

    let (status, body) = get(&app, "/api/recipes/1/", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Classic Spaghetti Carbonara");
    assert!(body["ingredients"].is_array());

    let (status, body) = get(&app, "/api/recipes/1/?detail_level=simple", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("ingredients").is_none());

    let (status, body) = get(&app, "/api/recipes/missing/", &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Recipe not found");
}

#[tokio::test]
async fn test_seed_skips_existing_unless_forced() {
    let (state, _, _) = spawn_app().await;
    let service = &state.shared.recipe_service;

    let report = service.seed(bundled_recipes().unwrap(), false).await.unwrap();
    assert_eq!(report.created, 0);
    assert_eq!(report.skipped, 3);

    let mut recipes = bundled_recipes().unwrap();
    recipes[0].title = "Renamed".to_string();
    let report = service.seed(recipes, true).await.unwrap();
    assert_eq!(report.replaced, 3);
    assert_eq!(report.skipped, 0);

    let stored = state.store().get_recipe("1").await.unwrap().unwrap();
    assert_eq!(stored.title, "Renamed");
}

#[tokio::test]
async fn test_create_recipe() {
    let (_, app, token) = spawn_app().await;

    let (status, body) = send(&app, "POST", "/api/recipes/", &token, Some(new_recipe("10"))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], "10");
    assert_eq!(body["ingredients"][0]["name"], "Tomatoes");

    let (status, body) = get(&app, "/api/recipes/10/", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tags"], json!(["Soup", "Vegan"]));

    let (_, body) = get(&app, "/api/recipes/", &token).await;
    assert_eq!(body["pagination"]["total"], 4);
    assert_eq!(ids(&body)[0], "10");

    let (status, body) = send(&app, "POST", "/api/recipes/", &token, Some(new_recipe("10"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Recipe with id '10' already exists");
}

#[tokio::test]
async fn test_create_recipe_requires_all_fields() {
    let (_, app, token) = spawn_app().await;

    let mut recipe = new_recipe("11");
    let fields = recipe.as_object_mut().unwrap();
    fields.remove("title");
    fields.remove("steps");

    let (status, body) = send(&app, "POST", "/api/recipes/", &token, Some(recipe)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required fields: title, steps");

    let mut recipe = new_recipe("11");
    recipe["servings"] = json!("four");
    let (status, body) = send(&app, "POST", "/api/recipes/", &token, Some(recipe)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid recipe:"));

    let (status, _) = get(&app, "/api/recipes/11/", &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_recipe_is_partial() {
    let (state, app, token) = spawn_app().await;
    let before = state.store().get_recipe("1").await.unwrap().unwrap();

    let (status, body) = send(
        &app,
        "PUT",
        "/api/recipes/1/",
        &token,
        Some(json!({"title": "Weeknight Carbonara", "servings": 2})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Weeknight Carbonara");
    assert_eq!(body["servings"], 2);

    let stored = state.store().get_recipe("1").await.unwrap().unwrap();
    assert_eq!(stored.title, "Weeknight Carbonara");
    assert_eq!(stored.description, before.description);
    assert_eq!(stored.ingredients, before.ingredients);
    assert_eq!(stored.created_at, before.created_at);
    assert_ne!(stored.updated_at, before.updated_at);

    let (status, body) = send(
        &app,
        "PUT",
        "/api/recipes/missing/",
        &token,
        Some(json!({"title": "Nothing"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Recipe not found");
}

#[tokio::test]
async fn test_delete_recipe() {
    let (_, app, token) = spawn_app().await;

    let (status, body) = send(&app, "DELETE", "/api/recipes/3/", &token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Recipe deleted successfully");

    let (status, _) = get(&app, "/api/recipes/3/", &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, "DELETE", "/api/recipes/3/", &token, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Recipe not found");
}

#[tokio::test]
async fn test_recipe_writes_require_auth() {
    let (_, app, _) = spawn_app().await;

    let (status, _) = send(&app, "DELETE", "/api/recipes/1/", "not-a-token", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
