use axum::{
    Extension, Json,
    extract::{Request, State},
    http::{StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::{
    ApiError, ApiJson, AppState, CreateUserRequest, CreateUserResponse, LoginRequest,
    MessageResponse, TokenResponse,
};
use crate::services::AuthenticatedUser;
use crate::services::token::bearer_token;

// ============================================================================
// Middleware
// ============================================================================

/// Requires `Authorization: Bearer <token>` and attaches the resolved
/// [`AuthenticatedUser`] to the request extensions.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    let token = bearer_token(header)?.to_string();

    let user = state.auth_service().authenticate(&token).await?;

    tracing::Span::current().record("user_id", user.id.value());
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /create-user/
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<CreateUserResponse>), ApiError> {
    let registration = state
        .auth_service()
        .register(&payload.username, &payload.email, &payload.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateUserResponse {
            message: "User created successfully",
            user: registration.user,
            token: registration.token.into(),
        }),
    ))
}

/// POST /login/
pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let token = state
        .auth_service()
        .login(&payload.username, &payload.password)
        .await?;

    tracing::info!(username = %payload.username, "User logged in");

    Ok(Json(token.into()))
}

/// GET /protected/
pub async fn protected(Extension(user): Extension<AuthenticatedUser>) -> Json<MessageResponse> {
    Json(MessageResponse::new(format!("Welcome {}", user.username)))
}
