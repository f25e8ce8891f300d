use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;

use super::{ApiError, ApiJson, AppState, IntegrationListResponse};
use crate::services::{
    AuthenticatedUser, CreateIntegrationRequest, IntegrationView, UpdateIntegrationRequest,
};

/// GET /ai-integrations/
pub async fn list_integrations(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<IntegrationListResponse>, ApiError> {
    let integrations = state.integration_service().list(user.id).await?;
    Ok(Json(IntegrationListResponse { integrations }))
}

/// GET /ai-integrations/{provider}/
pub async fn get_integration(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(provider): Path<String>,
) -> Result<Json<IntegrationView>, ApiError> {
    let view = state.integration_service().get(user.id, &provider).await?;
    Ok(Json(view))
}

/// POST /ai-integrations/
///
/// 201 when a record was inserted, 200 when an existing one was updated.
pub async fn create_integration(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    ApiJson(payload): ApiJson<CreateIntegrationRequest>,
) -> Result<(StatusCode, Json<IntegrationView>), ApiError> {
    let (view, created) = state
        .integration_service()
        .create_or_update(user.id, payload)
        .await?;

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((status, Json(view)))
}

/// PUT /ai-integrations/{provider}/
pub async fn update_integration(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(provider): Path<String>,
    ApiJson(payload): ApiJson<UpdateIntegrationRequest>,
) -> Result<Json<IntegrationView>, ApiError> {
    let view = state
        .integration_service()
        .update(user.id, &provider, payload)
        .await?;

    Ok(Json(view))
}
