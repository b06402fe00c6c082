//! Health and application metadata handlers.

use axum::{extract::State, Json};

use crate::{
    types::{AppInfo, HealthResponse, Result},
    AppState,
};

/// Liveness check with index statistics.
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Server is healthy", body = HealthResponse)
    ),
    tag = "meta"
)]
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>> {
    let stats = state.index.stats();

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        index_nodes: stats.node_count,
        index_dimensions: stats.dimensions,
    }))
}

/// Application metadata for the UI.
#[utoipa::path(
    get,
    path = "/api/app",
    responses(
        (status = 200, description = "Application metadata", body = AppInfo)
    ),
    tag = "meta"
)]
pub async fn app_info(State(state): State<AppState>) -> Result<Json<AppInfo>> {
    let config = state.config_manager.config();

    Ok(Json(AppInfo {
        description: config.index.app_description.clone(),
        greeting: config.greeting(),
        hyde_enabled: config.query.enable_hyde,
        citations_enabled: config.citation.enabled,
        model: config.llm.model_name().to_string(),
    }))
}
