//! Session transcript handlers.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{session::Session, types::Result, AppState};

/// Get a session transcript.
#[utoipa::path(
    get,
    path = "/api/sessions/{id}",
    params(
        ("id" = String, Path, description = "Session ID")
    ),
    responses(
        (status = 200, description = "Session transcript", body = Session),
        (status = 404, description = "Session not found")
    ),
    tag = "sessions"
)]
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Session>> {
    Ok(Json(state.sessions.get(&id)?))
}
