//! Feedback handlers.
//!
//! The UI shows a thumbs-up/down control once per assistant message; a
//! thumbs-down may carry a free-text reason. A message accepts feedback at
//! most once.

use axum::{extract::State, Json};

use crate::{
    session::FeedbackRecord,
    types::{AppError, FeedbackRequest, Result},
    AppState,
};

/// Record feedback on an assistant message.
#[utoipa::path(
    post,
    path = "/api/feedback",
    request_body = FeedbackRequest,
    responses(
        (status = 200, description = "Feedback recorded", body = FeedbackRecord),
        (status = 400, description = "Invalid input or duplicate feedback"),
        (status = 404, description = "Session or message not found")
    ),
    tag = "feedback"
)]
pub async fn submit_feedback(
    State(state): State<AppState>,
    Json(payload): Json<FeedbackRequest>,
) -> Result<Json<FeedbackRecord>> {
    if payload.session_id.is_empty() {
        return Err(AppError::InvalidInput("Session id required".into()));
    }
    if payload.message_id.is_empty() {
        return Err(AppError::InvalidInput("Message id required".into()));
    }

    if !state
        .sessions
        .has_message(&payload.session_id, &payload.message_id)
    {
        return Err(AppError::NotFound(format!(
            "Message '{}' not found in session '{}'",
            payload.message_id, payload.session_id
        )));
    }

    let record = state.feedback.record(
        &payload.session_id,
        &payload.message_id,
        payload.is_good,
        payload.reason.clone(),
    )?;

    tracing::info!(
        session_id = %payload.session_id,
        message_id = %payload.message_id,
        is_good = payload.is_good,
        "Feedback recorded"
    );

    Ok(Json(record))
}

/// List all recorded feedback, oldest first.
#[utoipa::path(
    get,
    path = "/api/feedback",
    responses(
        (status = 200, description = "Recorded feedback", body = Vec<FeedbackRecord>)
    ),
    tag = "feedback"
)]
pub async fn list_feedback(State(state): State<AppState>) -> Result<Json<Vec<FeedbackRecord>>> {
    Ok(Json(state.feedback.list()))
}
