use super::state::AppState;
use crate::audio::PlayState;
use crate::session::{Dispatch, Outcome, SessionView};
use crate::transcript::MessageId;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct DraftRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct LanguageRequest {
    /// Code ("de") or English key ("german")
    pub language: String,
}

#[derive(Debug, Serialize)]
pub struct ActionResponse {
    /// False when another action was still outstanding
    pub dispatched: bool,
    pub outcome: Option<Outcome>,
    pub session: SessionView,
}

#[derive(Debug, Serialize)]
pub struct PlaybackResponse {
    pub message_id: MessageId,
    pub state: PlayState,
    pub icon: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> axum::response::Response {
    (status, Json(ErrorResponse { error: error.into() })).into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "loqa-voice-chat",
    }))
}

/// GET /session
pub async fn get_session(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.controller.snapshot().await)
}

/// POST /session/action
/// Activate the primary control and wait for the action to resolve
pub async fn activate(State(state): State<AppState>) -> impl IntoResponse {
    let dispatch = state.controller.activate().await;
    let session = state.controller.snapshot().await;

    match dispatch {
        Dispatch::Ignored => (
            StatusCode::CONFLICT,
            Json(ActionResponse {
                dispatched: false,
                outcome: None,
                session,
            }),
        )
            .into_response(),
        Dispatch::Completed { outcome, .. } => (
            StatusCode::OK,
            Json(ActionResponse {
                dispatched: true,
                outcome: Some(outcome),
                session,
            }),
        )
            .into_response(),
    }
}

/// PUT /session/draft
pub async fn set_draft(
    State(state): State<AppState>,
    Json(req): Json<DraftRequest>,
) -> impl IntoResponse {
    if !state.controller.set_draft(req.text).await {
        return error_response(StatusCode::CONFLICT, "The draft can only be edited while reviewing");
    }

    Json(state.controller.snapshot().await).into_response()
}

/// PUT /session/language
pub async fn set_language(
    State(state): State<AppState>,
    Json(req): Json<LanguageRequest>,
) -> impl IntoResponse {
    match state.controller.set_language(&req.language).await {
        Ok(true) => Json(state.controller.snapshot().await).into_response(),
        Ok(false) => error_response(
            StatusCode::CONFLICT,
            "The language can only be changed before initialization",
        ),
        Err(e) => {
            warn!("Rejected language '{}': {}", req.language, e);
            error_response(StatusCode::BAD_REQUEST, e.to_string())
        }
    }
}

/// POST /session/quick-replies/:index
pub async fn select_quick_reply(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> impl IntoResponse {
    match state.controller.select_quick_reply(index).await {
        Some(label) => {
            info!("Quick reply #{} selected via API: {}", index, label);
            Json(state.controller.snapshot().await).into_response()
        }
        None => error_response(
            StatusCode::CONFLICT,
            format!("Quick reply {} is not available", index),
        ),
    }
}

/// POST /session/playback/:message_id
pub async fn toggle_playback(
    State(state): State<AppState>,
    Path(message_id): Path<u64>,
) -> impl IntoResponse {
    let message_id = MessageId(message_id);

    match state.controller.toggle_playback(message_id).await {
        Ok(play_state) => Json(PlaybackResponse {
            message_id,
            state: play_state,
            icon: play_state.icon(),
            label: play_state.label(),
        })
        .into_response(),
        Err(e) => error_response(StatusCode::NOT_FOUND, e.to_string()),
    }
}
