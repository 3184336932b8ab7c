use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/session", get(handlers::get_session))
        .route("/session/action", post(handlers::activate))
        .route("/session/draft", put(handlers::set_draft))
        .route("/session/language", put(handlers::set_language))
        .route(
            "/session/quick-replies/:index",
            post(handlers::select_quick_reply),
        )
        .route(
            "/session/playback/:message_id",
            post(handlers::toggle_playback),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
