//! HTTP API for driving a session from an external view
//!
//! - GET /health - Health check
//! - GET /session - Snapshot of the session
//! - POST /session/action - Activate the primary control
//! - PUT /session/draft - Edit the draft while reviewing
//! - PUT /session/language - Pick the language before initialization
//! - POST /session/quick-replies/:index - Select a quick-reply chip
//! - POST /session/playback/:message_id - Toggle playback of a message

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
