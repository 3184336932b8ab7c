//! Voice chat session client
//!
//! Records speech, has a backend transcribe it, lets the user review the text
//! before sending, and renders the assistant's replies with optional audio and
//! quick-reply suggestions.

pub mod audio;
pub mod config;
pub mod error;
pub mod events;
pub mod gateway;
pub mod http;
pub mod language;
pub mod session;
pub mod suggest;
pub mod transcript;

pub use audio::{AudioBackend, AudioBackendFactory, AudioCaptureManager, AudioSource, AudioUnit};
pub use config::Config;
pub use error::{Error, Result};
pub use events::UiEvent;
pub use gateway::{Gateway, HttpGateway};
pub use http::{create_router, AppState};
pub use language::Language;
pub use session::{Dispatch, SessionController, SessionState, SessionView};
