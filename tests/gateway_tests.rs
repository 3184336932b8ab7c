// Integration tests for the HTTP gateway against a mock conversation backend

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use base64::Engine;
use loqa_voice_chat::audio::{AudioFrame, AudioUnit};
use loqa_voice_chat::config::BackendConfig;
use loqa_voice_chat::error::Error;
use loqa_voice_chat::gateway::{Gateway, HttpGateway, DEFAULT_INTRO_TEXT, DEFAULT_REPLY_TEXT};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

/// Request bodies seen by the mock, in arrival order
type Seen = Arc<Mutex<Vec<String>>>;

async fn spawn_backend(router: Router) -> HttpGateway {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    HttpGateway::new(&BackendConfig {
        base_url: format!("http://{}/", addr),
        request_timeout_secs: 5,
    })
    .unwrap()
}

fn responder(path: &'static str, status: StatusCode, body: Value, seen: Seen) -> Router {
    Router::new()
        .route(
            path,
            post(move |State(seen): State<Seen>, raw: Bytes| {
                let body = body.clone();
                async move {
                    seen.lock().unwrap().push(String::from_utf8_lossy(&raw).into_owned());
                    (status, Json(body))
                }
            }),
        )
        .with_state(seen)
}

fn recording() -> AudioUnit {
    AudioUnit::from_fragments(&[AudioFrame {
        samples: vec![0, 100, -100, 0],
        sample_rate: 16000,
        channels: 1,
        timestamp_ms: 0,
    }])
    .unwrap()
}

#[tokio::test]
async fn test_initialize_sends_language_and_decodes_audio() {
    let seen = Seen::default();
    let audio = base64::engine::general_purpose::STANDARD.encode(b"ID3 fake mp3");
    let gateway = spawn_backend(responder(
        "/initialize",
        StatusCode::OK,
        json!({ "intro": "  Hallo!  ", "intro_audio": audio, "intro_audio_mime": "audio/mpeg" }),
        Arc::clone(&seen),
    ))
    .await;

    let turn = gateway.initialize("de").await.unwrap();

    assert_eq!(turn.text, "  Hallo!  ");
    let payload = turn.audio.expect("intro audio");
    assert_eq!(payload.data, b"ID3 fake mp3");
    assert_eq!(payload.mime_type, "audio/mpeg");

    let body = seen.lock().unwrap()[0].clone();
    assert!(body.contains("name=\"language\""));
    assert!(body.contains("de"));
}

#[tokio::test]
async fn test_initialize_without_intro_uses_default() {
    let gateway =
        spawn_backend(responder("/initialize", StatusCode::OK, json!({}), Seen::default())).await;

    let turn = gateway.initialize("en").await.unwrap();

    assert_eq!(turn.text, DEFAULT_INTRO_TEXT);
    assert!(turn.audio.is_none());
}

#[tokio::test]
async fn test_broken_audio_keeps_reply_text() {
    let gateway = spawn_backend(responder(
        "/send-message",
        StatusCode::OK,
        json!({ "reply": "Gerne.", "reply_audio": "%%% not base64 %%%" }),
        Seen::default(),
    ))
    .await;

    let turn = gateway.send_message("Danke").await.unwrap();

    assert_eq!(turn.text, "Gerne.");
    assert!(turn.audio.is_none());
}

#[tokio::test]
async fn test_send_message_posts_json() {
    let seen = Seen::default();
    let gateway = spawn_backend(responder(
        "/send-message",
        StatusCode::OK,
        json!({ "reply": "" }),
        Arc::clone(&seen),
    ))
    .await;

    let turn = gateway.send_message("Wie spät ist es?").await.unwrap();

    assert_eq!(turn.text, DEFAULT_REPLY_TEXT);
    let sent: Value = serde_json::from_str(&seen.lock().unwrap()[0]).unwrap();
    assert_eq!(sent, json!({ "text": "Wie spät ist es?" }));
}

#[tokio::test]
async fn test_transcribe_uploads_recording() {
    let seen = Seen::default();
    let gateway = spawn_backend(responder(
        "/upload-audio",
        StatusCode::OK,
        json!({ "transcription": "Guten Morgen" }),
        Arc::clone(&seen),
    ))
    .await;

    let text = gateway.transcribe(&recording()).await.unwrap();

    assert_eq!(text, "Guten Morgen");
    let body = seen.lock().unwrap()[0].clone();
    assert!(body.contains("name=\"audio\""));
    assert!(body.contains("filename=\"recording.wav\""));
    assert!(body.contains("audio/wav"));
    assert!(body.contains("RIFF"));
}

#[tokio::test]
async fn test_session_cookie_is_sent_after_initialize() {
    let router = Router::new()
        .route(
            "/initialize",
            post(|| async {
                (
                    [(header::SET_COOKIE, "session_id=abc; Path=/; HttpOnly")],
                    Json(json!({ "intro": "Hallo" })),
                )
            }),
        )
        .route(
            "/upload-audio",
            post(|headers: HeaderMap| async move {
                let cookie = headers
                    .get(header::COOKIE)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default();
                if cookie.contains("session_id=abc") {
                    (StatusCode::OK, Json(json!({ "transcription": "Guten Tag" })))
                } else {
                    (StatusCode::BAD_REQUEST, Json(json!({ "error": "Session not initialized." })))
                }
            }),
        );
    let gateway = spawn_backend(router).await;

    gateway.initialize("de").await.unwrap();

    assert_eq!(gateway.transcribe(&recording()).await.unwrap(), "Guten Tag");
}

#[tokio::test]
async fn test_transcribe_without_transcription_is_malformed() {
    let gateway = spawn_backend(responder(
        "/upload-audio",
        StatusCode::OK,
        json!({ "text": "wrong field" }),
        Seen::default(),
    ))
    .await;

    assert!(matches!(
        gateway.transcribe(&recording()).await,
        Err(Error::MalformedResponse(_))
    ));
}

#[tokio::test]
async fn test_server_error_is_transport_failure() {
    let gateway = spawn_backend(responder(
        "/send-message",
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "detail": "boom" }),
        Seen::default(),
    ))
    .await;

    match gateway.send_message("hello").await {
        Err(Error::Transport(reason)) => assert!(reason.contains("500")),
        other => panic!("expected transport error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_backend() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let gateway = HttpGateway::new(&BackendConfig {
        base_url: format!("http://{}", addr),
        request_timeout_secs: 2,
    })
    .unwrap();

    assert!(matches!(gateway.initialize("de").await, Err(Error::Transport(_))));
}

#[tokio::test]
async fn test_quick_replies_keep_only_strings() {
    let gateway = spawn_backend(responder(
        "/quick-replies",
        StatusCode::OK,
        json!({ "quick_replies": ["  Ja ", 42, "", "Nein", null] }),
        Seen::default(),
    ))
    .await;

    let suggestions = gateway.suggest_quick_replies("Passt das?").await.unwrap();

    assert_eq!(suggestions, vec!["Ja", "Nein"]);
}

#[tokio::test]
async fn test_quick_replies_wrong_shape_is_empty() {
    let gateway = spawn_backend(responder(
        "/quick-replies",
        StatusCode::OK,
        json!({ "quick_replies": "Ja, Nein" }),
        Seen::default(),
    ))
    .await;

    assert!(gateway.suggest_quick_replies("Passt das?").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_quick_replies_for_blank_text_skip_backend() {
    let seen = Seen::default();
    let gateway = spawn_backend(responder(
        "/quick-replies",
        StatusCode::OK,
        json!({ "quick_replies": ["Ja"] }),
        Arc::clone(&seen),
    ))
    .await;

    assert!(gateway.suggest_quick_replies("   ").await.unwrap().is_empty());
    assert!(seen.lock().unwrap().is_empty());
}
