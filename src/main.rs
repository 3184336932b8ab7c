use anyhow::{Context, Result};
use clap::Parser;
use loqa_voice_chat::audio::{
    AudioBackendConfig, AudioBackendFactory, AudioSource, SimulatedPlayback,
};
use loqa_voice_chat::{create_router, AppState, Config, HttpGateway, SessionController, UiEvent};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "loqa-voice-chat")]
#[command(about = "Voice chat session with review-before-send")]
struct Args {
    /// Config file (without extension)
    #[arg(short, long, default_value = "config/loqa-voice-chat")]
    config: String,

    /// Session language code, e.g. "de" or "en"
    #[arg(short, long)]
    language: Option<String>,

    /// Conversation backend base URL
    #[arg(long)]
    backend_url: Option<String>,

    /// WAV file to use as the microphone
    #[arg(short, long)]
    input_file: Option<PathBuf>,

    /// Port of the local control API
    #[arg(short, long)]
    port: Option<u16>,
}

impl Args {
    fn apply(self, cfg: &mut Config) {
        if let Some(language) = self.language {
            cfg.session.language = language;
        }
        if let Some(url) = self.backend_url {
            cfg.backend.base_url = url;
        }
        if let Some(path) = self.input_file {
            cfg.audio.input_file = Some(path);
        }
        if let Some(port) = self.port {
            cfg.service.http.port = port;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    let args = Args::parse();
    let mut cfg = Config::load(&args.config)?;
    args.apply(&mut cfg);

    info!("Loqa Voice Chat v{}", env!("CARGO_PKG_VERSION"));
    info!("Backend: {}", cfg.backend.base_url);

    let gateway = Arc::new(HttpGateway::new(&cfg.backend)?);

    let source = AudioSource::from_config(&cfg.audio);
    if matches!(source, AudioSource::Unavailable) {
        warn!("No audio input configured, recording will be reported as unsupported");
    }
    let backend = AudioBackendFactory::create(source, AudioBackendConfig::from(&cfg.audio));

    let controller = Arc::new(SessionController::new(
        &cfg,
        gateway,
        Arc::from(backend),
        Arc::new(SimulatedPlayback),
    ));

    tokio::spawn(log_ui_events(controller.subscribe()));

    let app = create_router(AppState::new(Arc::clone(&controller)));
    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind control API to {}", addr))?;

    info!("Control API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown requested");
        })
        .await
        .context("Control API server error")?;

    controller.shutdown().await;
    info!("Goodbye");

    Ok(())
}

/// Headless renderer: mirror session events into the log
async fn log_ui_events(mut events: broadcast::Receiver<UiEvent>) {
    loop {
        match events.recv().await {
            Ok(UiEvent::MessageAppended(message)) => {
                let audio = if message.has_audio() { " [audio]" } else { "" };
                info!("{:?}: {}{}", message.role, message.content, audio);
            }
            Ok(UiEvent::StatusChanged(status)) => info!("Status: {}", status),
            Ok(UiEvent::QuickRepliesChanged(labels)) if !labels.is_empty() => {
                info!("Quick replies: {}", labels.join(" | "));
            }
            Ok(UiEvent::PlaybackChanged { message_id, state }) => {
                info!("Message #{}: {}", message_id, state.label());
            }
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(n)) => warn!("Skipped {} UI events", n),
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
