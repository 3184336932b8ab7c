use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, error, info};

use super::messages::{
    AssistantTurn, InitializeResponse, QuickReplyResponse, SendMessageResponse, TextRequest,
    TranscribeResponse,
};
use super::Gateway;
use crate::audio::AudioUnit;
use crate::config::BackendConfig;
use crate::error::{Error, Result};

/// Gateway talking to the conversation backend over HTTP
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        // The backend keys its conversation on the session cookie set by /initialize
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .cookie_store(true)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;

        info!("Conversation backend at {}", config.base_url);

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn decode<T: DeserializeOwned>(
        operation: &str,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        debug!("{} responded with {}", operation, status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("{} failed with status {}: {}", operation, status, body);
            return Err(Error::Transport(format!("{} returned {}", operation, status)));
        }

        let body = response.bytes().await.map_err(|e| {
            error!("{} body could not be read: {}", operation, e);
            Error::Transport(e.to_string())
        })?;

        serde_json::from_slice(&body).map_err(|e| {
            error!("{} returned an invalid payload: {}", operation, e);
            Error::MalformedResponse(format!("{}: {}", operation, e))
        })
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        path: &str,
        text: &str,
    ) -> Result<T> {
        let response = self
            .client
            .post(self.url(path))
            .json(&TextRequest {
                text: text.to_string(),
            })
            .send()
            .await
            .map_err(|e| {
                error!("{} request failed: {}", operation, e);
                Error::Transport(e.to_string())
            })?;

        Self::decode(operation, response).await
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn initialize(&self, language: &str) -> Result<AssistantTurn> {
        let form = reqwest::multipart::Form::new().text("language", language.to_string());

        let response = self
            .client
            .post(self.url("initialize"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                error!("initialize request failed: {}", e);
                Error::Transport(e.to_string())
            })?;

        let body: InitializeResponse = Self::decode("initialize", response).await?;
        Ok(body.into_turn())
    }

    async fn transcribe(&self, audio: &AudioUnit) -> Result<String> {
        debug!("Uploading {} bytes of {} for transcription", audio.data.len(), audio.mime_type);

        let part = reqwest::multipart::Part::bytes(audio.data.clone())
            .file_name(audio.file_name.clone())
            .mime_str(&audio.mime_type)
            .map_err(|e| Error::Transport(format!("invalid audio MIME type: {}", e)))?;
        let form = reqwest::multipart::Form::new().part("audio", part);

        let response = self
            .client
            .post(self.url("upload-audio"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                error!("upload-audio request failed: {}", e);
                Error::Transport(e.to_string())
            })?;

        let body: TranscribeResponse = Self::decode("upload-audio", response).await?;
        Ok(body.transcription)
    }

    async fn send_message(&self, text: &str) -> Result<AssistantTurn> {
        let body: SendMessageResponse = self.post_json("send-message", "send-message", text).await?;
        Ok(body.into_turn())
    }

    async fn suggest_quick_replies(&self, text: &str) -> Result<Vec<String>> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let body: QuickReplyResponse =
            self.post_json("quick-replies", "quick-replies", text).await?;
        Ok(body.into_suggestions())
    }
}
