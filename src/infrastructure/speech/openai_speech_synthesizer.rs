use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;

use crate::application::ports::{SpeechError, SpeechSynthesizer};
use crate::presentation::config::SpeechSettings;

/// Text-to-speech over the OpenAI `/audio/speech` endpoint.
pub struct OpenAiSpeechSynthesizer {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    voice: String,
    format: String,
}

#[derive(Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'a str,
}

impl OpenAiSpeechSynthesizer {
    pub fn new(settings: &SpeechSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: settings.api_key.clone(),
            base_url: settings
                .base_url
                .clone()
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string())
                .trim_end_matches('/')
                .to_string(),
            model: settings.model.clone(),
            voice: settings.voice.clone(),
            format: settings.audio_format.clone(),
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAiSpeechSynthesizer {
    fn format(&self) -> &str {
        &self.format
    }

    #[tracing::instrument(skip_all, fields(model = %self.model, voice = %self.voice, chars = text.len()))]
    async fn synthesize(&self, text: &str) -> Result<Bytes, SpeechError> {
        if text.trim().is_empty() {
            return Err(SpeechError::EmptyText);
        }

        let body = SpeechRequest {
            model: &self.model,
            input: text,
            voice: &self.voice,
            response_format: &self.format,
        };

        let response = self
            .client
            .post(format!("{}/audio/speech", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| SpeechError::ApiRequestFailed(format!("request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(SpeechError::ApiRequestFailed(format!(
                "status {}: {}",
                status, body
            )));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| SpeechError::ApiRequestFailed(format!("body: {}", e)))?;

        tracing::debug!(bytes = audio.len(), "Speech synthesized");
        Ok(audio)
    }
}
