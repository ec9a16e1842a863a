use async_trait::async_trait;
use reqwest::multipart;

use crate::application::ports::{TranscriptionEngine, TranscriptionError};
use crate::presentation::config::TranscriptionSettings;

/// Candidate answer transcription via `/audio/transcriptions`.
pub struct OpenAiWhisperEngine {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiWhisperEngine {
    pub fn new(settings: &TranscriptionSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: settings.api_key.clone(),
            base_url: settings
                .base_url
                .clone()
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string())
                .trim_end_matches('/')
                .to_string(),
            model: settings
                .model
                .clone()
                .unwrap_or_else(|| "whisper-1".to_string()),
        }
    }
}

/// Guesses container type from magic bytes so the API gets a sensible
/// file name.
fn sniff_audio(data: &[u8]) -> Result<(&'static str, &'static str), TranscriptionError> {
    match data {
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'A', b'V', b'E', ..] => {
            Ok(("audio.wav", "audio/wav"))
        }
        [b'O', b'g', b'g', b'S', ..] => Ok(("audio.ogg", "audio/ogg")),
        [0x1A, 0x45, 0xDF, 0xA3, ..] => Ok(("audio.webm", "audio/webm")),
        [b'I', b'D', b'3', ..] | [0xFF, 0xFB | 0xF3 | 0xF2, ..] => {
            Ok(("audio.mp3", "audio/mpeg"))
        }
        [_, _, _, _, b'f', b't', b'y', b'p', ..] => Ok(("audio.m4a", "audio/mp4")),
        [] => Err(TranscriptionError::UnsupportedFormat(
            "empty audio".to_string(),
        )),
        _ => Ok(("audio.wav", "audio/wav")),
    }
}

#[async_trait]
impl TranscriptionEngine for OpenAiWhisperEngine {
    #[tracing::instrument(skip_all, fields(model = %self.model, bytes = audio_data.len()))]
    async fn transcribe(&self, audio_data: &[u8]) -> Result<String, TranscriptionError> {
        let url = format!("{}/audio/transcriptions", self.base_url);
        let (file_name, mime) = sniff_audio(audio_data)?;

        let file_part = multipart::Part::bytes(audio_data.to_vec())
            .file_name(file_name)
            .mime_str(mime)
            .map_err(|e| TranscriptionError::ApiRequestFailed(format!("mime: {}", e)))?;

        let form = multipart::Form::new()
            .text("model", self.model.clone())
            .text("response_format", "text")
            .part("file", file_part);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| TranscriptionError::ApiRequestFailed(format!("request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(TranscriptionError::TranscriptionFailed(format!(
                "status {}: {}",
                status, body
            )));
        }

        let transcript = response
            .text()
            .await
            .map_err(|e| TranscriptionError::ApiRequestFailed(format!("body: {}", e)))?;

        tracing::info!(chars = transcript.len(), "Answer audio transcribed");
        Ok(transcript.trim().to_string())
    }
}
