use async_trait::async_trait;
use bytes::Bytes;

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// File extension of the audio this synthesizer produces.
    fn format(&self) -> &str;

    async fn synthesize(&self, text: &str) -> Result<Bytes, SpeechError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    #[error("api request failed: {0}")]
    ApiRequestFailed(String),
    #[error("empty text")]
    EmptyText,
}
