use async_trait::async_trait;
use thiserror::Error;

pub mod cohere;
pub mod elevenlabs;

/// A single failed provider call. Rotation policy upstream decides whether to
/// retry with another key.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("empty response")]
    Empty,
}

#[derive(Debug, Clone)]
pub struct TextRequest {
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub stop_sequences: Vec<String>,
}

/// Text-generation collaborator. One call, one key; no retry logic here.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, api_key: &str, request: &TextRequest)
        -> Result<String, ProviderError>;
}

#[derive(Debug, Clone)]
pub struct SpeechRequest {
    pub text: String,
    pub voice_id: String,
    pub model_id: String,
    pub stability: f64,
    pub similarity_boost: f64,
}

/// Speech-synthesis collaborator returning the raw audio payload.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(
        &self,
        api_key: &str,
        request: &SpeechRequest,
    ) -> Result<Vec<u8>, ProviderError>;
}
