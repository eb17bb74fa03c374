use crate::api::{ProviderError, SpeechRequest, SpeechSynthesizer};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

const TTS_BASE: &str = "https://api.elevenlabs.io/v1/text-to-speech";

pub struct ElevenLabsClient {
    client: Client,
}

impl ElevenLabsClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsClient {
    async fn synthesize(
        &self,
        api_key: &str,
        request: &SpeechRequest,
    ) -> Result<Vec<u8>, ProviderError> {
        let url = format!(
            "{}/{}?output_format=mp3_44100_128",
            TTS_BASE, request.voice_id
        );

        let body = json!({
            "text": request.text,
            "model_id": request.model_id,
            "voice_settings": {
                "stability": request.stability,
                "similarity_boost": request.similarity_boost,
            },
        });

        let resp = self
            .client
            .post(url)
            .header("Accept", "audio/mpeg")
            .header("Content-Type", "application/json")
            .header("xi-api-key", api_key)
            .json(&body)
            .timeout(std::time::Duration::from_secs(300))
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let raw = resp.text().await.unwrap_or_default();
            let snippet = raw.chars().take(400).collect::<String>();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body: snippet,
            });
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;
        if bytes.is_empty() {
            return Err(ProviderError::Empty);
        }

        Ok(bytes.to_vec())
    }
}
