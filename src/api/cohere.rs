use crate::api::{ProviderError, TextGenerator, TextRequest};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::warn;

const GENERATE_URL: &str = "https://api.cohere.ai/v1/generate";

pub struct CohereClient {
    client: Client,
    model: String,
}

impl CohereClient {
    pub fn new(client: Client, model: String) -> Self {
        Self { client, model }
    }
}

fn extract_generation_text(raw: &str) -> Option<String> {
    let root: serde_json::Value = serde_json::from_str(raw).ok()?;

    if let Some(msg) = root.get("message").and_then(|v| v.as_str()) {
        warn!("Cohere error message: {}", msg);
    }

    let generations = root.get("generations")?.as_array()?;
    let text = generations.first()?.get("text")?.as_str()?;
    Some(text.trim().to_string())
}

#[async_trait]
impl TextGenerator for CohereClient {
    async fn generate(
        &self,
        api_key: &str,
        request: &TextRequest,
    ) -> Result<String, ProviderError> {
        let body = json!({
            "model": self.model,
            "prompt": request.prompt,
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
            "k": 0,
            "stop_sequences": request.stop_sequences,
            "return_likelihoods": "NONE",
        });

        let resp = self
            .client
            .post(GENERATE_URL)
            .bearer_auth(api_key)
            .json(&body)
            .timeout(std::time::Duration::from_secs(120))
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = resp.status();
        let raw = resp.text().await.unwrap_or_default();

        if !status.is_success() {
            let snippet = raw.chars().take(400).collect::<String>();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body: snippet,
            });
        }

        match extract_generation_text(&raw) {
            Some(text) if !text.is_empty() => Ok(text),
            _ => Err(ProviderError::Empty),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_text_is_extracted_and_trimmed() {
        let raw = r#"{"generations":[{"text":"  A story begins.  "}]}"#;
        assert_eq!(
            extract_generation_text(raw),
            Some("A story begins.".to_string())
        );
    }

    #[test]
    fn malformed_payload_yields_none() {
        assert_eq!(extract_generation_text("not json"), None);
        assert_eq!(extract_generation_text(r#"{"generations":[]}"#), None);
        assert_eq!(extract_generation_text(r#"{"message":"bad key"}"#), None);
    }
}
