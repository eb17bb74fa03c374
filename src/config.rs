use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

/// Tunables for one installation. Everything has a default so a missing
/// `config.json` still yields a working setup; provider keys live in the
/// credential store, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_video_width")]
    pub video_width: i32,
    #[serde(default = "default_video_height")]
    pub video_height: i32,
    #[serde(default = "default_video_fps")]
    pub video_fps: i32,

    /// Upper bound on narration length in seconds (platform short-form cap).
    #[serde(default = "default_max_duration")]
    pub max_duration: f64,

    #[serde(rename = "eleven_voice_id")]
    #[serde(default = "default_voice_id")]
    pub eleven_voice_id: String,
    #[serde(rename = "eleven_model_id")]
    #[serde(default = "default_model_id")]
    pub eleven_model_id: String,

    #[serde(default = "default_cohere_model")]
    pub cohere_model: String,

    /// Source clips eligible as backgrounds; first readable one is used.
    #[serde(default)]
    pub background_videos: Vec<String>,

    /// Optional fontfile for caption drawtext; empty uses the system default.
    #[serde(default)]
    pub caption_font: String,

    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default = "default_temp_dir")]
    pub temp_dir: String,

    #[serde(default = "default_max_batch")]
    pub max_batch: usize,

    /// Processed backgrounds older than the newest N are swept after a run.
    #[serde(default = "default_background_keep")]
    pub background_keep: usize,
}

fn default_video_width() -> i32 {
    1080
}

fn default_video_height() -> i32 {
    1920
}

fn default_video_fps() -> i32 {
    30
}

fn default_max_duration() -> f64 {
    60.0
}

fn default_voice_id() -> String {
    "21m00Tcm4TlvDq8ikWAM".to_string()
}

fn default_model_id() -> String {
    "eleven_monolingual_v1".to_string()
}

fn default_cohere_model() -> String {
    "command".to_string()
}

fn default_output_dir() -> String {
    "output".to_string()
}

fn default_temp_dir() -> String {
    "temp".to_string()
}

fn default_max_batch() -> usize {
    5
}

fn default_background_keep() -> usize {
    10
}

impl Default for Config {
    fn default() -> Self {
        serde_json::from_str("{}").expect("empty config object deserializes")
    }
}

impl Config {
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if fs::metadata(path).await.is_err() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        Ok(config)
    }

    /// First configured source clip that exists on disk.
    pub fn usable_background_source(&self) -> Option<std::path::PathBuf> {
        self.background_videos
            .iter()
            .map(std::path::PathBuf::from)
            .find(|p| p.is_file())
    }
}
