use crate::api::{ProviderError, SpeechRequest, SpeechSynthesizer};
use crate::config::Config;
use crate::credentials::KeyRing;
use crate::error::{PipelineError, PipelineResult};
use crate::ffmpeg;
use crate::text::clean_story_text;
use crate::{logi, logok, logw};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Rendered narration track. Its probed duration is the authoritative target
/// for every downstream stage of the run.
#[derive(Debug, Clone)]
pub struct AudioArtifact {
    pub path: PathBuf,
    pub duration: f64,
}

pub fn voice_filename(video_id: &str) -> String {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    format!("voice_{}_{}.mp3", video_id, timestamp)
}

/// Request the narration audio, rotating through the configured keys on
/// provider failure: one attempt per key, failed key to the back. An empty
/// audio payload fails immediately without rotation.
pub async fn request_narration(
    synth: &dyn SpeechSynthesizer,
    ring: &mut KeyRing,
    cfg: &Config,
    text: &str,
) -> PipelineResult<Vec<u8>> {
    if ring.is_empty() {
        return Err(PipelineError::Configuration {
            provider: "elevenlabs",
        });
    }

    let cleaned = clean_story_text(text);
    let request = SpeechRequest {
        text: cleaned.clone(),
        voice_id: cfg.eleven_voice_id.clone(),
        model_id: cfg.eleven_model_id.clone(),
        stability: 0.5,
        similarity_boost: 0.5,
    };

    logi(format!(
        "Generating voice for {} characters...",
        cleaned.chars().count()
    ));

    let attempts = ring.len();
    let mut last_error = String::new();
    for attempt in 1..=attempts {
        let key = ring
            .current()
            .expect("non-empty ring has a current key")
            .to_string();

        match synth.synthesize(&key, &request).await {
            Ok(bytes) => return Ok(bytes),
            Err(ProviderError::Empty) => {
                return Err(PipelineError::Content(
                    "speech synthesis returned no audio".to_string(),
                ));
            }
            Err(err) => {
                last_error = err.to_string();
                logw(format!(
                    "Voice generation failed (attempt {}/{}): {}",
                    attempt, attempts, last_error
                ));
                ring.rotate();
            }
        }
    }

    Err(PipelineError::Provider {
        provider: "elevenlabs",
        attempts,
        message: last_error,
    })
}

/// Full synthesis step: fetch audio, persist it under a run-unique name, and
/// probe its duration.
pub async fn synthesize_narration(
    synth: &dyn SpeechSynthesizer,
    ring: &mut KeyRing,
    cfg: &Config,
    text: &str,
    video_id: &str,
) -> PipelineResult<AudioArtifact> {
    let bytes = request_narration(synth, ring, cfg, text).await?;

    fs::create_dir_all(&cfg.temp_dir).await?;
    let path = Path::new(&cfg.temp_dir).join(voice_filename(video_id));
    fs::write(&path, &bytes).await?;
    logok(format!("Voice generated successfully: {}", path.display()));

    let duration = ffmpeg::ffprobe_duration_seconds(&path)
        .await
        .map_err(|e| PipelineError::Content(format!("could not read narration duration: {}", e)))?;

    Ok(AudioArtifact { path, duration })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailingSynth {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SpeechSynthesizer for FailingSynth {
        async fn synthesize(
            &self,
            _api_key: &str,
            _request: &SpeechRequest,
        ) -> Result<Vec<u8>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(ProviderError::Status {
                status: 500,
                body: "server error".to_string(),
            })
        }
    }

    struct EmptySynth;

    #[async_trait]
    impl SpeechSynthesizer for EmptySynth {
        async fn synthesize(
            &self,
            _api_key: &str,
            _request: &SpeechRequest,
        ) -> Result<Vec<u8>, ProviderError> {
            Err(ProviderError::Empty)
        }
    }

    struct RecordingSynth {
        keys_seen: std::sync::Mutex<Vec<String>>,
        fail_first: usize,
    }

    #[async_trait]
    impl SpeechSynthesizer for RecordingSynth {
        async fn synthesize(
            &self,
            api_key: &str,
            _request: &SpeechRequest,
        ) -> Result<Vec<u8>, ProviderError> {
            let mut seen = self.keys_seen.lock().unwrap();
            seen.push(api_key.to_string());
            if seen.len() <= self.fail_first {
                return Err(ProviderError::Transport("connection reset".to_string()));
            }
            Ok(vec![1, 2, 3])
        }
    }

    fn two_key_ring() -> KeyRing {
        KeyRing::new(vec!["first".to_string(), "second".to_string()])
    }

    #[tokio::test]
    async fn exhausting_all_keys_surfaces_provider_error() {
        let synth = FailingSynth {
            calls: AtomicUsize::new(0),
        };
        let mut ring = two_key_ring();
        let cfg = Config::default();

        let err = request_narration(&synth, &mut ring, &cfg, "A story.")
            .await
            .unwrap_err();

        match err {
            PipelineError::Provider {
                provider, attempts, ..
            } => {
                assert_eq!(provider, "elevenlabs");
                assert_eq!(attempts, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
        // exactly one attempt per key, no infinite loop
        assert_eq!(synth.calls.load(Ordering::SeqCst), 2);
        // full rotation restored the original order
        assert_eq!(ring.current(), Some("first"));
    }

    #[tokio::test]
    async fn empty_audio_fails_without_rotation() {
        let mut ring = two_key_ring();
        let cfg = Config::default();

        let err = request_narration(&EmptySynth, &mut ring, &cfg, "A story.")
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Content(_)));
        assert_eq!(ring.current(), Some("first"));
    }

    #[tokio::test]
    async fn second_key_rescues_a_transient_failure() {
        let synth = RecordingSynth {
            keys_seen: std::sync::Mutex::new(Vec::new()),
            fail_first: 1,
        };
        let mut ring = two_key_ring();
        let cfg = Config::default();

        let bytes = request_narration(&synth, &mut ring, &cfg, "A story.")
            .await
            .unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);

        let seen = synth.keys_seen.lock().unwrap();
        assert_eq!(seen.as_slice(), ["first", "second"]);
        // failed key stays deprioritized for subsequent runs
        assert_eq!(ring.current(), Some("second"));
    }

    #[tokio::test]
    async fn missing_keys_are_a_configuration_error() {
        let mut ring = KeyRing::default();
        let cfg = Config::default();

        let err = request_narration(&EmptySynth, &mut ring, &cfg, "A story.")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Configuration {
                provider: "elevenlabs"
            }
        ));
    }

    #[test]
    fn voice_filenames_embed_run_id_and_timestamp() {
        let name = voice_filename("ab12cd34");
        assert!(name.starts_with("voice_ab12cd34_"));
        assert!(name.ends_with(".mp3"));
        // timestamp to the second: voice_<id>_YYYYmmdd_HHMMSS.mp3
        let stamp = name
            .trim_start_matches("voice_ab12cd34_")
            .trim_end_matches(".mp3");
        assert_eq!(stamp.len(), 15);
    }
}
