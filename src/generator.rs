use crate::api::{SpeechSynthesizer, TextGenerator};
use crate::background;
use crate::captions;
use crate::config::Config;
use crate::credentials::CredentialStore;
use crate::editor;
use crate::error::PipelineResult;
use crate::story::{self, Run, RunStore};
use crate::voice;
use crate::{logi, logok, logw};
use std::path::PathBuf;
use std::time::Duration;

const BATCH_PAUSE: Duration = Duration::from_secs(2);

/// Where a run currently stands. Strictly forward; `Failed` is terminal and
/// reachable from any step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Created,
    NarrativeReady,
    AudioReady,
    BackgroundReady,
    Composed,
    Done,
    Failed,
}

impl RunState {
    pub fn label(&self) -> &'static str {
        match self {
            RunState::Created => "created",
            RunState::NarrativeReady => "narrative-ready",
            RunState::AudioReady => "audio-ready",
            RunState::BackgroundReady => "background-ready",
            RunState::Composed => "composed",
            RunState::Done => "done",
            RunState::Failed => "failed",
        }
    }
}

/// One generation request: a fresh story in `genre`, or a continuation of an
/// existing run.
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    pub genre: Option<String>,
    pub continuation_of: Option<String>,
}

/// Both providers must have at least one key before a run can start.
pub fn check_api_keys(creds: &CredentialStore) -> bool {
    let mut ok = true;
    if creds.cohere_keys.is_empty() {
        logw("No Cohere API key found! Run the key setup first.".to_string());
        ok = false;
    }
    if creds.elevenlabs_keys.is_empty() {
        logw("No ElevenLabs API key found! Run the key setup first.".to_string());
        ok = false;
    }
    if ok {
        logok("API keys configured.".to_string());
    }
    ok
}

pub(crate) fn clamp_batch(count: usize, max_batch: usize) -> usize {
    count.clamp(1, max_batch.max(1))
}

async fn execute(
    cfg: &Config,
    creds: &mut CredentialStore,
    runs: &RunStore,
    text_model: &dyn TextGenerator,
    speech: &dyn SpeechSynthesizer,
    request: &GenerationRequest,
    state: &mut RunState,
) -> PipelineResult<(Run, PathBuf)> {
    *state = RunState::Created;

    logi("Generating story...".to_string());
    let run = match &request.continuation_of {
        Some(parent_id) => {
            story::generate_continuation(text_model, &mut creds.cohere_keys, runs, parent_id).await
        }
        None => {
            let genre = request.genre.as_deref().unwrap_or("inspiring");
            story::generate_story(text_model, &mut creds.cohere_keys, runs, genre).await
        }
    };
    // rotation order persists across runs, even after a failed step
    if let Err(err) = creds.save().await {
        logw(format!("Could not persist credential rotation: {}", err));
    }
    let run = run?;
    *state = RunState::NarrativeReady;

    logi("Generating voice...".to_string());
    let narration = voice::synthesize_narration(
        speech,
        &mut creds.elevenlabs_keys,
        cfg,
        &run.story,
        &run.video_id,
    )
    .await;
    if let Err(err) = creds.save().await {
        logw(format!("Could not persist credential rotation: {}", err));
    }
    let narration = narration?;
    *state = RunState::AudioReady;
    logok(format!(
        "Narration duration: {:.2}s (drives all downstream timing)",
        narration.duration
    ));
    if narration.duration > cfg.max_duration {
        logw(format!(
            "Narration runs {:.1}s, over the {:.0}s short-form cap; the video will be long.",
            narration.duration, cfg.max_duration
        ));
    }

    logi("Processing background video...".to_string());
    let background_path =
        background::select_background(cfg, narration.duration, Some(&run.video_id)).await?;
    *state = RunState::BackgroundReady;

    logi("Creating final video...".to_string());
    let chunks = captions::segment_story(&run.story, narration.duration);
    logi(format!("Split into {} subtitle segments", chunks.len()));

    let artifact = editor::compose(cfg, &narration, &background_path, &chunks, &run.video_id).await?;
    *state = RunState::Composed;

    background::sweep_old_backgrounds(cfg.background_keep).await;

    *state = RunState::Done;
    Ok((run, artifact))
}

/// Run one full generation request. Any step failure aborts the run: the
/// failing step is logged and no artifact is returned.
pub async fn generate_video(
    cfg: &Config,
    creds: &mut CredentialStore,
    runs: &RunStore,
    text_model: &dyn TextGenerator,
    speech: &dyn SpeechSynthesizer,
    request: &GenerationRequest,
) -> Option<PathBuf> {
    let mut state = RunState::Created;
    match execute(cfg, creds, runs, text_model, speech, request, &mut state).await {
        Ok((run, artifact)) => {
            logok(format!(
                "Run {} complete: {}",
                run.video_id,
                artifact.display()
            ));
            Some(artifact)
        }
        Err(err) => {
            let failed_during = state.label();
            state = RunState::Failed;
            logw(format!(
                "Run {} (during '{}'): {}",
                state.label(),
                failed_during,
                err
            ));
            None
        }
    }
}

/// Sequential batch: one request at a time with a short pause between runs,
/// reporting the subset that made it to a final artifact.
pub async fn generate_batch(
    cfg: &Config,
    creds: &mut CredentialStore,
    runs: &RunStore,
    text_model: &dyn TextGenerator,
    speech: &dyn SpeechSynthesizer,
    count: usize,
    genre: Option<String>,
) -> Vec<PathBuf> {
    let count = clamp_batch(count, cfg.max_batch);
    logi(format!("Starting batch generation of {} videos...", count));

    if !check_api_keys(creds) {
        return Vec::new();
    }

    let request = GenerationRequest {
        genre,
        continuation_of: None,
    };

    let mut successful = Vec::new();
    for i in 0..count {
        logi(format!("--- Generating Video {}/{} ---", i + 1, count));
        if let Some(path) = generate_video(cfg, creds, runs, text_model, speech, &request).await {
            successful.push(path);
        }
        if i + 1 < count {
            tokio::time::sleep(BATCH_PAUSE).await;
        }
    }

    logok(format!(
        "Batch complete! {}/{} videos created successfully.",
        successful.len(),
        count
    ));
    successful
}
