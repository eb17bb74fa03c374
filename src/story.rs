use crate::api::{TextGenerator, TextRequest};
use crate::credentials::KeyRing;
use crate::error::{PipelineError, PipelineResult};
use crate::prompts;
use crate::text::{clean_story_text, derive_title};
use crate::{logi, logok, logw};
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::fs;

pub const SCRIPTS_DIR: &str = "scripts";

const MAX_TOKENS: u32 = 800;
const TEMPERATURE: f64 = 0.8;

fn now_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// One persisted generation run. Immutable once written; continuations
/// reference their parent through `original_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub video_id: String,
    pub genre: String,
    pub story: String,
    pub title: String,
    pub date: String,
    #[serde(default)]
    pub hook_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_id: Option<String>,
    #[serde(default)]
    pub is_continuation: bool,
}

/// Short unique run token: first 8 hex chars of a v4 UUID.
pub fn new_video_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// On-disk home of run records, one JSON file per run.
pub struct RunStore {
    dir: PathBuf,
}

impl RunStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub async fn save(&self, run: &Run) -> PipelineResult<PathBuf> {
        fs::create_dir_all(&self.dir).await?;
        let filename = format!(
            "script_{}_{}.json",
            run.video_id,
            chrono::Utc::now().timestamp()
        );
        let path = self.dir.join(filename);
        let content = serde_json::to_string_pretty(run)?;
        fs::write(&path, content).await?;
        logi(format!("Script saved: {}", path.display()));
        Ok(path)
    }

    pub async fn load_by_id(&self, video_id: &str) -> PipelineResult<Option<Run>> {
        if fs::metadata(&self.dir).await.is_err() {
            return Ok(None);
        }

        let mut entries = fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Ok(content) = fs::read_to_string(&path).await else {
                continue;
            };
            let Ok(run) = serde_json::from_str::<Run>(&content) else {
                logw(format!("Skipping unreadable run record: {}", path.display()));
                continue;
            };
            if run.video_id == video_id {
                return Ok(Some(run));
            }
        }

        Ok(None)
    }

    /// All readable run records, newest first by file modification time.
    pub async fn list(&self) -> PipelineResult<Vec<Run>> {
        if fs::metadata(&self.dir).await.is_err() {
            return Ok(Vec::new());
        }

        let mut runs: Vec<(std::time::SystemTime, Run)> = Vec::new();
        let mut entries = fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Ok(content) = fs::read_to_string(&path).await else {
                continue;
            };
            let Ok(run) = serde_json::from_str::<Run>(&content) else {
                continue;
            };
            let modified = entry
                .metadata()
                .await
                .and_then(|m| m.modified())
                .unwrap_or(UNIX_EPOCH);
            runs.push((modified, run));
        }

        runs.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(runs.into_iter().map(|(_, run)| run).collect())
    }
}

/// One generation attempt per configured key, failed key rotated to the
/// back. Empty output is retried through rotation like any provider failure.
async fn generate_with_rotation(
    generator: &dyn TextGenerator,
    ring: &mut KeyRing,
    prompt: String,
) -> PipelineResult<String> {
    if ring.is_empty() {
        return Err(PipelineError::Configuration { provider: "cohere" });
    }

    let request = TextRequest {
        prompt,
        max_tokens: MAX_TOKENS,
        temperature: TEMPERATURE,
        stop_sequences: Vec::new(),
    };

    let attempts = ring.len();
    let mut last_error = String::new();
    for attempt in 1..=attempts {
        let key = ring
            .current()
            .expect("non-empty ring has a current key")
            .to_string();

        match generator.generate(&key, &request).await {
            Ok(text) if !text.trim().is_empty() => return Ok(text),
            Ok(_) => {
                last_error = "empty generation".to_string();
            }
            Err(err) => {
                last_error = err.to_string();
            }
        }

        logw(format!(
            "Story generation failed (attempt {}/{}): {}",
            attempt, attempts, last_error
        ));
        ring.rotate();
    }

    Err(PipelineError::Provider {
        provider: "cohere",
        attempts,
        message: last_error,
    })
}

/// Generate a fresh story for `genre` and persist the Run record.
pub async fn generate_story(
    generator: &dyn TextGenerator,
    ring: &mut KeyRing,
    store: &RunStore,
    genre: &str,
) -> PipelineResult<Run> {
    let templates = prompts::templates_for(genre);
    let mut rng = rand::rngs::StdRng::seed_from_u64(now_seed());
    let template = templates[rng.gen_range(0..templates.len())];

    let full_prompt = format!("{}\n\n{}", prompts::hook_instruction(genre), template);
    logi(format!("Generating {} story with engaging hook...", genre));

    let raw = generate_with_rotation(generator, ring, full_prompt).await?;
    let story = clean_story_text(&raw);

    let run = Run {
        video_id: new_video_id(),
        genre: genre.to_string(),
        title: derive_title(&story),
        date: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        hook_type: prompts::hook_type(genre).to_string(),
        story,
        original_id: None,
        is_continuation: false,
    };

    store.save(&run).await?;
    logok(format!("Story generated successfully! ID: {}", run.video_id));
    Ok(run)
}

/// Generate the next part of an existing story. The parent record must exist
/// before any generation happens; an unknown id never leaves a partial
/// record behind.
pub async fn generate_continuation(
    generator: &dyn TextGenerator,
    ring: &mut KeyRing,
    store: &RunStore,
    continuation_id: &str,
) -> PipelineResult<Run> {
    let parent = store
        .load_by_id(continuation_id)
        .await?
        .ok_or_else(|| PipelineError::RunNotFound(continuation_id.to_string()))?;

    logi(format!("Generating continuation of {} story...", parent.genre));
    let prompt = prompts::continuation_prompt(&parent.genre, &parent.story);
    let raw = generate_with_rotation(generator, ring, prompt).await?;
    let story = clean_story_text(&raw);

    let run = Run {
        video_id: new_video_id(),
        genre: parent.genre.clone(),
        title: format!("Continuation: {}", parent.title),
        date: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        hook_type: String::new(),
        story,
        original_id: Some(parent.video_id.clone()),
        is_continuation: true,
    };

    store.save(&run).await?;
    logok(format!(
        "Continuation generated successfully! ID: {}",
        run.video_id
    ));
    Ok(run)
}
