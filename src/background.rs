use crate::config::Config;
use crate::error::{PipelineError, PipelineResult};
use crate::ffmpeg;
use crate::{logi, logok, logw};
use rand::{Rng, SeedableRng};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use tokio::fs;

pub const BACKGROUNDS_DIR: &str = "assets/backgrounds";
const BACKGROUND_PREFIX: &str = "processed_background_";

/// Segment of the source clip to lift: `dur = min(target, source)`, start
/// drawn uniformly from the feasible range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentPlan {
    pub start: f64,
    pub dur: f64,
}

/// Stable seed derived from an output filename: same name, same random
/// choices; distinct names diverge.
pub fn seed_from_name(name: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    name.hash(&mut hasher);
    hasher.finish()
}

pub fn plan_segment(source_dur: f64, target_dur: f64, seed: u64) -> SegmentPlan {
    let dur = target_dur.min(source_dur);
    let max_start = (source_dur - dur).max(0.0);

    let start = if max_start > 0.0 {
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        rng.gen_range(0.0..max_start)
    } else {
        0.0
    };

    SegmentPlan { start, dur }
}

/// Center-crop to the target aspect ratio, then scale to exact target pixels.
/// Comparison is done with integer cross-multiplication to avoid float
/// aspect drift.
pub fn crop_scale_filter(src_w: i32, src_h: i32, target_w: i32, target_h: i32) -> String {
    let src_ratio = src_w as i64 * target_h as i64;
    let dst_ratio = target_w as i64 * src_h as i64;

    let scale = format!("scale={}:{}", target_w, target_h);
    if src_ratio > dst_ratio {
        // wider than target: crop width
        let new_w = (src_h as i64 * target_w as i64 / target_h as i64) as i32;
        let x = (src_w - new_w) / 2;
        format!("crop={}:{}:{}:0,{}", new_w, src_h, x, scale)
    } else if src_ratio < dst_ratio {
        // taller than target: crop height
        let new_h = (src_w as i64 * target_h as i64 / target_w as i64) as i32;
        let y = (src_h - new_h) / 2;
        format!("crop={}:{}:0:{},{}", src_w, new_h, y, scale)
    } else {
        scale
    }
}

pub fn background_filename(video_id: Option<&str>) -> String {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S_%3f");
    match video_id {
        Some(id) => format!("{}{}_{}.mp4", BACKGROUND_PREFIX, id, timestamp),
        None => format!("{}{}.mp4", BACKGROUND_PREFIX, timestamp),
    }
}

fn flat_color_from_seed(seed: u64) -> String {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    format!(
        "0x{:02X}{:02X}{:02X}",
        rng.gen_range(0u8..=255),
        rng.gen_range(0u8..=255),
        rng.gen_range(0u8..=255)
    )
}

/// Ordered fallback ladder for producing a background.
#[derive(Debug, Clone)]
enum BackgroundSource {
    Clip(PathBuf),
    Procedural,
    FlatColor,
}

impl BackgroundSource {
    fn describe(&self) -> String {
        match self {
            BackgroundSource::Clip(path) => format!("source clip {}", path.display()),
            BackgroundSource::Procedural => "procedural gradient".to_string(),
            BackgroundSource::FlatColor => "flat color".to_string(),
        }
    }
}

/// Derive a background segment of exactly `target_duration` seconds, writing
/// a fresh uniquely-named file. Strategies are tried in order with isolated
/// failure handling; only when every rung fails does the run fail.
pub async fn select_background(
    cfg: &Config,
    target_duration: f64,
    video_id: Option<&str>,
) -> PipelineResult<PathBuf> {
    fs::create_dir_all(BACKGROUNDS_DIR).await?;

    let filename = background_filename(video_id);
    let dest = Path::new(BACKGROUNDS_DIR).join(&filename);
    let seed = seed_from_name(&filename);

    let mut candidates = Vec::new();
    if let Some(source) = cfg.usable_background_source() {
        candidates.push(BackgroundSource::Clip(source));
    } else {
        logi("No usable source clip configured; using generated background.");
    }
    candidates.push(BackgroundSource::Procedural);
    candidates.push(BackgroundSource::FlatColor);

    for candidate in candidates {
        match render_candidate(cfg, &candidate, target_duration, seed, &dest).await {
            Ok(true) => {
                logok(format!(
                    "Background ready ({}): {}",
                    candidate.describe(),
                    dest.display()
                ));
                return Ok(dest);
            }
            Ok(false) => {
                logw(format!("Background attempt produced no file: {}", candidate.describe()));
            }
            Err(err) => {
                logw(format!(
                    "Background attempt failed ({}): {}",
                    candidate.describe(),
                    err
                ));
            }
        }
    }

    Err(PipelineError::Render(
        "all background strategies failed".to_string(),
    ))
}

async fn render_candidate(
    cfg: &Config,
    candidate: &BackgroundSource,
    target_duration: f64,
    seed: u64,
    dest: &Path,
) -> anyhow::Result<bool> {
    match candidate {
        BackgroundSource::Clip(source) => {
            let source_dur = ffmpeg::ffprobe_duration_seconds(source).await?;
            let (src_w, src_h) = ffmpeg::ffprobe_video_dimensions(source).await?;

            let plan = plan_segment(source_dur, target_duration, seed);
            let filter = crop_scale_filter(src_w, src_h, cfg.video_width, cfg.video_height);

            logi(format!(
                "Extracting background segment {:.1}s..{:.1}s from {}",
                plan.start,
                plan.start + plan.dur,
                source.display()
            ));
            ffmpeg::ffmpeg_extract_segment(
                source,
                plan.start,
                plan.dur,
                &filter,
                cfg.video_fps,
                dest,
            )
            .await
        }
        BackgroundSource::Procedural => {
            ffmpeg::ffmpeg_gradient_clip(
                cfg.video_width,
                cfg.video_height,
                cfg.video_fps,
                target_duration,
                seed,
                dest,
            )
            .await
        }
        BackgroundSource::FlatColor => {
            let color = flat_color_from_seed(seed);
            ffmpeg::ffmpeg_color_clip(
                &color,
                cfg.video_width,
                cfg.video_height,
                cfg.video_fps,
                target_duration,
                dest,
            )
            .await
        }
    }
}

/// Best-effort retention sweep: keep the newest `keep` processed backgrounds,
/// remove the rest. Never fails the calling run.
pub async fn sweep_old_backgrounds(keep: usize) {
    let mut entries = match fs::read_dir(BACKGROUNDS_DIR).await {
        Ok(entries) => entries,
        Err(_) => return,
    };

    let mut backgrounds: Vec<(std::time::SystemTime, PathBuf)> = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if !name.starts_with(BACKGROUND_PREFIX) || !name.ends_with(".mp4") {
            continue;
        }
        if let Ok(meta) = entry.metadata().await {
            if let Ok(modified) = meta.modified() {
                backgrounds.push((modified, path));
            }
        }
    }

    if backgrounds.len() <= keep {
        return;
    }

    backgrounds.sort_by_key(|(modified, _)| *modified);
    let excess = backgrounds.len() - keep;
    for (_, path) in backgrounds.into_iter().take(excess) {
        if fs::remove_file(&path).await.is_ok() {
            logi(format!("Cleaned up old background: {}", path.display()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_duration_is_min_of_target_and_source() {
        let plan = plan_segment(120.0, 42.0, 7);
        assert_eq!(plan.dur, 42.0);
        assert!(plan.start >= 0.0 && plan.start <= 120.0 - 42.0);

        let plan = plan_segment(20.0, 42.0, 7);
        assert_eq!(plan.dur, 20.0);
        assert_eq!(plan.start, 0.0);
    }

    #[test]
    fn equal_durations_start_at_zero() {
        let plan = plan_segment(42.0, 42.0, 99);
        assert_eq!(plan.start, 0.0);
        assert_eq!(plan.dur, 42.0);
    }

    #[test]
    fn same_seed_reproduces_the_same_plan() {
        let a = plan_segment(300.0, 60.0, 1234);
        let b = plan_segment(300.0, 60.0, 1234);
        assert_eq!(a, b);
    }

    #[test]
    fn different_names_give_different_seeds() {
        let a = seed_from_name("processed_background_ab12_1.mp4");
        let b = seed_from_name("processed_background_cd34_2.mp4");
        assert_ne!(a, b);
        assert_eq!(a, seed_from_name("processed_background_ab12_1.mp4"));
    }

    #[test]
    fn wide_source_crops_width() {
        // 1920x1080 source onto a 1080x1920 portrait target
        let filter = crop_scale_filter(1920, 1080, 1080, 1920);
        assert_eq!(filter, "crop=607:1080:656:0,scale=1080:1920");
    }

    #[test]
    fn tall_source_crops_height() {
        // 1080x4000 source is taller than 9:16
        let filter = crop_scale_filter(1080, 4000, 1080, 1920);
        assert_eq!(filter, "crop=1080:1920:0:1040,scale=1080:1920");
    }

    #[test]
    fn matching_ratio_only_scales() {
        let filter = crop_scale_filter(540, 960, 1080, 1920);
        assert_eq!(filter, "scale=1080:1920");
    }

    #[test]
    fn filenames_embed_the_run_id() {
        let name = background_filename(Some("ab12cd34"));
        assert!(name.starts_with("processed_background_ab12cd34_"));
        assert!(name.ends_with(".mp4"));

        let anonymous = background_filename(None);
        assert!(anonymous.starts_with("processed_background_"));
        assert!(!anonymous.contains("ab12cd34"));
    }

    #[test]
    fn flat_color_is_deterministic_per_seed() {
        assert_eq!(flat_color_from_seed(5), flat_color_from_seed(5));
        let color = flat_color_from_seed(5);
        assert!(color.starts_with("0x") && color.len() == 8);
    }
}
