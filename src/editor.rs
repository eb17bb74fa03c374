use crate::captions::CaptionChunk;
use crate::config::Config;
use crate::error::{PipelineError, PipelineResult};
use crate::ffmpeg;
use crate::text::PLACEHOLDER_TEXT;
use crate::voice::AudioArtifact;
use crate::{logi, logok, logw};
use std::path::{Path, PathBuf};
use tokio::fs;

const CAPTION_FONT_SIZE: i32 = 70;
const CAPTION_BORDER_W: i32 = 4;
const SIMPLE_FONT_SIZE: i32 = 60;
const SIMPLE_BORDER_W: i32 = 3;
const SIMPLE_MAX_CHARS: usize = 30;
const CAPTION_BOTTOM_MARGIN: i32 = 80;

/// Total background repetitions needed to cover the narration: `ceil(a/b)`,
/// never less than one.
pub fn loops_needed(audio_dur: f64, background_dur: f64) -> u32 {
    if background_dur <= 0.0 {
        return 1;
    }
    let reps = (audio_dur / background_dur).ceil() as u32;
    reps.max(1)
}

/// Escape a caption for use inside a drawtext `text='...'` value.
pub fn escape_drawtext(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            ':' => out.push_str("\\:"),
            '%' => out.push_str("\\%"),
            ',' => out.push_str("\\,"),
            _ => out.push(ch),
        }
    }
    out
}

fn drawtext(text: &str, start: f64, end: f64, font_size: i32, border_w: i32, font: &str) -> String {
    let fontfile = if font.is_empty() {
        String::new()
    } else {
        format!("fontfile={}:", escape_drawtext(font))
    };
    format!(
        "drawtext={}text='{}':fontsize={}:fontcolor=white:borderw={}:bordercolor=black:x=(w-text_w)/2:y=h-text_h-{}:enable='between(t,{:.3},{:.3})'",
        fontfile, text, font_size, border_w, CAPTION_BOTTOM_MARGIN, start, end
    )
}

/// Full-styling caption filter. `None` when the chunk has nothing printable.
fn chunk_filter(chunk: &CaptionChunk, font: &str) -> Option<String> {
    let escaped = escape_drawtext(chunk.text.trim());
    if escaped.is_empty() {
        return None;
    }
    Some(drawtext(
        &escaped,
        chunk.start,
        chunk.end,
        CAPTION_FONT_SIZE,
        CAPTION_BORDER_W,
        font,
    ))
}

/// Degraded per-chunk rendering: truncated plain text, smaller face.
fn simplified_chunk_filter(chunk: &CaptionChunk, font: &str) -> Option<String> {
    let mut text: String = chunk.text.trim().chars().take(SIMPLE_MAX_CHARS).collect();
    text = text.trim().to_string();
    if text.is_empty() {
        return None;
    }
    let escaped = escape_drawtext(&text);
    Some(drawtext(
        &escaped,
        chunk.start,
        chunk.end,
        SIMPLE_FONT_SIZE,
        SIMPLE_BORDER_W,
        font,
    ))
}

/// Build the caption filter list, degrading chunk-by-chunk: a chunk that
/// cannot be rendered in full styling falls back to its simplified form
/// before being dropped.
pub fn caption_filters(chunks: &[CaptionChunk], font: &str) -> Vec<String> {
    let mut filters = Vec::new();
    for chunk in chunks {
        if let Some(filter) = chunk_filter(chunk, font) {
            filters.push(filter);
        } else if let Some(filter) = simplified_chunk_filter(chunk, font) {
            logw(format!(
                "Caption chunk degraded to simplified rendering: {:.40}",
                chunk.text
            ));
            filters.push(filter);
        } else {
            logw("Caption chunk dropped (nothing printable).".to_string());
        }
    }
    filters
}

fn simplified_filters(chunks: &[CaptionChunk], font: &str) -> Vec<String> {
    chunks
        .iter()
        .filter_map(|c| simplified_chunk_filter(c, font))
        .collect()
}

/// Single placeholder caption spanning the whole narration.
fn fallback_filter(total_duration: f64, font: &str) -> String {
    let escaped = escape_drawtext(PLACEHOLDER_TEXT);
    drawtext(
        &escaped,
        0.0,
        total_duration,
        SIMPLE_FONT_SIZE,
        SIMPLE_BORDER_W,
        font,
    )
}

pub fn final_filename(video_id: &str) -> String {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    format!("{}_{}.mp4", video_id, timestamp)
}

fn video_filter(cfg: &Config, captions: &[String]) -> String {
    let mut filter = format!("scale={}:{}", cfg.video_width, cfg.video_height);
    for caption in captions {
        filter.push(',');
        filter.push_str(caption);
    }
    filter
}

/// Render the final artifact: background aligned to the narration duration
/// (trim, or loop-then-trim), captions burned bottom-center, narration audio
/// attached. Caption failures degrade in order: full styling, simplified
/// styling, single placeholder; only then does the composition fail.
pub async fn compose(
    cfg: &Config,
    audio: &AudioArtifact,
    background: &Path,
    captions: &[CaptionChunk],
    video_id: &str,
) -> PipelineResult<PathBuf> {
    fs::create_dir_all(&cfg.output_dir).await?;
    let out = Path::new(&cfg.output_dir).join(final_filename(video_id));

    let background_dur = ffmpeg::ffprobe_duration_seconds(background)
        .await
        .map_err(|e| PipelineError::Render(format!("unreadable background: {}", e)))?;
    let extra_loops = loops_needed(audio.duration, background_dur) - 1;
    if extra_loops > 0 {
        logi(format!(
            "Background {:.1}s shorter than narration {:.1}s; looping {} extra time(s).",
            background_dur, audio.duration, extra_loops
        ));
    }

    let ladders: [(&str, Vec<String>); 3] = [
        ("styled captions", caption_filters(captions, &cfg.caption_font)),
        ("simplified captions", simplified_filters(captions, &cfg.caption_font)),
        (
            "single fallback caption",
            vec![fallback_filter(audio.duration, &cfg.caption_font)],
        ),
    ];

    for (label, filters) in ladders {
        if filters.is_empty() {
            continue;
        }
        let filter = video_filter(cfg, &filters);
        match ffmpeg::ffmpeg_compose(
            background,
            &audio.path,
            &filter,
            extra_loops,
            audio.duration,
            &out,
        )
        .await
        {
            Ok(true) => {
                logok(format!("Video created successfully: {}", out.display()));
                return Ok(out);
            }
            Ok(false) => logw(format!("Render produced no output ({}).", label)),
            Err(err) => logw(format!("Render failed ({}): {}", label, err)),
        }
    }

    Err(PipelineError::Render(
        "composition failed with every caption fallback".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loop_count_covers_the_narration_exactly() {
        // 42s narration over a 20s background: three plays, trimmed to 42
        assert_eq!(loops_needed(42.0, 20.0), 3);
        // background already long enough: single play, trimmed
        assert_eq!(loops_needed(10.0, 20.0), 1);
        assert_eq!(loops_needed(20.0, 20.0), 1);
        // degenerate background duration never divides by zero
        assert_eq!(loops_needed(10.0, 0.0), 1);
    }

    #[test]
    fn drawtext_metacharacters_are_escaped() {
        assert_eq!(
            escape_drawtext(r"it's 100%: a,b\c"),
            r"it\'s 100\%\: a\,b\\c"
        );
    }

    #[test]
    fn chunk_filters_carry_their_intervals() {
        let chunk = CaptionChunk {
            text: "hello world".to_string(),
            start: 1.5,
            end: 3.0,
        };
        let filter = chunk_filter(&chunk, "").unwrap();
        assert!(filter.contains("text='hello world'"));
        assert!(filter.contains("enable='between(t,1.500,3.000)'"));
        assert!(filter.contains("x=(w-text_w)/2"));
        assert!(!filter.contains("fontfile"));
    }

    #[test]
    fn configured_font_is_threaded_through() {
        let chunk = CaptionChunk {
            text: "hi there".to_string(),
            start: 0.0,
            end: 1.0,
        };
        let filter = chunk_filter(&chunk, "/fonts/Inter.ttf").unwrap();
        assert!(filter.contains("fontfile=/fonts/Inter.ttf"));
    }

    #[test]
    fn simplified_chunks_truncate_long_text() {
        let chunk = CaptionChunk {
            text: "a".repeat(100),
            start: 0.0,
            end: 2.0,
        };
        let filter = simplified_chunk_filter(&chunk, "").unwrap();
        assert!(filter.contains(&"a".repeat(30)));
        assert!(!filter.contains(&"a".repeat(31)));
        assert!(filter.contains("fontsize=60"));
    }

    #[test]
    fn unprintable_chunks_are_dropped_not_fatal() {
        let chunks = vec![
            CaptionChunk {
                text: "   ".to_string(),
                start: 0.0,
                end: 1.0,
            },
            CaptionChunk {
                text: "visible".to_string(),
                start: 1.0,
                end: 2.0,
            },
        ];
        let filters = caption_filters(&chunks, "");
        assert_eq!(filters.len(), 1);
        assert!(filters[0].contains("visible"));
    }

    #[test]
    fn fallback_caption_spans_the_whole_duration() {
        let filter = fallback_filter(37.5, "");
        assert!(filter.contains("between(t,0.000,37.500)"));
        assert!(filter.contains("Story content available in video"));
    }

    #[test]
    fn final_filenames_key_on_run_id_and_timestamp() {
        let name = final_filename("ab12cd34");
        assert!(name.starts_with("ab12cd34_"));
        assert!(name.ends_with(".mp4"));
    }

    #[test]
    fn video_filter_scales_then_draws() {
        let cfg = Config::default();
        let filter = video_filter(&cfg, &["drawtext=text='x'".to_string()]);
        assert!(filter.starts_with("scale=1080:1920,drawtext"));
    }
}
