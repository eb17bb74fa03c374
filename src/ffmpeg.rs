use anyhow::{Context, Result};
use std::path::Path;
use tokio::process::Command;

async fn run_cmd(args: &[String]) -> Result<()> {
    if args.is_empty() {
        return Ok(());
    }

    let mut cmd = Command::new(&args[0]);
    if args.len() > 1 {
        cmd.args(&args[1..]);
    }

    let status = cmd.status().await.context("Command execution failed")?;
    if !status.success() {
        return Err(anyhow::anyhow!("Command failed: {:?}", args));
    }

    Ok(())
}

pub async fn ffprobe_video_dimensions(path: &Path) -> Result<(i32, i32)> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height",
            "-of",
            "csv=s=x:p=0",
        ])
        .arg(path)
        .output()
        .await
        .context("ffprobe execution failed")?;

    if !output.status.success() {
        return Err(anyhow::anyhow!("ffprobe failed"));
    }

    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let mut parts = text.split('x');
    let w = parts
        .next()
        .and_then(|v| v.parse::<i32>().ok())
        .unwrap_or(0);
    let h = parts
        .next()
        .and_then(|v| v.parse::<i32>().ok())
        .unwrap_or(0);

    if w <= 0 || h <= 0 {
        return Err(anyhow::anyhow!("Invalid dimensions"));
    }

    Ok((w, h))
}

pub async fn ffprobe_duration_seconds(path: &Path) -> Result<f64> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .output()
        .await
        .context("ffprobe duration failed")?;

    if !output.status.success() {
        return Err(anyhow::anyhow!("ffprobe failed"));
    }

    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let duration = text.parse::<f64>().unwrap_or(-1.0);
    if duration <= 0.1 {
        return Err(anyhow::anyhow!("Invalid duration"));
    }
    Ok(duration)
}

/// Extract `[start, start+dur)` from a source clip, apply a crop/scale filter
/// chain, and encode at the target frame rate.
pub async fn ffmpeg_extract_segment(
    input: &Path,
    start_s: f64,
    dur_s: f64,
    filter: &str,
    fps: i32,
    out_mp4: &Path,
) -> Result<bool> {
    let args = vec![
        "ffmpeg".to_string(),
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-ss".to_string(),
        format!("{:.3}", start_s),
        "-t".to_string(),
        format!("{:.3}", dur_s),
        "-i".to_string(),
        input.display().to_string(),
        "-vf".to_string(),
        filter.to_string(),
        "-r".to_string(),
        fps.to_string(),
        "-an".to_string(),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-preset".to_string(),
        "veryfast".to_string(),
        "-crf".to_string(),
        "22".to_string(),
        out_mp4.display().to_string(),
    ];

    run_cmd(&args).await?;
    Ok(out_mp4.exists())
}

/// Procedurally generated moving-gradient clip; `seed` keeps the pattern
/// reproducible per output name.
pub async fn ffmpeg_gradient_clip(
    width: i32,
    height: i32,
    fps: i32,
    dur_s: f64,
    seed: u64,
    out_mp4: &Path,
) -> Result<bool> {
    let source = format!(
        "gradients=s={}x{}:d={:.3}:seed={}:speed=0.05",
        width, height, dur_s, seed
    );

    let args = vec![
        "ffmpeg".to_string(),
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-f".to_string(),
        "lavfi".to_string(),
        "-i".to_string(),
        source,
        "-r".to_string(),
        fps.to_string(),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-preset".to_string(),
        "veryfast".to_string(),
        "-crf".to_string(),
        "22".to_string(),
        out_mp4.display().to_string(),
    ];

    run_cmd(&args).await?;
    Ok(out_mp4.exists())
}

/// Last-resort flat color clip.
pub async fn ffmpeg_color_clip(
    color: &str,
    width: i32,
    height: i32,
    fps: i32,
    dur_s: f64,
    out_mp4: &Path,
) -> Result<bool> {
    let source = format!("color=c={}:s={}x{}:d={:.3}", color, width, height, dur_s);

    let args = vec![
        "ffmpeg".to_string(),
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-f".to_string(),
        "lavfi".to_string(),
        "-i".to_string(),
        source,
        "-r".to_string(),
        fps.to_string(),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-preset".to_string(),
        "veryfast".to_string(),
        "-crf".to_string(),
        "22".to_string(),
        out_mp4.display().to_string(),
    ];

    run_cmd(&args).await?;
    Ok(out_mp4.exists())
}

/// Render the final artifact in one pass: loop the background `extra_loops`
/// additional times, scale, burn the caption filter chain, attach narration
/// audio, and cut at exactly the narration duration.
pub async fn ffmpeg_compose(
    background: &Path,
    narration: &Path,
    video_filter: &str,
    extra_loops: u32,
    dur_s: f64,
    out_mp4: &Path,
) -> Result<bool> {
    let args = vec![
        "ffmpeg".to_string(),
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-stream_loop".to_string(),
        extra_loops.to_string(),
        "-i".to_string(),
        background.display().to_string(),
        "-i".to_string(),
        narration.display().to_string(),
        "-filter_complex".to_string(),
        format!("[0:v]{}[v]", video_filter),
        "-map".to_string(),
        "[v]".to_string(),
        "-map".to_string(),
        "1:a".to_string(),
        "-t".to_string(),
        format!("{:.3}", dur_s),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-preset".to_string(),
        "veryfast".to_string(),
        "-crf".to_string(),
        "22".to_string(),
        "-c:a".to_string(),
        "aac".to_string(),
        "-b:a".to_string(),
        "192k".to_string(),
        "-movflags".to_string(),
        "+faststart".to_string(),
        out_mp4.display().to_string(),
    ];

    run_cmd(&args).await?;
    Ok(out_mp4.exists())
}
