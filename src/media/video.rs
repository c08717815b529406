//! Video operations via ffmpeg/ffprobe.
//!
//! Argument lists are built by pure functions so command construction is
//! unit-testable; execution goes through the [`CommandRunner`] seam.

use crate::error::{Result, ShortsmithError};
use crate::media::ffmpeg::CommandRunner;
use crate::media::reconcile::{self, ReconcilePlan};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where caption text is rendered on the clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptionPosition {
    Top,
    Center,
    #[default]
    Bottom,
}

/// Verify ffmpeg and ffprobe are invocable before any heavy work,
/// so a job doesn't run four generation stages only to fail at composition.
pub async fn check_prerequisites(runner: &dyn CommandRunner) -> Result<()> {
    for tool in ["ffmpeg", "ffprobe"] {
        runner.run(tool, &["-version".to_string()]).await?;
    }
    Ok(())
}

/// Measure a media file's container duration in seconds.
pub async fn probe_duration(runner: &dyn CommandRunner, path: &Path) -> Result<f64> {
    let output = runner.run("ffprobe", &probe_args(path)).await?;
    output
        .trim()
        .parse::<f64>()
        .map_err(|_| ShortsmithError::MediaRead {
            path: path.display().to_string(),
            message: format!("ffprobe returned an unparsable duration: {:?}", output.trim()),
        })
}

/// Force a video's duration to match the reference, writing the result to
/// `output`. Returns the path of the clip to use — the input itself when no
/// adjustment was needed.
pub async fn reconcile_video(
    runner: &dyn CommandRunner,
    input: &Path,
    output: &Path,
    reference_secs: f64,
) -> Result<PathBuf> {
    let native_secs = probe_duration(runner, input).await?;
    let plan = reconcile::plan(reference_secs, native_secs)?;

    let args = match plan {
        ReconcilePlan::Keep => return Ok(input.to_path_buf()),
        ReconcilePlan::Trim => trim_args(input, output, reference_secs),
        ReconcilePlan::Loop { copies } => loop_args(input, output, copies, reference_secs),
    };
    runner.run("ffmpeg", &args).await?;
    Ok(output.to_path_buf())
}

/// Replace the video's audio track with the given one.
///
/// The video stream is copied untouched; the container duration follows
/// the video via `-shortest` (the mixed track already matches it).
pub async fn mux_audio(
    runner: &dyn CommandRunner,
    video: &Path,
    audio: &Path,
    output: &Path,
) -> Result<()> {
    runner.run("ffmpeg", &mux_args(video, audio, output)).await?;
    Ok(())
}

/// Burn caption text over the full duration of the clip.
pub async fn overlay_captions(
    runner: &dyn CommandRunner,
    video: &Path,
    text: &str,
    position: CaptionPosition,
    output: &Path,
) -> Result<()> {
    runner
        .run("ffmpeg", &caption_args(video, text, position, output))
        .await?;
    Ok(())
}

/// Transcode any audio container to 16-bit mono WAV at the given rate.
pub async fn transcode_to_wav(
    runner: &dyn CommandRunner,
    input: &Path,
    output: &Path,
    sample_rate: u32,
) -> Result<()> {
    runner
        .run("ffmpeg", &transcode_args(input, output, sample_rate))
        .await?;
    Ok(())
}

fn probe_args(path: &Path) -> Vec<String> {
    vec![
        "-v".to_string(),
        "error".to_string(),
        "-show_entries".to_string(),
        "format=duration".to_string(),
        "-of".to_string(),
        "default=noprint_wrappers=1:nokey=1".to_string(),
        path.display().to_string(),
    ]
}

fn trim_args(input: &Path, output: &Path, reference_secs: f64) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-i".to_string(),
        input.display().to_string(),
        "-t".to_string(),
        format_secs(reference_secs),
        "-an".to_string(),
        output.display().to_string(),
    ]
}

fn loop_args(input: &Path, output: &Path, copies: u32, reference_secs: f64) -> Vec<String> {
    // -stream_loop N plays the input N+1 times
    vec![
        "-y".to_string(),
        "-stream_loop".to_string(),
        copies.saturating_sub(1).to_string(),
        "-i".to_string(),
        input.display().to_string(),
        "-t".to_string(),
        format_secs(reference_secs),
        "-an".to_string(),
        output.display().to_string(),
    ]
}

fn mux_args(video: &Path, audio: &Path, output: &Path) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-i".to_string(),
        video.display().to_string(),
        "-i".to_string(),
        audio.display().to_string(),
        "-map".to_string(),
        "0:v:0".to_string(),
        "-map".to_string(),
        "1:a:0".to_string(),
        "-c:v".to_string(),
        "copy".to_string(),
        "-c:a".to_string(),
        "aac".to_string(),
        "-shortest".to_string(),
        output.display().to_string(),
    ]
}

fn caption_args(
    video: &Path,
    text: &str,
    position: CaptionPosition,
    output: &Path,
) -> Vec<String> {
    let y = match position {
        CaptionPosition::Top => "50".to_string(),
        CaptionPosition::Center => "(h-text_h)/2".to_string(),
        CaptionPosition::Bottom => "h-text_h-50".to_string(),
    };
    let filter = format!(
        "drawtext=text='{}':fontcolor=white:fontsize=40:box=1:boxcolor=black@0.5:boxborderw=12:x=(w-text_w)/2:y={}",
        escape_drawtext(text),
        y
    );
    vec![
        "-y".to_string(),
        "-i".to_string(),
        video.display().to_string(),
        "-vf".to_string(),
        filter,
        "-c:a".to_string(),
        "copy".to_string(),
        output.display().to_string(),
    ]
}

fn transcode_args(input: &Path, output: &Path, sample_rate: u32) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-i".to_string(),
        input.display().to_string(),
        "-ar".to_string(),
        sample_rate.to_string(),
        "-ac".to_string(),
        "1".to_string(),
        output.display().to_string(),
    ]
}

/// Render a duration for the `-t` flag without float noise.
fn format_secs(secs: f64) -> String {
    format!("{:.3}", secs)
}

/// Escape text for ffmpeg's drawtext filter.
///
/// Backslash, quote, colon and percent are significant to the filter
/// parser; newlines become spaces (drawtext does not wrap).
fn escape_drawtext(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\'' => escaped.push_str("\\'"),
            ':' => escaped.push_str("\\:"),
            '%' => escaped.push_str("\\%"),
            '\n' | '\r' => escaped.push(' '),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::ffmpeg::MockCommandRunner;

    #[test]
    fn probe_args_ask_for_container_duration() {
        let args = probe_args(Path::new("/out/video/a.mp4"));
        assert!(args.contains(&"format=duration".to_string()));
        assert_eq!(args.last().unwrap(), "/out/video/a.mp4");
    }

    #[test]
    fn trim_args_cut_to_reference() {
        let args = trim_args(Path::new("in.mp4"), Path::new("out.mp4"), 30.0);
        let joined = args.join(" ");
        assert!(joined.contains("-t 30.000"));
        assert!(joined.contains("-an"));
        assert_eq!(args.last().unwrap(), "out.mp4");
    }

    #[test]
    fn loop_args_repeat_then_cut() {
        // 3 copies → ffmpeg replays the stream twice on top of the original
        let args = loop_args(Path::new("in.mp4"), Path::new("out.mp4"), 3, 20.0);
        let joined = args.join(" ");
        assert!(joined.contains("-stream_loop 2"));
        assert!(joined.contains("-t 20.000"));
    }

    #[test]
    fn mux_args_copy_video_and_encode_audio() {
        let args = mux_args(
            Path::new("v.mp4"),
            Path::new("a.wav"),
            Path::new("out.mp4"),
        );
        let joined = args.join(" ");
        assert!(joined.contains("-map 0:v:0"));
        assert!(joined.contains("-map 1:a:0"));
        assert!(joined.contains("-c:v copy"));
        assert!(joined.contains("-c:a aac"));
        assert!(joined.contains("-shortest"));
    }

    #[test]
    fn caption_args_position_bottom_by_default_variant() {
        let args = caption_args(
            Path::new("v.mp4"),
            "Space is big",
            CaptionPosition::Bottom,
            Path::new("out.mp4"),
        );
        let filter = &args[4];
        assert!(filter.starts_with("drawtext=text='Space is big'"));
        assert!(filter.contains("y=h-text_h-50"));
        assert!(filter.contains("x=(w-text_w)/2"));
    }

    #[test]
    fn caption_args_top_and_center_positions() {
        let top = caption_args(Path::new("v"), "t", CaptionPosition::Top, Path::new("o"));
        assert!(top[4].contains("y=50"));
        let center = caption_args(Path::new("v"), "t", CaptionPosition::Center, Path::new("o"));
        assert!(center[4].contains("y=(h-text_h)/2"));
    }

    #[test]
    fn drawtext_escaping_covers_special_characters() {
        assert_eq!(escape_drawtext("a:b"), "a\\:b");
        assert_eq!(escape_drawtext("it's"), "it\\'s");
        assert_eq!(escape_drawtext("50%"), "50\\%");
        assert_eq!(escape_drawtext("back\\slash"), "back\\\\slash");
        assert_eq!(escape_drawtext("line\nbreak"), "line break");
    }

    #[test]
    fn transcode_args_force_mono_at_rate() {
        let args = transcode_args(Path::new("m.mp3"), Path::new("m.wav"), 16000);
        let joined = args.join(" ");
        assert!(joined.contains("-ar 16000"));
        assert!(joined.contains("-ac 1"));
    }

    #[test]
    fn caption_position_serde_is_lowercase() {
        assert_eq!(
            serde_json::to_string(&CaptionPosition::Bottom).unwrap(),
            "\"bottom\""
        );
        let pos: CaptionPosition = serde_json::from_str("\"center\"").unwrap();
        assert_eq!(pos, CaptionPosition::Center);
    }

    #[tokio::test]
    async fn probe_duration_parses_ffprobe_output() {
        let runner = MockCommandRunner::new().with_probe_duration(41.97);
        let secs = probe_duration(&runner, Path::new("v.mp4")).await.unwrap();
        assert!((secs - 41.97).abs() < 1e-9);
    }

    #[tokio::test]
    async fn reconcile_video_keeps_matching_duration() {
        let runner = MockCommandRunner::new().with_probe_duration(30.01);
        let used = reconcile_video(&runner, Path::new("in.mp4"), Path::new("out.mp4"), 30.0)
            .await
            .unwrap();

        assert_eq!(used, PathBuf::from("in.mp4"));
        // Only the probe ran
        assert_eq!(runner.invocations().len(), 1);
    }

    #[tokio::test]
    async fn reconcile_video_loops_short_clips() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.mp4");
        let runner = MockCommandRunner::new().with_probe_duration(7.0);

        let used = reconcile_video(&runner, Path::new("in.mp4"), &out, 20.0)
            .await
            .unwrap();

        assert_eq!(used, out);
        let invocations = runner.invocations();
        assert_eq!(invocations.len(), 2);
        let ffmpeg_args = invocations[1].1.join(" ");
        assert!(ffmpeg_args.contains("-stream_loop 2"));
        assert!(ffmpeg_args.contains("-t 20.000"));
    }

    #[tokio::test]
    async fn reconcile_video_trims_long_clips() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.mp4");
        let runner = MockCommandRunner::new().with_probe_duration(45.0);

        reconcile_video(&runner, Path::new("in.mp4"), &out, 30.0)
            .await
            .unwrap();

        let ffmpeg_args = runner.invocations()[1].1.join(" ");
        assert!(ffmpeg_args.contains("-t 30.000"));
        assert!(!ffmpeg_args.contains("-stream_loop"));
    }

    #[tokio::test]
    async fn reconcile_video_rejects_zero_duration_clip() {
        let runner = MockCommandRunner::new().with_probe_duration(0.0);
        let err = reconcile_video(&runner, Path::new("in.mp4"), Path::new("out.mp4"), 30.0)
            .await
            .unwrap_err();
        assert!(matches!(err, ShortsmithError::Reconciliation { .. }));
    }

    #[tokio::test]
    async fn check_prerequisites_runs_both_tools() {
        let runner = MockCommandRunner::new();
        check_prerequisites(&runner).await.unwrap();
        let programs: Vec<String> = runner
            .invocations()
            .into_iter()
            .map(|(program, _)| program)
            .collect();
        assert_eq!(programs, vec!["ffmpeg", "ffprobe"]);
    }
}
