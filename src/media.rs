use async_trait::async_trait;
use log::{debug, info};
use regex::Regex;
use serde::Deserialize;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Output;
use tokio::process::Command;
use walkdir::WalkDir;

use crate::errors::MediaError;

// @module: Media probing, audio extraction and splitting via ffmpeg

/// Extensions treated as video containers whose audio is extracted first
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "mov", "avi", "flv", "webm"];

// @struct: Duration and codec of a media file
#[derive(Debug, Clone, PartialEq)]
pub struct MediaInfo {
    // @field: Duration in seconds (0 when unknown)
    pub duration: f64,

    // @field: Codec of the first audio stream, "N/A" when absent
    pub codec: String,
}

impl MediaInfo {
    /// Duration as `MM:SS`
    pub fn duration_display(&self) -> String {
        let total = self.duration.max(0.0) as u64;
        format!("{:02}:{:02}", total / 60, total % 60)
    }
}

/// Reports duration and codec of a media file
#[async_trait]
pub trait MediaProbe: Send + Sync {
    async fn probe(&self, path: &Path) -> Result<MediaInfo, MediaError>;
}

/// Splits an audio file into fixed-length chunks
#[async_trait]
pub trait AudioSplitter: Send + Sync {
    /// Returns chunk paths in playback order; never empty on success
    async fn split(&self, path: &Path, output_dir: &Path, segment_secs: u64) -> Result<Vec<PathBuf>, MediaError>;
}

/// Everything the controller needs from the media toolchain
#[async_trait]
pub trait MediaTools: MediaProbe + AudioSplitter {
    /// Whether splitting and extraction can run at all
    fn is_available(&self) -> bool;

    /// Copy the audio stream of a video into `output_path` without re-encoding
    async fn extract_audio(&self, video_path: &Path, output_path: &Path) -> Result<(), MediaError>;
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    format: ProbeFormat,
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Default, Deserialize)]
struct ProbeFormat {
    #[serde(default)]
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    #[serde(default)]
    codec_name: Option<String>,
}

/// Parse `ffprobe -of json` output; an unparsable duration counts as 0
pub fn parse_probe_output(json: &str) -> Result<MediaInfo, MediaError> {
    let probe: ProbeOutput = serde_json::from_str(json).map_err(|e| MediaError::InvalidOutput {
        tool: "ffprobe".to_string(),
        message: e.to_string(),
    })?;

    let duration = probe
        .format
        .duration
        .and_then(|d| d.trim().parse::<f64>().ok())
        .unwrap_or(0.0);

    let codec = probe
        .streams
        .into_iter()
        .next()
        .and_then(|s| s.codec_name)
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| "N/A".to_string());

    Ok(MediaInfo { duration, codec })
}

/// Whether `path` has a video container extension
pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .is_some_and(|e| VIDEO_EXTENSIONS.contains(&e.as_str()))
}

/// Output pattern handed to the segment muxer
pub fn chunk_template(output_dir: &Path, base_name: &str) -> PathBuf {
    output_dir.join(format!("{}_chunk_%03d.mp3", base_name))
}

/// Chunk files for `base_name` in `output_dir`, sorted by name
pub fn collect_chunk_files(output_dir: &Path, base_name: &str) -> Result<Vec<PathBuf>, MediaError> {
    let pattern = Regex::new(&format!(r"^{}_chunk_.+\.mp3$", regex::escape(base_name))).map_err(|e| {
        MediaError::InvalidOutput {
            tool: "ffmpeg".to_string(),
            message: e.to_string(),
        }
    })?;

    let mut chunks: Vec<PathBuf> = WalkDir::new(output_dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| pattern.is_match(&e.file_name().to_string_lossy()))
        .map(|e| e.into_path())
        .collect();

    if chunks.is_empty() {
        return Err(MediaError::NoChunksProduced);
    }

    chunks.sort();
    Ok(chunks)
}

/// Keep the lines of ffmpeg stderr that describe the failure
pub fn filter_ffmpeg_stderr(stderr: &str) -> String {
    let relevant: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| {
            let lower = line.to_lowercase();
            lower.contains("error") || lower.contains("invalid") || lower.contains("no such file")
        })
        .collect();

    if relevant.is_empty() {
        stderr.lines().last().unwrap_or_default().trim().to_string()
    } else {
        relevant.join("; ")
    }
}

/// Whether `tool` resolves to an executable on the PATH
pub fn tool_available(tool: &str) -> bool {
    which::which(tool).is_ok()
}

/// Whether `tool` resolves to an executable in one of `paths`
pub fn tool_available_in<P: AsRef<OsStr>>(tool: &str, paths: P, cwd: &Path) -> bool {
    which::which_in(tool, Some(paths), cwd).is_ok()
}

// @struct: ffmpeg/ffprobe backed media tooling
#[derive(Debug, Clone, Default)]
pub struct FfmpegMedia;

impl FfmpegMedia {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MediaTools for FfmpegMedia {
    fn is_available(&self) -> bool {
        tool_available("ffmpeg")
    }

    async fn extract_audio(&self, video_path: &Path, output_path: &Path) -> Result<(), MediaError> {
        info!("Extracting audio from {:?}", video_path.file_name().unwrap_or_default());

        let output = Command::new("ffmpeg")
            .arg("-i")
            .arg(video_path)
            .args(["-vn", "-c:a", "copy", "-y"])
            .arg(output_path)
            .kill_on_drop(true)
            .output()
            .await;

        check_output("ffmpeg", output)
    }
}

fn check_output(tool: &str, output: std::io::Result<Output>) -> Result<(), MediaError> {
    let output = output.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => MediaError::ToolMissing(tool.to_string()),
        _ => MediaError::Io(e),
    })?;

    if output.status.success() {
        Ok(())
    } else {
        Err(MediaError::ToolFailed {
            tool: tool.to_string(),
            message: filter_ffmpeg_stderr(&String::from_utf8_lossy(&output.stderr)),
        })
    }
}

#[async_trait]
impl MediaProbe for FfmpegMedia {
    async fn probe(&self, path: &Path) -> Result<MediaInfo, MediaError> {
        let output = Command::new("ffprobe")
            .args([
                "-v",
                "error",
                "-select_streams",
                "a:0",
                "-show_entries",
                "stream=codec_name:format=duration",
                "-of",
                "json",
            ])
            .arg(path)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => MediaError::ToolMissing("ffprobe".to_string()),
                _ => MediaError::Io(e),
            })?;

        if !output.status.success() {
            return Err(MediaError::ToolFailed {
                tool: "ffprobe".to_string(),
                message: filter_ffmpeg_stderr(&String::from_utf8_lossy(&output.stderr)),
            });
        }

        parse_probe_output(&String::from_utf8_lossy(&output.stdout))
    }
}

#[async_trait]
impl AudioSplitter for FfmpegMedia {
    async fn split(&self, path: &Path, output_dir: &Path, segment_secs: u64) -> Result<Vec<PathBuf>, MediaError> {
        let base_name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        info!(
            "Splitting {:?} into {}s segments",
            path.file_name().unwrap_or_default(),
            segment_secs
        );

        let output = Command::new("ffmpeg")
            .arg("-i")
            .arg(path)
            .args(["-f", "segment", "-segment_time"])
            .arg(segment_secs.to_string())
            .args(["-c:a", "libmp3lame", "-b:a", "192k", "-y"])
            .arg(chunk_template(output_dir, &base_name))
            .kill_on_drop(true)
            .output()
            .await;
        check_output("ffmpeg", output)?;

        let chunks = collect_chunk_files(output_dir, &base_name)?;
        debug!("ffmpeg produced {} chunks", chunks.len());
        Ok(chunks)
    }
}
