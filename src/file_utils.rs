use anyhow::{Context, Result};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

use crate::subtitle_processor::Transcript;

// @module: File and path utilities

/// Audio and video extensions accepted as input
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    "mp3", "m4a", "wav", "flac", "ogg", "aac", "mp4", "mov", "mkv", "avi", "flv", "webm",
];

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.as_os_str().is_empty() && !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }

    /// Whether the extension is one we can transcribe
    pub fn is_supported_input<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref()
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .is_some_and(|e| SUPPORTED_EXTENSIONS.contains(&e.as_str()))
    }

    /// File name without extension, falling back to "output"
    pub fn stem<P: AsRef<Path>>(path: P) -> String {
        path.as_ref()
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "output".to_string())
    }

    // @generates: `<stem>.srt` next to the input
    pub fn default_output_path<P: AsRef<Path>>(input_file: P) -> PathBuf {
        input_file.as_ref().with_file_name(format!("{}.srt", Self::stem(&input_file)))
    }

    // @generates: Transcript JSON path alongside the subtitle output
    pub fn json_output_path<P: AsRef<Path>>(output_file: P) -> PathBuf {
        output_file.as_ref().with_extension("json")
    }

    // @generates: Temporary audio file for a video input
    pub fn temp_audio_path<P: AsRef<Path>>(input_file: P, work_dir: &Path) -> PathBuf {
        work_dir.join(format!("temp_audio_{}.m4a", Self::stem(input_file)))
    }

    /// Size in megabytes
    pub fn file_size_mb<P: AsRef<Path>>(path: P) -> Result<f64> {
        let metadata = fs::metadata(&path).with_context(|| format!("Failed to stat file: {:?}", path.as_ref()))?;
        Ok(metadata.len() as f64 / 1024.0 / 1024.0)
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content).with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;
        Ok(())
    }

    /// Pretty-printed transcript JSON
    pub fn save_transcript_json<P: AsRef<Path>>(path: P, transcript: &Transcript) -> Result<()> {
        let json = serde_json::to_string_pretty(transcript).context("Failed to serialize transcript")?;
        Self::write_to_file(path, &json)
    }

    /// Remove a file if present; failures are logged, never returned
    pub fn remove_quietly<P: AsRef<Path>>(path: P) {
        let path = path.as_ref();
        match fs::remove_file(path) {
            Ok(()) => debug!("Removed {:?}", path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove {:?}: {}", path, e),
        }
    }

    /// Remove chunk files and any `.json` written next to them
    pub fn cleanup_chunks(chunks: &[PathBuf]) {
        for chunk in chunks {
            Self::remove_quietly(chunk);
            Self::remove_quietly(chunk.with_extension("json"));
        }
    }
}
