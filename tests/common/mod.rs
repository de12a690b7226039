/*!
 * Common test utilities for the scribe2srt test suite
 */

#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use scribe2srt::errors::{MediaError, ProviderError};
use scribe2srt::media::{AudioSplitter, MediaInfo, MediaProbe, MediaTools};
use scribe2srt::providers::Transcriber;
use scribe2srt::subtitle_processor::{Token, Transcript};

/// Route library logs to the test harness; safe to call from every test
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &[u8]) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Word tokens separated by single spaces, each `step` seconds apart
pub fn spoken(words: &[&str], start: f64, step: f64) -> Vec<Token> {
    let mut tokens = Vec::new();
    for (i, word) in words.iter().enumerate() {
        let t = start + i as f64 * step;
        if i > 0 {
            tokens.push(Token::spacing(" ", t - 0.05, t));
        }
        tokens.push(Token::word(*word, t, t + step - 0.05));
    }
    tokens
}

pub fn transcript(language: &str, tokens: Vec<Token>) -> Transcript {
    Transcript::new(language, "", tokens)
}

/// Scripted media toolchain that never touches ffmpeg
#[derive(Debug, Default)]
pub struct FakeMedia {
    pub duration: f64,
    pub available: bool,
    pub chunk_count: usize,
    pub fail_probe: bool,
    /// Write a `.json` companion next to each chunk
    pub write_companions: bool,
    pub calls: Mutex<Vec<String>>,
    pub produced: Mutex<Vec<PathBuf>>,
}

impl FakeMedia {
    pub fn new(duration: f64, chunk_count: usize) -> Self {
        Self {
            duration,
            available: true,
            chunk_count,
            ..Self::default()
        }
    }

    pub fn unavailable(duration: f64) -> Self {
        Self {
            duration,
            available: false,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn produced(&self) -> Vec<PathBuf> {
        self.produced.lock().clone()
    }
}

#[async_trait]
impl MediaProbe for FakeMedia {
    async fn probe(&self, _path: &Path) -> Result<MediaInfo, MediaError> {
        self.calls.lock().push("probe".to_string());
        if self.fail_probe {
            return Err(MediaError::ToolMissing("ffprobe".to_string()));
        }
        Ok(MediaInfo {
            duration: self.duration,
            codec: "aac".to_string(),
        })
    }
}

#[async_trait]
impl AudioSplitter for FakeMedia {
    async fn split(&self, path: &Path, output_dir: &Path, segment_secs: u64) -> Result<Vec<PathBuf>, MediaError> {
        self.calls.lock().push(format!("split:{}", segment_secs));
        let base = path.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();

        let mut chunks = Vec::new();
        for i in 0..self.chunk_count {
            let chunk = output_dir.join(format!("{}_chunk_{:03}.mp3", base, i));
            fs::write(&chunk, b"chunk")?;
            if self.write_companions {
                fs::write(chunk.with_extension("json"), b"{}")?;
            }
            chunks.push(chunk);
        }
        self.produced.lock().extend(chunks.iter().cloned());

        if chunks.is_empty() {
            return Err(MediaError::NoChunksProduced);
        }
        Ok(chunks)
    }
}

#[async_trait]
impl MediaTools for FakeMedia {
    fn is_available(&self) -> bool {
        self.available
    }

    async fn extract_audio(&self, _video_path: &Path, output_path: &Path) -> Result<(), MediaError> {
        self.calls.lock().push("extract".to_string());
        fs::write(output_path, b"audio")?;
        self.produced.lock().push(output_path.to_path_buf());
        Ok(())
    }
}

/// Transcriber that always returns the same transcript
#[derive(Debug, Clone)]
pub struct StaticTranscriber {
    pub transcript: Transcript,
}

#[async_trait]
impl Transcriber for StaticTranscriber {
    async fn transcribe(
        &self,
        _path: &Path,
        _language_hint: &str,
        _tag_audio_events: bool,
        _cancel: &CancellationToken,
    ) -> Result<Transcript, ProviderError> {
        Ok(self.transcript.clone())
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// Transcriber that records how many calls overlap
#[derive(Debug, Default)]
pub struct ConcurrencyProbe {
    pub delay: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    started: Mutex<Vec<tokio::time::Instant>>,
}

impl ConcurrencyProbe {
    pub fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            ..Self::default()
        })
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn start_times(&self) -> Vec<tokio::time::Instant> {
        self.started.lock().clone()
    }
}

#[async_trait]
impl Transcriber for ConcurrencyProbe {
    async fn transcribe(
        &self,
        path: &Path,
        _language_hint: &str,
        _tag_audio_events: bool,
        cancel: &CancellationToken,
    ) -> Result<Transcript, ProviderError> {
        self.started.lock().push(tokio::time::Instant::now());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let result = tokio::select! {
            _ = cancel.cancelled() => Err(ProviderError::Cancelled),
            _ = tokio::time::sleep(self.delay) => {
                let stem = path.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();
                Ok(Transcript::new("eng", stem.clone(), vec![Token::word(format!("{}.", stem), 0.0, 1.0)]))
            }
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn name(&self) -> &str {
        "probe"
    }
}
