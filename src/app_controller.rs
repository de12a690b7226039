use anyhow::{Context, Result, anyhow};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::app_config::Config;
use crate::errors::{AppError, TranscriptionError};
use crate::file_utils::FileManager;
use crate::media::{self, FfmpegMedia, MediaTools};
use crate::pipeline::Pipeline;
use crate::providers::Transcriber;
use crate::providers::elevenlabs::ElevenLabsTranscriber;
use crate::subtitle_processor::Transcript;
use crate::transcription::{ChunkOrchestrator, OrchestratorOptions};

// @module: Application controller for transcribing one input file into subtitles

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,

    // @field: Speech-to-text backend
    transcriber: Arc<dyn Transcriber>,

    // @field: Probe, split and extract tooling
    media: Arc<dyn MediaTools>,

    // @field: Draw a progress bar for chunk completion
    show_progress: bool,
}

impl Controller {
    /// Controller backed by the ElevenLabs service and ffmpeg
    pub fn with_config(config: Config) -> Result<Self> {
        let transcriber = ElevenLabsTranscriber::from_config(&config.transcription)?;
        Ok(Self::with_components(config, Arc::new(transcriber), Arc::new(FfmpegMedia::new())))
    }

    /// Controller with explicit collaborators
    pub fn with_components(config: Config, transcriber: Arc<dyn Transcriber>, media: Arc<dyn MediaTools>) -> Self {
        Self {
            config,
            transcriber,
            media,
            show_progress: true,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Transcribe `input_file` and write subtitles; returns the subtitle path
    pub async fn run(
        &self,
        input_file: &Path,
        output_file: Option<PathBuf>,
        save_json: bool,
        cancel: &CancellationToken,
    ) -> Result<PathBuf> {
        let start_time = Instant::now();

        if !FileManager::file_exists(input_file) {
            return Err(AppError::File(format!("Input file does not exist: {:?}", input_file)).into());
        }

        let output_path = output_file.unwrap_or_else(|| FileManager::default_output_path(input_file));
        info!("Input: {:?}", input_file);
        info!("Output: {:?}", output_path);

        let duration = self.log_media_info(input_file).await;
        let ffmpeg_available = self.media.is_available();
        if !ffmpeg_available {
            warn!("ffmpeg not found, the file will be uploaded without splitting");
        }

        let work_dir = match input_file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let mut temp_audio = None;
        if ffmpeg_available && media::is_video_file(input_file) {
            let audio_path = FileManager::temp_audio_path(input_file, &work_dir);
            self.media
                .extract_audio(input_file, &audio_path)
                .await
                .context("Failed to extract audio from video")?;
            temp_audio = Some(audio_path);
        }

        let audio_path = temp_audio.as_deref().unwrap_or(input_file);
        let result = self
            .transcribe_audio(audio_path, &work_dir, duration, ffmpeg_available, cancel)
            .await;

        if let Some(temp) = &temp_audio {
            FileManager::remove_quietly(temp);
        }
        let transcript = result?;

        if transcript.is_empty() {
            return Err(TranscriptionError::EmptyTranscript.into());
        }

        if save_json {
            let json_path = FileManager::json_output_path(&output_path);
            match FileManager::save_transcript_json(&json_path, &transcript) {
                Ok(()) => info!("Transcript saved to {:?}", json_path),
                Err(e) => warn!("Failed to save transcript JSON: {}", e),
            }
        }

        let pipeline = Pipeline::with_tuning(self.config.subtitle.clone(), self.config.tuning.clone());
        let srt = pipeline.process(&transcript);
        if srt.is_empty() {
            return Err(AppError::EmptySubtitles.into());
        }

        FileManager::write_to_file(&output_path, &srt)?;
        info!(
            "Subtitles written to {:?} in {:.1}s",
            output_path,
            start_time.elapsed().as_secs_f64()
        );

        Ok(output_path)
    }

    /// Size, duration and codec; returns the duration, 0 when probing fails
    async fn log_media_info(&self, path: &Path) -> f64 {
        match FileManager::file_size_mb(path) {
            Ok(size) => info!("File size: {:.2} MB", size),
            Err(e) => debug!("Could not read file size: {}", e),
        }

        match self.media.probe(path).await {
            Ok(info) => {
                info!("Duration: {} | Codec: {}", info.duration_display(), info.codec);
                info.duration
            }
            Err(e) => {
                warn!("Could not probe media: {}", e);
                0.0
            }
        }
    }

    async fn transcribe_audio(
        &self,
        audio_path: &Path,
        work_dir: &Path,
        duration: f64,
        ffmpeg_available: bool,
        cancel: &CancellationToken,
    ) -> Result<Transcript> {
        let transcription = &self.config.transcription;
        let orchestrator = ChunkOrchestrator::new(
            Arc::clone(&self.transcriber),
            OrchestratorOptions::from_config(transcription),
        );
        let split_secs = transcription.split_duration_secs();

        if !(ffmpeg_available && duration > split_secs) {
            info!("Transcribing without splitting");
            return Ok(orchestrator.transcribe_file(audio_path, cancel).await?);
        }

        info!(
            "Duration exceeds {} minutes, splitting into chunks",
            transcription.split_duration_minutes
        );
        let chunks = self
            .media
            .split(audio_path, work_dir, split_secs as u64)
            .await
            .map_err(|e| anyhow!("Failed to split audio: {}", e))?;
        info!("Split into {} chunks", chunks.len());

        let progress_bar = self.progress_bar(chunks.len() as u64);
        let on_progress = |done: usize, _total: usize| progress_bar.set_position(done as u64);

        let result = if transcription.concurrent && chunks.len() > 1 {
            orchestrator.run(&chunks, split_secs, cancel, on_progress).await
        } else {
            orchestrator.run_sequential(&chunks, split_secs, cancel, on_progress).await
        };

        progress_bar.finish_and_clear();
        FileManager::cleanup_chunks(&chunks);

        Ok(result?)
    }

    fn progress_bar(&self, total: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let progress_bar = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("█▓▒░"));
        progress_bar
    }
}
