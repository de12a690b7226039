/*!
 * Chunk transcription orchestration.
 *
 * Long inputs are split into fixed-length chunks that are transcribed
 * concurrently with bounded parallelism, a shared rate limit and per-chunk
 * retries. If the concurrent phase aborts after at least one chunk finished,
 * the remaining chunks are transcribed one by one before the results are
 * reassembled in original order with globally consistent timestamps.
 */

use futures::stream::{self, StreamExt};
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::app_config::TranscriptionConfig;
use crate::errors::{ProviderError, TranscriptionError};
use crate::providers::Transcriber;
use crate::subtitle_processor::Transcript;

use super::rate_limit::TokenBucket;
use super::retry::{ChunkRetry, RetryDecision, RetryPolicy};

/// Options for one orchestrated run
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorOptions {
    /// Chunks in flight at once
    pub max_concurrent: usize,
    /// Attempts and backoff per chunk in the concurrent phase
    pub retry: RetryPolicy,
    /// Requests per minute across all workers
    pub rate_limit_per_minute: u32,
    /// Language hint passed to the transcriber
    pub language: String,
    pub tag_audio_events: bool,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self::from_config(&TranscriptionConfig::default())
    }
}

impl OrchestratorOptions {
    pub fn from_config(config: &TranscriptionConfig) -> Self {
        Self {
            max_concurrent: config.max_concurrent,
            retry: RetryPolicy::new(config.max_retries, Duration::from_secs(1)),
            rate_limit_per_minute: config.rate_limit_per_minute,
            language: config.language.clone(),
            tag_audio_events: config.tag_audio_events,
        }
    }
}

/// Transcript of one chunk tagged with its position in the input
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkResult {
    /// 0-based chunk index
    pub index: usize,
    pub transcript: Transcript,
}

/// Drives a `Transcriber` over an ordered list of chunk files
#[derive(Debug, Clone)]
pub struct ChunkOrchestrator {
    transcriber: Arc<dyn Transcriber>,
    options: OrchestratorOptions,
}

impl ChunkOrchestrator {
    pub fn new(transcriber: Arc<dyn Transcriber>, options: OrchestratorOptions) -> Self {
        Self {
            transcriber,
            options,
        }
    }

    pub fn options(&self) -> &OrchestratorOptions {
        &self.options
    }

    /// Transcribe all chunks concurrently, falling back to sequential processing
    /// for the remainder if the concurrent phase aborts after partial success.
    ///
    /// `progress` is called with `(completed, total)` after each chunk finishes.
    pub async fn run<F>(
        &self,
        chunk_files: &[PathBuf],
        chunk_duration_secs: f64,
        cancel: &CancellationToken,
        progress: F,
    ) -> Result<Transcript, TranscriptionError>
    where
        F: Fn(usize, usize) + Sync,
    {
        if chunk_files.is_empty() {
            return Err(TranscriptionError::NoChunks);
        }

        let total = chunk_files.len();
        let max_concurrent = self.options.max_concurrent.max(1);
        info!(
            "Starting concurrent processing with {}: {} chunks, {} at a time, {} requests/minute",
            self.transcriber.name(),
            total,
            max_concurrent,
            self.options.rate_limit_per_minute
        );

        let limiter = TokenBucket::per_minute(self.options.rate_limit_per_minute);
        // Cancelled on the first chunk failure so siblings stop early
        let group = cancel.child_token();
        let accumulator = Mutex::new(Vec::with_capacity(total));
        let completed = AtomicUsize::new(0);

        let limiter = &limiter;
        let group = &group;
        let results = &accumulator;
        let completed = &completed;
        let progress = &progress;

        let outcomes: Vec<Result<(), TranscriptionError>> = stream::iter(chunk_files.iter().enumerate())
            .map(|(index, path)| async move {
                match self
                    .process_chunk(index, total, path, chunk_duration_secs, limiter, group)
                    .await
                {
                    Ok(result) => {
                        results.lock().push(result);
                        let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                        progress(done, total);
                        Ok(())
                    }
                    Err(e) => {
                        group.cancel();
                        Err(e)
                    }
                }
            })
            .buffer_unordered(max_concurrent)
            .collect()
            .await;

        let results = accumulator.into_inner();
        let Some(failure) = first_failure(outcomes) else {
            return Ok(merge_results(results));
        };

        if cancel.is_cancelled() {
            return Err(TranscriptionError::Cancelled);
        }
        if results.is_empty() {
            error!("Concurrent processing failed before any chunk completed: {}", failure);
            return Err(failure);
        }

        warn!(
            "Concurrent processing partially failed ({}/{} chunks completed): {}",
            results.len(),
            total,
            failure
        );
        self.run_fallback(chunk_files, chunk_duration_secs, cancel, results, progress)
            .await
    }

    /// Transcribe chunks strictly in order with a single attempt each
    pub async fn run_sequential<F>(
        &self,
        chunk_files: &[PathBuf],
        chunk_duration_secs: f64,
        cancel: &CancellationToken,
        progress: F,
    ) -> Result<Transcript, TranscriptionError>
    where
        F: Fn(usize, usize),
    {
        if chunk_files.is_empty() {
            return Err(TranscriptionError::NoChunks);
        }

        let total = chunk_files.len();
        let mut results = Vec::with_capacity(total);
        info!("Starting sequential processing with {}: {} chunks", self.transcriber.name(), total);

        for (index, path) in chunk_files.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(TranscriptionError::Cancelled);
            }

            info!("Processing chunk {}/{}: {:?}", index + 1, total, file_name(path));
            let transcript = self
                .transcribe_once(index, path, chunk_duration_secs, cancel)
                .await
                .map_err(|source| match source {
                    ProviderError::Cancelled => TranscriptionError::Cancelled,
                    source => TranscriptionError::ChunkFailed {
                        chunk: index + 1,
                        total,
                        source,
                    },
                })?;

            results.push(ChunkResult { index, transcript });
            info!("Chunk {}/{} completed", index + 1, total);
            progress(index + 1, total);
        }

        Ok(merge_results(results))
    }

    /// Transcribe a single unsplit file with one attempt
    pub async fn transcribe_file(
        &self,
        path: &Path,
        cancel: &CancellationToken,
    ) -> Result<Transcript, TranscriptionError> {
        if cancel.is_cancelled() {
            return Err(TranscriptionError::Cancelled);
        }

        info!("Transcribing {:?} with {}", file_name(path), self.transcriber.name());
        self.transcribe_once(0, path, 0.0, cancel)
            .await
            .map_err(|source| match source {
                ProviderError::Cancelled => TranscriptionError::Cancelled,
                source => TranscriptionError::ChunkFailed {
                    chunk: 1,
                    total: 1,
                    source,
                },
            })
    }

    /// One chunk in the concurrent phase: rate limit, attempt, back off, repeat
    async fn process_chunk(
        &self,
        index: usize,
        total: usize,
        path: &Path,
        chunk_duration_secs: f64,
        limiter: &TokenBucket,
        cancel: &CancellationToken,
    ) -> Result<ChunkResult, TranscriptionError> {
        let chunk = index + 1;
        let mut retry = ChunkRetry::new(self.options.retry);

        loop {
            if cancel.is_cancelled() {
                retry.cancel();
                return Err(TranscriptionError::Cancelled);
            }
            if let Err(e) = limiter.acquire(cancel).await {
                retry.cancel();
                return Err(e);
            }

            let attempt = retry.begin_attempt();
            if attempt == 1 {
                info!("Starting chunk {}/{}", chunk, total);
            } else {
                debug!("Chunk {}/{} attempt {}", chunk, total, attempt);
            }

            let error = match self.transcribe_once(index, path, chunk_duration_secs, cancel).await {
                Ok(transcript) => {
                    retry.succeed();
                    info!("Chunk {}/{} completed", chunk, total);
                    return Ok(ChunkResult { index, transcript });
                }
                Err(error) => error,
            };

            if cancel.is_cancelled() || matches!(error, ProviderError::Cancelled) {
                retry.cancel();
                return Err(TranscriptionError::Cancelled);
            }

            match retry.fail(&error) {
                RetryDecision::Backoff(delay) => {
                    warn!(
                        "Chunk {}/{} attempt {} failed: {}. Retrying in {}s",
                        chunk,
                        total,
                        attempt,
                        error,
                        delay.as_secs_f64()
                    );
                    tokio::select! {
                        _ = cancel.cancelled() => {
                            retry.cancel();
                            return Err(TranscriptionError::Cancelled);
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                RetryDecision::Exhausted => {
                    error!("Chunk {}/{} failed after {} attempts: {}", chunk, total, attempt, error);
                    return Err(TranscriptionError::RetriesExhausted {
                        chunk,
                        total,
                        attempts: retry.attempts(),
                        source: error,
                    });
                }
                RetryDecision::GiveUp => {
                    error!("Chunk {}/{} failed: {}", chunk, total, error);
                    return Err(TranscriptionError::ChunkFailed {
                        chunk,
                        total,
                        source: error,
                    });
                }
            }
        }
    }

    /// Transcribe the chunks missing from `completed`, in order, one attempt each
    async fn run_fallback<F>(
        &self,
        chunk_files: &[PathBuf],
        chunk_duration_secs: f64,
        cancel: &CancellationToken,
        mut completed: Vec<ChunkResult>,
        progress: &F,
    ) -> Result<Transcript, TranscriptionError>
    where
        F: Fn(usize, usize),
    {
        let total = chunk_files.len();
        let done: HashSet<usize> = completed.iter().map(|r| r.index).collect();
        info!(
            "Falling back to sequential processing for {} remaining chunks",
            total - done.len()
        );

        for (index, path) in chunk_files.iter().enumerate() {
            if done.contains(&index) {
                continue;
            }
            if cancel.is_cancelled() {
                return Err(TranscriptionError::Cancelled);
            }

            info!("Sequential fallback: chunk {}/{}", index + 1, total);
            let transcript = self
                .transcribe_once(index, path, chunk_duration_secs, cancel)
                .await
                .map_err(|source| match source {
                    ProviderError::Cancelled => TranscriptionError::Cancelled,
                    source => TranscriptionError::FallbackFailed {
                        chunk: index + 1,
                        total,
                        source,
                    },
                })?;

            completed.push(ChunkResult { index, transcript });
            progress(completed.len(), total);
        }

        Ok(merge_results(completed))
    }

    /// One transcriber call with the chunk's time offset applied
    async fn transcribe_once(
        &self,
        index: usize,
        path: &Path,
        chunk_duration_secs: f64,
        cancel: &CancellationToken,
    ) -> Result<Transcript, ProviderError> {
        let mut transcript = self
            .transcriber
            .transcribe(
                path,
                &self.options.language,
                self.options.tag_audio_events,
                cancel,
            )
            .await?;

        if index > 0 {
            transcript.apply_time_offset(chunk_offset(index, chunk_duration_secs));
        }
        Ok(transcript)
    }
}

/// Start time of chunk `index` within the original input
pub fn chunk_offset(index: usize, chunk_duration_secs: f64) -> f64 {
    index as f64 * chunk_duration_secs
}

/// Concatenate chunk transcripts in original index order
pub fn merge_results(mut results: Vec<ChunkResult>) -> Transcript {
    results.sort_by_key(|r| r.index);

    let mut combined = Transcript {
        language_code: results
            .first()
            .map(|r| r.transcript.language_code.clone())
            .unwrap_or_default(),
        ..Transcript::default()
    };

    for result in results {
        combined.tokens.extend(result.transcript.tokens);
        if !combined.text.is_empty() {
            combined.text.push(' ');
        }
        combined.text.push_str(&result.transcript.text);
    }

    combined
}

/// The error that caused the abort; cancellations of siblings are secondary
fn first_failure(outcomes: Vec<Result<(), TranscriptionError>>) -> Option<TranscriptionError> {
    let mut cancelled = None;
    for outcome in outcomes {
        match outcome {
            Ok(()) => {}
            Err(TranscriptionError::Cancelled) => cancelled = Some(TranscriptionError::Cancelled),
            Err(e) => return Some(e),
        }
    }
    cancelled
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}
