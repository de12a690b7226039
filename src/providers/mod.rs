/*!
 * Speech-to-text provider implementations.
 *
 * This module contains the transcription service boundary:
 * - `Transcriber`: the trait the orchestrator and controller program against
 * - `elevenlabs`: ElevenLabs speech-to-text client
 * - `mock`: scripted transcriber used by tests and benchmarks
 */

use async_trait::async_trait;
use std::fmt::Debug;
use std::path::Path;
use tokio_util::sync::CancellationToken;

use crate::errors::ProviderError;
use crate::subtitle_processor::Transcript;

/// Common trait for all transcription providers
///
/// Implementations upload one audio file and return its timestamped transcript.
/// Errors are classified with `ProviderError::is_retryable`; the caller owns the
/// retry policy.
#[async_trait]
pub trait Transcriber: Send + Sync + Debug {
    /// Transcribe one audio file
    ///
    /// # Arguments
    /// * `path` - Audio file to upload
    /// * `language_hint` - Language code, or empty / "auto" for detection
    /// * `tag_audio_events` - Ask for non-speech annotations
    /// * `cancel` - Aborts the call when triggered
    async fn transcribe(
        &self,
        path: &Path,
        language_hint: &str,
        tag_audio_events: bool,
        cancel: &CancellationToken,
    ) -> Result<Transcript, ProviderError>;

    /// Short provider name for logs
    fn name(&self) -> &str;
}

pub mod elevenlabs;
pub mod mock;
