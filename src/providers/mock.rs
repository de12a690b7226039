/*!
 * Mock transcriber for testing.
 *
 * Behaviour is scripted per chunk file name:
 * - `MockTranscriber::working()` - every file succeeds with a one-word transcript
 * - `with_delay` - the call takes a fixed (tokio) time, observing cancellation
 * - `with_failures` - the listed errors are returned first, then the call succeeds
 * - `with_permanent_failure` - the call always fails with the given error
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::errors::ProviderError;
use crate::providers::Transcriber;
use crate::subtitle_processor::{Token, Transcript};

#[derive(Debug, Default)]
struct MockState {
    /// Calls made so far, in order, by file name
    calls: Vec<String>,
    /// Errors still to be returned before succeeding
    pending_failures: HashMap<String, VecDeque<ProviderError>>,
}

/// Mock transcriber for testing orchestration behavior
#[derive(Debug, Clone, Default)]
pub struct MockTranscriber {
    delays: HashMap<String, Duration>,
    permanent_failures: HashMap<String, ProviderError>,
    tokens: HashMap<String, Vec<Token>>,
    language_code: String,
    state: Arc<Mutex<MockState>>,
}

impl MockTranscriber {
    /// Create a mock that succeeds for every file
    pub fn working() -> Self {
        Self {
            language_code: "eng".to_string(),
            ..Self::default()
        }
    }

    /// Language code reported in every transcript
    pub fn with_language(mut self, language_code: &str) -> Self {
        self.language_code = language_code.to_string();
        self
    }

    /// Delay the response for `file_name`
    pub fn with_delay(mut self, file_name: &str, delay: Duration) -> Self {
        self.delays.insert(file_name.to_string(), delay);
        self
    }

    /// Return `errors` in order for `file_name` before succeeding
    pub fn with_failures(self, file_name: &str, errors: Vec<ProviderError>) -> Self {
        self.state
            .lock()
            .pending_failures
            .insert(file_name.to_string(), errors.into());
        self
    }

    /// Always fail `file_name` with `error`
    pub fn with_permanent_failure(mut self, file_name: &str, error: ProviderError) -> Self {
        self.permanent_failures.insert(file_name.to_string(), error);
        self
    }

    /// Return `tokens` for `file_name` instead of the default one-word transcript
    pub fn with_tokens(mut self, file_name: &str, tokens: Vec<Token>) -> Self {
        self.tokens.insert(file_name.to_string(), tokens);
        self
    }

    /// File names in the order calls were received
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    /// Number of calls received for `file_name`
    pub fn call_count(&self, file_name: &str) -> usize {
        self.state.lock().calls.iter().filter(|c| *c == file_name).count()
    }

    fn transcript_for(&self, file_name: &str) -> Transcript {
        let stem = Path::new(file_name)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let tokens = self
            .tokens
            .get(file_name)
            .cloned()
            .unwrap_or_else(|| vec![Token::word(stem.clone(), 0.5, 1.25)]);

        Transcript::new(self.language_code.clone(), stem, tokens)
    }
}

#[async_trait]
impl Transcriber for MockTranscriber {
    async fn transcribe(
        &self,
        path: &Path,
        _language_hint: &str,
        _tag_audio_events: bool,
        cancel: &CancellationToken,
    ) -> Result<Transcript, ProviderError> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let scripted_failure = {
            let mut state = self.state.lock();
            state.calls.push(file_name.clone());
            state
                .pending_failures
                .get_mut(&file_name)
                .and_then(|queue| queue.pop_front())
        };

        if let Some(delay) = self.delays.get(&file_name) {
            tokio::select! {
                _ = cancel.cancelled() => return Err(ProviderError::Cancelled),
                _ = tokio::time::sleep(*delay) => {}
            }
        }

        if let Some(error) = scripted_failure {
            return Err(error);
        }
        if let Some(error) = self.permanent_failures.get(&file_name) {
            return Err(error.clone());
        }

        Ok(self.transcript_for(&file_name))
    }

    fn name(&self) -> &str {
        "mock"
    }
}
