/*!
 * Error types for the scribe2srt application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when calling the transcription service
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Error when sending the request fails (network level)
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// The chunk file could not be read
    #[error("Failed to read input: {0}")]
    Io(String),

    /// Cancellation was observed while the call was in flight
    #[error("Request cancelled")]
    Cancelled,
}

impl ProviderError {
    /// Whether the failure is transient and the call may be attempted again.
    ///
    /// Network failures, server errors and throttling are retryable. Malformed
    /// responses, client errors, local I/O failures and cancellation are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RequestFailed(_) | Self::RateLimitExceeded(_) => true,
            Self::ApiError { status_code, .. } => *status_code >= 500 || *status_code == 429,
            Self::ParseError(_) | Self::Io(_) | Self::Cancelled => false,
        }
    }
}

/// Errors that can occur while orchestrating chunk transcription
#[derive(Error, Debug)]
pub enum TranscriptionError {
    /// The shared cancellation token fired
    #[error("Transcription cancelled")]
    Cancelled,

    /// A chunk failed every permitted attempt
    #[error("Chunk {chunk}/{total} failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        /// 1-based chunk number
        chunk: usize,
        /// Total number of chunks
        total: usize,
        /// Number of attempts made
        attempts: u32,
        /// Last underlying error
        #[source]
        source: ProviderError,
    },

    /// A chunk failed with an error that is not retried
    #[error("Chunk {chunk}/{total} failed: {source}")]
    ChunkFailed {
        chunk: usize,
        total: usize,
        #[source]
        source: ProviderError,
    },

    /// A chunk failed during the sequential fallback phase
    #[error("Sequential fallback chunk {chunk}/{total} failed: {source}")]
    FallbackFailed {
        chunk: usize,
        total: usize,
        #[source]
        source: ProviderError,
    },

    /// No chunk files were supplied
    #[error("No chunks to transcribe")]
    NoChunks,

    /// The combined transcript holds neither tokens nor text
    #[error("Empty transcript received")]
    EmptyTranscript,
}

/// Errors from probing, splitting or extracting media with external tools
#[derive(Error, Debug)]
pub enum MediaError {
    /// A required tool is not on the PATH
    #[error("{0} not found on PATH")]
    ToolMissing(String),

    /// The tool ran but failed
    #[error("{tool} failed: {message}")]
    ToolFailed { tool: String, message: String },

    /// The tool output could not be understood
    #[error("Failed to parse {tool} output: {message}")]
    InvalidOutput { tool: String, message: String },

    /// Splitting produced no chunk files
    #[error("Splitting produced no chunk files")]
    NoChunksProduced,

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from chunk orchestration
    #[error("Transcription error: {0}")]
    Transcription(#[from] TranscriptionError),

    /// Error from media tooling
    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    /// Subtitle generation produced nothing for a non-empty transcript
    #[error("Subtitle generation produced empty output")]
    EmptySubtitles,

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
