/*!
 * Chunked transcription.
 *
 * - `rate_limit`: token bucket shared by all workers
 * - `retry`: per-chunk retry state machine and backoff policy
 * - `orchestrator`: concurrent phase, sequential fallback and reassembly
 */

pub mod orchestrator;
pub mod rate_limit;
pub mod retry;

pub use orchestrator::{ChunkOrchestrator, ChunkResult, OrchestratorOptions, merge_results};
pub use rate_limit::TokenBucket;
pub use retry::{ChunkRetry, ChunkState, RetryDecision, RetryPolicy};
