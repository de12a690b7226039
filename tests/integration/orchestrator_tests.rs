/*!
 * Integration tests for chunk orchestration
 */

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};
use tokio_util::sync::CancellationToken;

use scribe2srt::errors::{ProviderError, TranscriptionError};
use scribe2srt::providers::mock::MockTranscriber;
use scribe2srt::transcription::{ChunkOrchestrator, OrchestratorOptions, RetryPolicy};

use crate::common::ConcurrencyProbe;

fn chunk_paths(count: usize) -> Vec<PathBuf> {
    (0..count)
        .map(|i| PathBuf::from(format!("/work/talk_chunk_{:03}.mp3", i)))
        .collect()
}

fn options(max_concurrent: usize, rate_limit_per_minute: u32) -> OrchestratorOptions {
    OrchestratorOptions {
        max_concurrent,
        rate_limit_per_minute,
        retry: RetryPolicy::new(3, Duration::from_secs(1)),
        ..OrchestratorOptions::default()
    }
}

#[tokio::test(start_paused = true)]
async fn test_run_should_never_exceed_max_concurrent() {
    let probe = ConcurrencyProbe::new(Duration::from_secs(2));
    let orchestrator = ChunkOrchestrator::new(probe.clone(), options(2, 6000));

    let transcript = assert_ok!(
        orchestrator
            .run(&chunk_paths(6), 60.0, &CancellationToken::new(), |_, _| {})
            .await
    );

    assert_eq!(probe.peak(), 2);
    assert_eq!(transcript.tokens.len(), 6);
}

#[tokio::test(start_paused = true)]
async fn test_run_should_space_requests_by_rate_limit() {
    let probe = ConcurrencyProbe::new(Duration::from_millis(10));
    let orchestrator = ChunkOrchestrator::new(probe.clone(), options(4, 60));

    assert_ok!(
        orchestrator
            .run(&chunk_paths(4), 60.0, &CancellationToken::new(), |_, _| {})
            .await
    );

    let mut starts = probe.start_times();
    starts.sort();
    assert_eq!(starts.len(), 4);
    for pair in starts.windows(2) {
        assert!(pair[1] - pair[0] >= Duration::from_millis(999), "{:?}", pair[1] - pair[0]);
    }
}

#[tokio::test(start_paused = true)]
async fn test_run_should_reassemble_in_index_order_with_offsets() {
    let probe = ConcurrencyProbe::new(Duration::from_secs(1));
    let orchestrator = ChunkOrchestrator::new(probe, options(3, 6000));

    let transcript = assert_ok!(
        orchestrator
            .run(&chunk_paths(3), 60.0, &CancellationToken::new(), |_, _| {})
            .await
    );

    let words: Vec<(&str, f64)> = transcript.tokens.iter().map(|t| (t.text.as_str(), t.start)).collect();
    assert_eq!(
        words,
        vec![
            ("talk_chunk_000.", 0.0),
            ("talk_chunk_001.", 60.0),
            ("talk_chunk_002.", 120.0),
        ]
    );
    assert_eq!(transcript.text, "talk_chunk_000 talk_chunk_001 talk_chunk_002");
}

#[tokio::test(start_paused = true)]
async fn test_run_should_report_progress_for_every_chunk() {
    let probe = ConcurrencyProbe::new(Duration::from_millis(100));
    let orchestrator = ChunkOrchestrator::new(probe, options(2, 6000));
    let calls = AtomicUsize::new(0);
    let last = AtomicUsize::new(0);

    assert_ok!(
        orchestrator
            .run(&chunk_paths(5), 30.0, &CancellationToken::new(), |done, total| {
                assert_eq!(total, 5);
                calls.fetch_add(1, Ordering::SeqCst);
                last.fetch_max(done, Ordering::SeqCst);
            })
            .await
    );

    assert_eq!(calls.load(Ordering::SeqCst), 5);
    assert_eq!(last.load(Ordering::SeqCst), 5);
}

#[tokio::test(start_paused = true)]
async fn test_run_with_transient_failures_should_retry_and_succeed() {
    let mock = MockTranscriber::working().with_failures(
        "talk_chunk_001.mp3",
        vec![
            ProviderError::RequestFailed("reset".to_string()),
            ProviderError::ApiError {
                status_code: 503,
                message: "busy".to_string(),
            },
        ],
    );
    let orchestrator = ChunkOrchestrator::new(Arc::new(mock.clone()), options(3, 6000));

    let transcript = assert_ok!(
        orchestrator
            .run(&chunk_paths(3), 60.0, &CancellationToken::new(), |_, _| {})
            .await
    );

    assert_eq!(mock.call_count("talk_chunk_001.mp3"), 3);
    assert_eq!(transcript.tokens.len(), 3);
    assert_eq!(transcript.tokens[1].start, 60.5);
}

#[tokio::test(start_paused = true)]
async fn test_run_with_failure_after_partial_success_should_fall_back() {
    let mock = MockTranscriber::working()
        .with_delay("talk_chunk_001.mp3", Duration::from_secs(5))
        .with_delay("talk_chunk_002.mp3", Duration::from_secs(5))
        .with_failures(
            "talk_chunk_003.mp3",
            vec![ProviderError::ParseError("truncated body".to_string())],
        )
        .with_delay("talk_chunk_003.mp3", Duration::from_secs(1));
    let orchestrator = ChunkOrchestrator::new(Arc::new(mock.clone()), options(4, 6000));

    let transcript = assert_ok!(
        orchestrator
            .run(&chunk_paths(4), 10.0, &CancellationToken::new(), |_, _| {})
            .await
    );

    let starts: Vec<f64> = transcript.tokens.iter().map(|t| t.start).collect();
    assert_eq!(starts, vec![0.5, 10.5, 20.5, 30.5]);
    assert_eq!(mock.call_count("talk_chunk_003.mp3"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_run_when_parent_cancelled_should_return_cancelled() {
    let mock = MockTranscriber::working().with_delay("talk_chunk_000.mp3", Duration::from_secs(30));
    let orchestrator = ChunkOrchestrator::new(Arc::new(mock), options(2, 6000));
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        trigger.cancel();
    });

    let error = assert_err!(orchestrator.run(&chunk_paths(2), 60.0, &cancel, |_, _| {}).await);

    assert!(matches!(error, TranscriptionError::Cancelled), "{:?}", error);
}

#[tokio::test(start_paused = true)]
async fn test_run_sequential_should_call_chunks_in_order() {
    let mock = MockTranscriber::working().with_delay("talk_chunk_000.mp3", Duration::from_secs(3));
    let orchestrator = ChunkOrchestrator::new(Arc::new(mock.clone()), options(3, 6000));

    let transcript = assert_ok!(
        orchestrator
            .run_sequential(&chunk_paths(3), 60.0, &CancellationToken::new(), |_, _| {})
            .await
    );

    assert_eq!(
        mock.calls(),
        vec!["talk_chunk_000.mp3", "talk_chunk_001.mp3", "talk_chunk_002.mp3"]
    );
    assert_eq!(transcript.tokens[2].start, 120.5);
}
