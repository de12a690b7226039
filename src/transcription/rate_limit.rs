/*!
 * Shared token bucket limiting transcription requests per minute.
 */

use parking_lot::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::errors::TranscriptionError;

#[derive(Debug)]
struct BucketState {
    /// Available tokens; negative while callers hold reservations
    tokens: f64,
    last_refill: Instant,
}

/// Token bucket shared by all chunk workers.
///
/// Each caller reserves a token immediately and then waits until the reservation
/// matures, so waiters are served in arrival order. The bucket starts full.
#[derive(Debug)]
pub struct TokenBucket {
    capacity: f64,
    /// Tokens added per second
    refill_rate: f64,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    /// Create a bucket holding `capacity` tokens refilled at `refill_rate` per second
    pub fn new(capacity: u32, refill_rate: f64) -> Self {
        let capacity = capacity.max(1) as f64;
        Self {
            capacity,
            refill_rate,
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Single-token bucket refilled at `requests_per_minute / 60` per second
    pub fn per_minute(requests_per_minute: u32) -> Self {
        Self::new(1, f64::from(requests_per_minute.max(1)) / 60.0)
    }

    /// Wait for a token, giving it back if `cancel` fires first
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<(), TranscriptionError> {
        if cancel.is_cancelled() {
            return Err(TranscriptionError::Cancelled);
        }

        let wait = self.reserve();
        if wait.is_zero() {
            return Ok(());
        }

        tokio::select! {
            _ = cancel.cancelled() => {
                self.release();
                Err(TranscriptionError::Cancelled)
            }
            _ = tokio::time::sleep(wait) => Ok(()),
        }
    }

    /// Take one token and return how long until it is actually available
    fn reserve(&self) -> Duration {
        let mut state = self.state.lock();
        self.refill(&mut state);

        state.tokens -= 1.0;
        if state.tokens >= 0.0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(-state.tokens / self.refill_rate)
        }
    }

    fn release(&self) {
        let mut state = self.state.lock();
        self.refill(&mut state);
        state.tokens = (state.tokens + 1.0).min(self.capacity);
    }

    fn refill(&self, state: &mut BucketState) {
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.refill_rate).min(self.capacity);
        state.last_refill = now;
    }
}
