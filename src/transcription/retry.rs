/*!
 * Per-chunk retry state machine.
 *
 * A chunk moves `Pending -> InFlight -> Succeeded`, or on a retryable failure
 * `InFlight -> RetryWait -> InFlight` until the attempt budget is spent and it
 * ends `Exhausted`. Non-retryable failures end in `Failed`. Cancellation moves
 * any non-terminal state to `Cancelled`.
 */

use std::time::Duration;

use crate::errors::ProviderError;

/// Attempt budget and backoff schedule
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts per chunk, including the first
    pub max_attempts: u32,
    /// Wait before the second attempt; doubled for each later one
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Wait after the given failed attempt (1-based): base, 2*base, 4*base, ...
    pub fn backoff(&self, failed_attempt: u32) -> Duration {
        let exponent = failed_attempt.saturating_sub(1).min(16);
        self.base_delay * (1u32 << exponent)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkState {
    Pending,
    InFlight { attempt: u32 },
    RetryWait { attempt: u32, delay: Duration },
    Succeeded { attempts: u32 },
    Exhausted { attempts: u32 },
    Failed { attempts: u32 },
    Cancelled,
}

impl ChunkState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Succeeded { .. } | Self::Exhausted { .. } | Self::Failed { .. } | Self::Cancelled
        )
    }
}

/// What the worker should do after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait this long, then attempt again
    Backoff(Duration),
    /// Attempt budget spent
    Exhausted,
    /// Error is not retryable
    GiveUp,
}

/// Retry bookkeeping for one chunk
#[derive(Debug, Clone)]
pub struct ChunkRetry {
    policy: RetryPolicy,
    state: ChunkState,
    attempts: u32,
}

impl ChunkRetry {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            state: ChunkState::Pending,
            attempts: 0,
        }
    }

    pub fn state(&self) -> ChunkState {
        self.state
    }

    /// Attempts started so far
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Enter `InFlight`; returns the 1-based attempt number
    pub fn begin_attempt(&mut self) -> u32 {
        debug_assert!(matches!(self.state, ChunkState::Pending | ChunkState::RetryWait { .. }));
        self.attempts += 1;
        self.state = ChunkState::InFlight { attempt: self.attempts };
        self.attempts
    }

    pub fn succeed(&mut self) {
        self.state = ChunkState::Succeeded { attempts: self.attempts };
    }

    /// Record a failed attempt and decide what happens next
    pub fn fail(&mut self, error: &ProviderError) -> RetryDecision {
        if !error.is_retryable() {
            self.state = ChunkState::Failed { attempts: self.attempts };
            return RetryDecision::GiveUp;
        }

        if self.attempts >= self.policy.max_attempts {
            self.state = ChunkState::Exhausted { attempts: self.attempts };
            return RetryDecision::Exhausted;
        }

        let delay = self.policy.backoff(self.attempts);
        self.state = ChunkState::RetryWait {
            attempt: self.attempts,
            delay,
        };
        RetryDecision::Backoff(delay)
    }

    pub fn cancel(&mut self) {
        if !self.state.is_terminal() {
            self.state = ChunkState::Cancelled;
        }
    }
}
