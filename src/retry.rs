//! Countdown retry after rate limiting
//!
//! A rate-limited fetch starts a countdown of the server-provided wait. Each
//! tick takes one second off; the tick that would reach zero returns the
//! controller to idle and asks the caller to re-issue the failed operation
//! once. There is no retry cap: if the retry is rate limited again a fresh
//! countdown starts.

use crate::error::MonitorError;
use serde::Serialize;

/// Countdown state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "seconds_remaining", rename_all = "snake_case")]
pub enum RetryState {
    #[default]
    Idle,
    CountingDown(u64),
}

/// Result of one countdown tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing was counting down
    Idle,
    /// Still waiting; seconds left
    Waiting(u64),
    /// The countdown finished; re-issue the operation now
    Retry,
}

#[derive(Debug, Clone, Default)]
pub struct RetryCountdown {
    state: RetryState,
    retries_issued: u64,
}

impl RetryCountdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RetryState {
        self.state
    }

    pub fn seconds_remaining(&self) -> Option<u64> {
        match self.state {
            RetryState::CountingDown(n) => Some(n),
            RetryState::Idle => None,
        }
    }

    pub fn is_counting(&self) -> bool {
        matches!(self.state, RetryState::CountingDown(_))
    }

    /// Retries handed out since creation
    pub fn retries_issued(&self) -> u64 {
        self.retries_issued
    }

    /// Feed a fetch failure; returns true when a countdown started
    pub fn on_failure(&mut self, error: &MonitorError) -> bool {
        match error.wait_seconds() {
            Some(wait) => {
                self.state = RetryState::CountingDown(wait.max(1));
                true
            }
            None => {
                self.state = RetryState::Idle;
                false
            }
        }
    }

    /// A successful fetch leaves nothing to retry
    pub fn on_success(&mut self) {
        self.state = RetryState::Idle;
    }

    /// Drop any pending countdown without retrying
    pub fn cancel(&mut self) {
        self.state = RetryState::Idle;
    }

    /// Advance by one second
    pub fn tick(&mut self) -> TickOutcome {
        match self.state {
            RetryState::Idle => TickOutcome::Idle,
            RetryState::CountingDown(n) if n <= 1 => {
                self.state = RetryState::Idle;
                self.retries_issued += 1;
                TickOutcome::Retry
            }
            RetryState::CountingDown(n) => {
                self.state = RetryState::CountingDown(n - 1);
                TickOutcome::Waiting(n - 1)
            }
        }
    }
}
