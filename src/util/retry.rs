use std::time::Duration;

use failsafe::backoff::{self, Constant};

/// Only transient failures are worth another attempt. Anything that produced an HTTP response is
///  not a failure at this level at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// timeout, connection dropped before a response arrived
    Transient,
    /// malformed request, DNS failure, refused connection, ...
    Terminal,
}

#[derive(Debug, PartialEq, Eq)]
pub enum RetryDecision {
    RetryAfter(Duration),
    GiveUp,
}

/// Retry state for a single request: counts attempts and hands out delays.
pub struct RetryPolicy {
    max_attempts: u32,
    attempts: u32,
    backoff: Constant,
}
impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> RetryPolicy {
        RetryPolicy {
            max_attempts: max_attempts.max(1),
            attempts: 0,
            backoff: backoff::constant(delay),
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Registers a failed attempt and decides what happens next
    pub fn on_failure(&mut self, class: FailureClass) -> RetryDecision {
        self.attempts += 1;

        match class {
            FailureClass::Terminal => RetryDecision::GiveUp,
            FailureClass::Transient if self.attempts >= self.max_attempts => RetryDecision::GiveUp,
            FailureClass::Transient => RetryDecision::RetryAfter(self.backoff.next().unwrap_or_default()),
        }
    }
}
