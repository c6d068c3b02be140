//! Transfer retry policy

use std::time::Duration;

/// Bounded exponential backoff policy for transient upload failures.
///
/// `budget` is the number of automatic retries after the first attempt;
/// the wait before retry k is `base_delay * 2^k`. A budget of 3 with a
/// 2 s base therefore waits 2 s, 4 s, 8 s before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    budget: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    pub const DEFAULT_BUDGET: u32 = 3;
    pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(2000);

    pub fn new(budget: u32, base_delay: Duration) -> Self {
        Self { budget, base_delay }
    }

    pub fn budget(&self) -> u32 {
        self.budget
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Total attempts including the initial one
    pub fn max_attempts(&self) -> u32 {
        self.budget + 1
    }

    /// The doubling delay schedule, one entry per retry
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..self.budget).map(move |k| self.base_delay.saturating_mul(1 << k))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            budget: Self::DEFAULT_BUDGET,
            base_delay: Self::DEFAULT_BASE_DELAY,
        }
    }
}
