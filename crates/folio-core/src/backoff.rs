use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How long to wait between attempts of a remote read.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum Delay {
    Fixed { delay_ms: u64 },
    Exponential { base_ms: u64, max_ms: u64 },
}

impl Default for Delay {
    fn default() -> Self {
        Delay::Fixed { delay_ms: 1000 }
    }
}

/// Pure retry policy for remote reads. Mutations are never retried.
///
/// Default: 3 attempts, fixed 1s between them.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Delay,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3, delay: Delay::default() }
    }
}

impl RetryPolicy {
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self { max_attempts, delay: Delay::Fixed { delay_ms: delay.as_millis() as u64 } }
    }

    pub fn exponential(max_attempts: u32, base: Duration, max: Duration) -> Self {
        Self {
            max_attempts,
            delay: Delay::Exponential { base_ms: base.as_millis() as u64, max_ms: max.as_millis() as u64 },
        }
    }

    /// A single attempt, no waiting.
    pub fn none() -> Self {
        Self { max_attempts: 1, delay: Delay::Fixed { delay_ms: 0 } }
    }

    /// Delay before `attempt_number` (1-based). The first attempt is immediate.
    pub fn delay_before(&self, attempt_number: u32) -> Duration {
        if attempt_number <= 1 {
            return Duration::ZERO;
        }
        match self.delay {
            Delay::Fixed { delay_ms } => Duration::from_millis(delay_ms),
            Delay::Exponential { base_ms, max_ms } => {
                let shift = (attempt_number - 2).min(32);
                let ms = base_ms.saturating_mul(1u64 << shift).min(max_ms);
                Duration::from_millis(ms)
            }
        }
    }

    pub fn allows(&self, attempt_number: u32) -> bool {
        attempt_number <= self.max_attempts.max(1)
    }
}
