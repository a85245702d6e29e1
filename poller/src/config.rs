//! Poll configuration and attempt bookkeeping

use std::num::NonZeroU32;
use std::time::Duration;

use crate::error::{PollConfigError, Result};

/// Attempt budget and spacing for a single poll
///
/// Immutable once built; a poll reads it but never changes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    max_attempts: NonZeroU32,
    interval: Duration,
}

impl PollConfig {
    /// Create a configuration from an attempt count and a fixed interval
    ///
    /// # Errors
    ///
    /// Returns [`PollConfigError::ZeroAttempts`] when `max_attempts` is 0.
    pub fn new(max_attempts: u32, interval: Duration) -> Result<Self> {
        let max_attempts = NonZeroU32::new(max_attempts).ok_or(PollConfigError::ZeroAttempts)?;
        Ok(Self {
            max_attempts,
            interval,
        })
    }

    /// Create a configuration with the interval given in (possibly fractional) seconds
    ///
    /// # Errors
    ///
    /// Returns [`PollConfigError::InvalidInterval`] for negative, NaN or
    /// overflowing values, in addition to the errors of [`PollConfig::new`].
    pub fn from_secs_f64(max_attempts: u32, interval_seconds: f64) -> Result<Self> {
        let interval = Duration::try_from_secs_f64(interval_seconds).map_err(|e| {
            PollConfigError::InvalidInterval(format!("{}s ({})", interval_seconds, e))
        })?;
        Self::new(max_attempts, interval)
    }

    /// Maximum number of times the check is evaluated
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts.get()
    }

    /// Delay between two unsuccessful attempts
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Upper bound of wall-clock time spent sleeping when every attempt fails
    pub fn max_wait(&self) -> Duration {
        self.interval
            .checked_mul(self.max_attempts() - 1)
            .unwrap_or(Duration::MAX)
    }
}

/// Ordinal of one check evaluation within a poll
///
/// Invariant: `0 <= index < max_attempts`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollAttempt {
    index: u32,
    max_attempts: u32,
}

impl PollAttempt {
    pub(crate) fn first(max_attempts: u32) -> Self {
        Self {
            index: 0,
            max_attempts,
        }
    }

    pub(crate) fn next(self) -> Option<Self> {
        if self.is_last() {
            None
        } else {
            Some(Self {
                index: self.index + 1,
                max_attempts: self.max_attempts,
            })
        }
    }

    /// 0-based index
    pub fn index(&self) -> u32 {
        self.index
    }

    /// 1-based attempt number, for logs
    pub fn number(&self) -> u32 {
        self.index + 1
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Whether this is the final attempt of the budget
    pub fn is_last(&self) -> bool {
        self.index + 1 >= self.max_attempts
    }
}
