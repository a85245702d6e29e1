//! Error types for poll configuration

use thiserror::Error;

/// Errors raised when building a [`PollConfig`](crate::PollConfig)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PollConfigError {
    /// A poll must evaluate its check at least once
    #[error("max_attempts must be at least 1")]
    ZeroAttempts,

    /// Interval was negative, NaN or too large to represent
    #[error("Invalid poll interval: {0}")]
    InvalidInterval(String),
}

/// Type alias for results that can return a PollConfigError
pub type Result<T> = std::result::Result<T, PollConfigError>;
