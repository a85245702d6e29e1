//! Bounded polling for eventually consistent remote state
//!
//! Repeatedly evaluates a caller-supplied check, sleeping a fixed interval
//! between attempts, until the check yields a satisfying value or the
//! attempt budget is spent. Everything runs on the caller's thread.
//!
//! # Example
//!
//! ```rust
//! use du_poller::{BoundedPoller, PollConfig, PollResult};
//! use std::time::Duration;
//!
//! let config = PollConfig::new(3, Duration::ZERO)?;
//! let statuses = ["Disconnected", "Connected"];
//!
//! let result = BoundedPoller::new(config)
//!     .label("connectivity")
//!     .poll_until(
//!         |attempt| Ok::<_, std::convert::Infallible>(
//!             statuses.get(attempt.index() as usize).map(|s| s.to_string()),
//!         ),
//!         |status| status == "Connected",
//!     )?;
//!
//! assert_eq!(result, PollResult::Success("Connected".to_string()));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod config;
mod error;
mod poller;
mod sleeper;

pub use config::{PollAttempt, PollConfig};
pub use error::{PollConfigError, Result};
pub use poller::{poll, poll_until, BoundedPoller, PollResult, PollState};
pub use sleeper::{Sleeper, ThreadSleeper};

#[cfg(any(test, feature = "test-support"))]
pub use sleeper::RecordingSleeper;
