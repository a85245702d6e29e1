//! Pluggable blocking sleep used between poll attempts

use std::time::Duration;

/// Something that can block the current thread for a duration
///
/// The poller never calls `std::thread::sleep` directly so tests can
/// substitute a recording implementation and run without real delays.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Real blocking sleep on the caller's thread
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

impl<S: Sleeper + ?Sized> Sleeper for &S {
    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

impl<S: Sleeper + ?Sized> Sleeper for Box<S> {
    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use recording::RecordingSleeper;

#[cfg(any(test, feature = "test-support"))]
mod recording {
    use super::Sleeper;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Records requested sleeps instead of blocking
    #[derive(Debug, Default)]
    pub struct RecordingSleeper {
        calls: Mutex<Vec<Duration>>,
    }

    impl RecordingSleeper {
        pub fn new() -> Self {
            Self::default()
        }

        /// Every duration passed to `sleep`, in order
        pub fn calls(&self) -> Vec<Duration> {
            self.calls.lock().map(|c| c.clone()).unwrap_or_default()
        }

        pub fn count(&self) -> usize {
            self.calls.lock().map(|c| c.len()).unwrap_or_default()
        }

        /// Sum of all simulated delays
        pub fn total(&self) -> Duration {
            self.calls().into_iter().sum()
        }
    }

    impl Sleeper for RecordingSleeper {
        fn sleep(&self, duration: Duration) {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push(duration);
            }
        }
    }
}
