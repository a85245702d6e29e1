//! Bounded poll loop
//!
//! Evaluates a check up to `max_attempts` times with a fixed blocking
//! sleep in between, stopping at the first value that satisfies the
//! predicate. Check errors abort the poll; only "not yet" is retried.

use tracing::{debug, info, warn};

use crate::config::{PollAttempt, PollConfig};
use crate::sleeper::{Sleeper, ThreadSleeper};

/// Outcome of one poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollResult<T> {
    /// The check produced a satisfying value
    Success(T),
    /// The attempt budget ran out; carries whatever the final check returned
    TimedOut(Option<T>),
}

impl<T> PollResult<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, PollResult::Success(_))
    }

    pub fn is_timed_out(&self) -> bool {
        matches!(self, PollResult::TimedOut(_))
    }

    /// The satisfying value, if the poll succeeded
    pub fn success(self) -> Option<T> {
        match self {
            PollResult::Success(value) => Some(value),
            PollResult::TimedOut(_) => None,
        }
    }

    /// The most recent value seen, whether or not it satisfied the predicate
    pub fn last_observed(&self) -> Option<&T> {
        match self {
            PollResult::Success(value) => Some(value),
            PollResult::TimedOut(value) => value.as_ref(),
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            PollResult::Success(value) => Some(value),
            PollResult::TimedOut(value) => value,
        }
    }
}

/// Per-poll state machine: `Pending -> {Succeeded | TimedOut}`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Pending,
    Succeeded,
    TimedOut,
}

impl PollState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PollState::Pending)
    }

    /// Transition after evaluating the check once. Terminal states are sticky.
    pub fn advance(self, satisfied: bool, last_attempt: bool) -> PollState {
        match self {
            PollState::Pending if satisfied => PollState::Succeeded,
            PollState::Pending if last_attempt => PollState::TimedOut,
            other => other,
        }
    }
}

/// Reusable poller bundling a config, a sleeper and a log label
#[derive(Debug, Clone)]
pub struct BoundedPoller<S = ThreadSleeper> {
    config: PollConfig,
    sleeper: S,
    label: String,
}

impl BoundedPoller<ThreadSleeper> {
    /// Poller that really blocks the calling thread between attempts
    pub fn new(config: PollConfig) -> Self {
        Self::with_sleeper(config, ThreadSleeper)
    }
}

impl<S: Sleeper> BoundedPoller<S> {
    pub fn with_sleeper(config: PollConfig, sleeper: S) -> Self {
        Self {
            config,
            sleeper,
            label: "poll".to_string(),
        }
    }

    /// Name attached to every log line of this poller
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    pub fn sleeper(&self) -> &S {
        &self.sleeper
    }

    /// Poll until `check` returns a present value
    pub fn poll<T, E, F>(&self, check: F) -> Result<PollResult<T>, E>
    where
        F: FnMut(PollAttempt) -> Result<Option<T>, E>,
    {
        self.poll_until(check, |_| true)
    }

    /// Poll until `check` returns a present value for which `predicate` holds
    ///
    /// Returns as soon as a satisfying value is seen. Sleeps the configured
    /// interval between unsuccessful attempts, but not after the last one.
    ///
    /// # Errors
    ///
    /// Any error returned by `check` is passed through unchanged and ends
    /// the poll immediately.
    pub fn poll_until<T, E, F, P>(&self, mut check: F, predicate: P) -> Result<PollResult<T>, E>
    where
        F: FnMut(PollAttempt) -> Result<Option<T>, E>,
        P: Fn(&T) -> bool,
    {
        let max_attempts = self.config.max_attempts();
        let interval = self.config.interval();
        let mut state = PollState::Pending;
        let mut attempt = PollAttempt::first(max_attempts);

        loop {
            let observed = check(attempt)?;
            let satisfied = observed.as_ref().is_some_and(|value| predicate(value));
            state = state.advance(satisfied, attempt.is_last());

            debug!(
                label = %self.label,
                attempt = attempt.number(),
                max_attempts,
                present = observed.is_some(),
                satisfied,
                ?state,
                "poll attempt evaluated"
            );

            if state.is_terminal() {
                return Ok(match (state, observed) {
                    (PollState::Succeeded, Some(value)) => {
                        info!(label = %self.label, attempts = attempt.number(), "poll succeeded");
                        PollResult::Success(value)
                    }
                    (_, observed) => {
                        warn!(
                            label = %self.label,
                            attempts = attempt.number(),
                            "poll timed out without a satisfying value"
                        );
                        PollResult::TimedOut(observed)
                    }
                });
            }

            if !interval.is_zero() {
                self.sleeper.sleep(interval);
            }

            attempt = match attempt.next() {
                Some(next) => next,
                None => return Ok(PollResult::TimedOut(None)),
            };
        }
    }
}

/// Poll with a real blocking sleep until `check` returns a present value
pub fn poll<T, E, F>(config: &PollConfig, check: F) -> Result<PollResult<T>, E>
where
    F: FnMut(PollAttempt) -> Result<Option<T>, E>,
{
    BoundedPoller::new(*config).poll(check)
}

/// Poll with a real blocking sleep until `predicate` accepts a checked value
pub fn poll_until<T, E, F, P>(
    config: &PollConfig,
    check: F,
    predicate: P,
) -> Result<PollResult<T>, E>
where
    F: FnMut(PollAttempt) -> Result<Option<T>, E>,
    P: Fn(&T) -> bool,
{
    BoundedPoller::new(*config).poll_until(check, predicate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sleeper::RecordingSleeper;
    use rstest::rstest;
    use std::convert::Infallible;
    use std::time::Duration;

    fn poller(max_attempts: u32) -> BoundedPoller<RecordingSleeper> {
        let config = PollConfig::new(max_attempts, Duration::from_secs(5)).unwrap();
        BoundedPoller::with_sleeper(config, RecordingSleeper::new())
    }

    /// Check that replays a fixed script of observations
    fn scripted<'a, T: Clone + 'a>(
        script: Vec<Option<T>>,
        calls: &'a mut usize,
    ) -> impl FnMut(PollAttempt) -> Result<Option<T>, Infallible> + 'a {
        move |attempt| {
            *calls += 1;
            Ok(script.get(attempt.index() as usize).cloned().flatten())
        }
    }

    #[test]
    fn test_connected_on_third_attempt() {
        let poller = poller(3);
        let mut calls = 0;
        let script = vec![None, None, Some("Connected".to_string())];

        let result = poller.poll(scripted(script, &mut calls)).unwrap();

        assert_eq!(result, PollResult::Success("Connected".to_string()));
        assert_eq!(calls, 3);
        assert_eq!(poller.sleeper().count(), 2);
    }

    #[test]
    fn test_never_present_times_out_absent() {
        let poller = poller(2);
        let mut calls = 0;

        let result = poller.poll(scripted::<String>(vec![None, None], &mut calls)).unwrap();

        assert_eq!(result, PollResult::TimedOut(None));
        assert_eq!(calls, 2);
        assert_eq!(poller.sleeper().count(), 1);
    }

    #[rstest]
    #[case(vec!["Disconnected", "Disconnected", "Connected"], true, 3)]
    #[case(vec!["Connected"], true, 1)]
    #[case(vec!["Disconnected", "Disconnected", "Disconnected"], false, 3)]
    fn test_string_equality_predicate(
        #[case] statuses: Vec<&str>,
        #[case] expect_success: bool,
        #[case] expected_calls: usize,
    ) {
        let poller = poller(3);
        let mut calls = 0;
        let script: Vec<Option<String>> = statuses
            .into_iter()
            .map(|s| Some(s.to_string()))
            .collect();

        let result = poller
            .poll_until(scripted(script, &mut calls), |status| status == "Connected")
            .unwrap();

        assert_eq!(result.is_success(), expect_success);
        assert_eq!(calls, expected_calls);
        if !expect_success {
            assert_eq!(result.last_observed().map(String::as_str), Some("Disconnected"));
        }
    }

    #[test]
    fn test_last_observed_may_revert_to_absent() {
        let poller = poller(2);
        let mut calls = 0;

        let result = poller
            .poll_until(scripted(vec![Some(1u32), None], &mut calls), |v| *v > 5)
            .unwrap();

        assert_eq!(result, PollResult::TimedOut(None));
    }

    #[test]
    fn test_check_error_propagates_immediately() {
        let poller = poller(5);
        let mut calls = 0;

        let result: Result<PollResult<String>, String> = poller.poll(|attempt| {
            calls += 1;
            if attempt.index() == 1 {
                Err("connection reset".to_string())
            } else {
                Ok(None)
            }
        });

        assert_eq!(result, Err("connection reset".to_string()));
        assert_eq!(calls, 2);
        assert_eq!(poller.sleeper().count(), 1);
    }

    #[test]
    fn test_zero_interval_never_sleeps() {
        let config = PollConfig::new(4, Duration::ZERO).unwrap();
        let poller = BoundedPoller::with_sleeper(config, RecordingSleeper::new());
        let mut calls = 0;

        let result = poller.poll(scripted::<u8>(vec![None; 4], &mut calls)).unwrap();

        assert!(result.is_timed_out());
        assert_eq!(calls, 4);
        assert_eq!(poller.sleeper().count(), 0);
    }

    #[test]
    fn test_sleeps_use_configured_interval() {
        let poller = poller(3);
        let mut calls = 0;

        poller.poll(scripted::<u8>(vec![None; 3], &mut calls)).unwrap();

        assert_eq!(poller.sleeper().calls(), vec![Duration::from_secs(5); 2]);
    }

    #[test]
    fn test_state_machine_terminal_states_are_sticky() {
        assert_eq!(PollState::Pending.advance(false, false), PollState::Pending);
        assert_eq!(PollState::Pending.advance(true, true), PollState::Succeeded);
        assert_eq!(PollState::Pending.advance(false, true), PollState::TimedOut);
        assert_eq!(PollState::Succeeded.advance(false, true), PollState::Succeeded);
        assert_eq!(PollState::TimedOut.advance(true, false), PollState::TimedOut);
        assert!(!PollState::Pending.is_terminal());
        assert!(PollState::TimedOut.is_terminal());
    }

    #[test]
    fn test_poll_result_accessors() {
        let success = PollResult::Success(7);
        assert_eq!(success.last_observed(), Some(&7));
        assert_eq!(success.clone().success(), Some(7));
        assert_eq!(success.into_value(), Some(7));

        let timed_out = PollResult::TimedOut(Some(3));
        assert!(timed_out.is_timed_out());
        assert_eq!(timed_out.clone().success(), None);
        assert_eq!(timed_out.into_value(), Some(3));
    }
}
