//! Test assertions that report instead of panicking

use std::fmt::Debug;
use thiserror::Error;

/// A check the scenario expected to hold but did not
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct AssertionFailure {
    message: String,
}

impl AssertionFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Fail unless `actual == expected`
pub fn assert_eq<T: PartialEq + Debug + ?Sized>(
    what: &str,
    expected: &T,
    actual: &T,
) -> Result<(), AssertionFailure> {
    if actual == expected {
        Ok(())
    } else {
        Err(AssertionFailure::new(format!(
            "{}: expected {:?}, got {:?}",
            what, expected, actual
        )))
    }
}

/// Fail unless `value` is true
pub fn assert_true(what: &str, value: bool) -> Result<(), AssertionFailure> {
    if value {
        Ok(())
    } else {
        Err(AssertionFailure::new(format!("{}: expected true, got false", what)))
    }
}
