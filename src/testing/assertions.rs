use thiserror::Error;

use super::equality;
use crate::value::Value;

/// Message used when an assertion is given none.
pub const DEFAULT_FAILURE_MESSAGE: &str = "Assert failed";

/// A failed `assert` or `is_equal`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct AssertionError {
    pub message: String,
}

impl AssertionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Anything a script can test for truth.
pub trait Truthy {
    fn is_truthy(&self) -> bool;
}

impl Truthy for bool {
    fn is_truthy(&self) -> bool {
        *self
    }
}

impl Truthy for Value {
    fn is_truthy(&self) -> bool {
        Value::is_truthy(self)
    }
}

impl Truthy for &Value {
    fn is_truthy(&self) -> bool {
        Value::is_truthy(self)
    }
}

impl<T> Truthy for Option<T> {
    fn is_truthy(&self) -> bool {
        self.is_some()
    }
}

/// Fail with `message` (or the default text) unless `condition` is truthy.
pub fn assert(condition: impl Truthy, message: Option<&str>) -> Result<(), AssertionError> {
    if condition.is_truthy() {
        Ok(())
    } else {
        Err(AssertionError::new(message.unwrap_or(DEFAULT_FAILURE_MESSAGE)))
    }
}

/// Fail unless the two values are structurally equal.
pub fn assert_equal(first: &Value, second: &Value, message: Option<&str>) -> Result<(), AssertionError> {
    assert(equality::is_equal(first, second), message)
}
