use std::fmt::Display;
use std::path::PathBuf;

use thiserror::Error;

use crate::testing::AssertionError;
use crate::value::Value;

/// Failure raised while a script body runs.
///
/// `Display` is the bare message, so the harness log line reads
/// `error <message>`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScriptError {
    /// `assert` / `is_equal` did not hold.
    #[error(transparent)]
    Assertion(#[from] AssertionError),

    /// A value thrown by the script.
    #[error("{0}")]
    Thrown(String),

    /// An operation applied to a value of the wrong kind.
    #[error("TypeError: {0}")]
    Type(String),

    /// The script body panicked; the payload text is kept.
    #[error("panic: {0}")]
    Panic(String),
}

impl ScriptError {
    /// Throw an arbitrary value; its string coercion becomes the message.
    pub fn throw(value: impl Into<Value>) -> Self {
        ScriptError::Thrown(value.into().to_string())
    }

    pub fn type_error(message: impl Display) -> Self {
        ScriptError::Type(message.to_string())
    }
}

/// Failure at the edges of the harness: configuration and response intake.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("failed to read config file `{path}`: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("failed to read response: {0}")]
    Response(#[from] reqwest::Error),
}
