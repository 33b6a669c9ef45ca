//! # Harness Configuration
//!
//! Operator settings, read from JSON. Every field has a default, so an empty
//! object is a valid configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::HarnessError;
use crate::testing::DEFAULT_FAILURE_MESSAGE;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HarnessConfig {
    /// Media types whose bodies are decoded as JSON before the script runs.
    #[serde(default = "default_json_content_types")]
    pub json_content_types: Vec<String>,
    /// Message of an assertion raised without one.
    #[serde(default = "default_fail_message")]
    pub fail_message: String,
}

fn default_json_content_types() -> Vec<String> {
    vec!["application/json".to_string()]
}

fn default_fail_message() -> String {
    DEFAULT_FAILURE_MESSAGE.to_string()
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            json_content_types: default_json_content_types(),
            fail_message: default_fail_message(),
        }
    }
}

impl HarnessConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, HarnessError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, HarnessError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| HarnessError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn is_json_content_type(&self, content_type: &str) -> bool {
        self.json_content_types
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(content_type.trim()))
    }
}
