//! # Testing & Assertions
//!
//! Assertion primitives available to scripts, the deep equality they rely
//! on, and the registry of named tests a script declares for the caller to
//! run once the script has finished.

pub mod assertions;
pub mod equality;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub use assertions::{AssertionError, DEFAULT_FAILURE_MESSAGE, Truthy, assert, assert_equal};
pub use equality::is_equal;

use crate::error::ScriptError;
use crate::value::Value;

/// Body of a registered test. It owns whatever it captured from the script.
pub type TestProcedure = Box<dyn Fn() -> Result<Value, ScriptError>>;

/// Named tests in registration order. Registering a name again replaces the
/// procedure but keeps its original position.
#[derive(Default)]
pub struct TestRegistry {
    entries: Vec<(String, Option<TestProcedure>)>,
}

impl TestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, procedure: Option<TestProcedure>) {
        let name = name.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = procedure,
            None => self.entries.push((name, procedure)),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(existing, _)| existing == name)
    }

    /// `Some(None)` for a placeholder registered without a procedure.
    pub fn get(&self, name: &str) -> Option<Option<&TestProcedure>> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, procedure)| procedure.as_ref())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&TestProcedure>)> {
        self.entries
            .iter()
            .map(|(name, procedure)| (name.as_str(), procedure.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for TestRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|(name, procedure)| {
                (name, if procedure.is_some() { "<procedure>" } else { "<placeholder>" })
            }))
            .finish()
    }
}

/// Outcome of one registered test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
    pub success: bool,
}

/// What a finished script hands back to the caller: its log, the variables
/// it changed, and its test outcomes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScriptResult {
    pub stdout: String,
    pub properties: BTreeMap<String, serde_json::Value>,
    pub tests: Vec<TestResult>,
}

impl ScriptResult {
    pub fn passed(&self) -> usize {
        self.tests.iter().filter(|test| test.success).count()
    }

    pub fn failed(&self) -> usize {
        self.tests.len() - self.passed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn procedure(value: i32) -> Option<TestProcedure> {
        Some(Box::new(move || Ok(Value::from(value))))
    }

    #[test]
    fn register_keeps_order_and_overwrites_in_place() {
        let mut registry = TestRegistry::new();
        registry.register("first", procedure(1));
        registry.register("second", None);
        registry.register("first", procedure(2));

        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["first", "second"]);
        let first = registry.get("first").flatten().unwrap();
        assert_eq!(first().unwrap(), Value::from(2));
        assert!(matches!(registry.get("second"), Some(None)));
        assert!(registry.get("third").is_none());
    }

    #[test]
    fn placeholder_can_be_replaced() {
        let mut registry = TestRegistry::new();
        registry.register("pending", None);
        registry.register("pending", procedure(3));
        assert!(registry.get("pending").flatten().is_some());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn result_counts() {
        let result = ScriptResult {
            tests: vec![
                TestResult {
                    name: "a".into(),
                    result: None,
                    error: None,
                    success: true,
                },
                TestResult {
                    name: "b".into(),
                    result: None,
                    error: Some("Assert failed".into()),
                    success: false,
                },
            ],
            ..Default::default()
        };
        assert_eq!(result.passed(), 1);
        assert_eq!(result.failed(), 1);
    }

    #[test]
    fn result_serializes_with_plain_field_names() {
        let result = ScriptResult {
            stdout: "hi\n".into(),
            ..Default::default()
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["stdout"], "hi\n");
        assert!(json["tests"].as_array().unwrap().is_empty());
    }
}
