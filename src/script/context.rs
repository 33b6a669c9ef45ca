use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;

use tracing::error;

use super::run_guarded;
use crate::environment::PropertyStore;
use crate::error::ScriptError;
use crate::testing::{
    AssertionError, DEFAULT_FAILURE_MESSAGE, ScriptResult, TestRegistry, TestResult, Truthy, equality,
};
use crate::value::Value;

/// The `client` a script works with: variables, assertions, a private log
/// and the tests it registers.
#[derive(Debug)]
pub struct ScriptContext {
    properties: PropertyStore,
    stdout: Vec<String>,
    tests: TestRegistry,
    fail_message: String,
}

impl ScriptContext {
    pub fn new(globals: HashMap<String, Value>) -> Self {
        Self {
            properties: PropertyStore::with_vars(globals),
            stdout: Vec::new(),
            tests: TestRegistry::new(),
            fail_message: DEFAULT_FAILURE_MESSAGE.to_string(),
        }
    }

    pub(crate) fn with_fail_message(mut self, fail_message: impl Into<String>) -> Self {
        self.fail_message = fail_message.into();
        self
    }

    pub fn properties(&self) -> &PropertyStore {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut PropertyStore {
        &mut self.properties
    }

    /// Register a named test to run after the script. A repeated name
    /// replaces the earlier procedure.
    pub fn test<F>(&mut self, name: impl Into<String>, procedure: F)
    where
        F: Fn() -> Result<Value, ScriptError> + 'static,
    {
        self.tests.register(name, Some(Box::new(procedure)));
    }

    /// Register a test name with no procedure yet.
    pub fn test_placeholder(&mut self, name: impl Into<String>) {
        self.tests.register(name, None);
    }

    pub fn assert(&self, condition: impl Truthy, message: Option<&str>) -> Result<(), AssertionError> {
        if condition.is_truthy() {
            Ok(())
        } else {
            Err(AssertionError::new(message.unwrap_or(&self.fail_message)))
        }
    }

    pub fn is_equal(&self, first: &Value, second: &Value, message: Option<&str>) -> Result<(), AssertionError> {
        self.assert(equality::is_equal(first, second), message)
    }

    pub fn log(&mut self, text: impl Display) {
        self.stdout.push(format!("{text}\n"));
    }

    /// Log lines, each ending in a newline.
    pub fn stdout(&self) -> &[String] {
        &self.stdout
    }

    pub fn tests(&self) -> &TestRegistry {
        &self.tests
    }

    /// Run every registered test in registration order.
    pub fn run_tests(&self) -> Vec<TestResult> {
        self.tests
            .iter()
            .map(|(name, procedure)| {
                let outcome = match procedure {
                    Some(procedure) => run_guarded(procedure),
                    None => Err(ScriptError::Thrown("test has no procedure".to_string())),
                };
                match outcome {
                    Ok(value) => TestResult {
                        name: name.to_string(),
                        result: value.to_json(),
                        error: None,
                        success: true,
                    },
                    Err(err) => {
                        error!(test = name, error = %err, "test execution failed");
                        TestResult {
                            name: name.to_string(),
                            result: None,
                            error: Some(err.to_string()),
                            success: false,
                        }
                    }
                }
            })
            .collect()
    }

    /// Run the registered tests and collect what the caller persists: the
    /// log, the changed variables, the test outcomes.
    ///
    /// Cleared and falsy variables are reported as the empty string; object
    /// values have no stored form and are left out.
    pub fn into_result(self) -> ScriptResult {
        let tests = self.run_tests();
        let mut properties = BTreeMap::new();
        for name in self.properties.updated() {
            let stored = match self.properties.get(name) {
                Some(Value::Object(_)) => continue,
                Some(value) if value.is_truthy() => value.to_json(),
                _ => None,
            };
            properties.insert(
                name.clone(),
                stored.unwrap_or_else(|| serde_json::Value::String(String::new())),
            );
        }

        ScriptResult {
            stdout: self.stdout.concat(),
            properties,
            tests,
        }
    }
}
