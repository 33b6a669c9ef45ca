use std::collections::HashMap;

use tracing::{debug, warn};

use super::context::ScriptContext;
use super::{PostScript, run_guarded};
use crate::config::HarnessConfig;
use crate::error::ScriptError;
use crate::http::{HeaderView, ResponseInput, ResponseView};
use crate::value::Value;

/// Runs one post-response script against finished responses.
///
/// Each call builds a fresh [`ScriptContext`]; nothing is shared between
/// calls, so one harness may serve many threads when its script is `Sync`.
pub struct Harness<S> {
    script: S,
    config: HarnessConfig,
}

impl<F> Harness<F> {
    /// Build a harness from a closure, letting the closure's argument types
    /// be inferred.
    pub fn from_fn(script: F) -> Self
    where
        F: Fn(&mut ScriptContext, &ResponseView) -> Result<(), ScriptError>,
    {
        Self::with_config(script, HarnessConfig::default())
    }
}

impl<S: PostScript> Harness<S> {
    pub fn new(script: S) -> Self {
        Self::with_config(script, HarnessConfig::default())
    }

    pub fn with_config(script: S, config: HarnessConfig) -> Self {
        Self { script, config }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Run the script against one response.
    ///
    /// Never fails: a script error, a panic inside the script, or a body that
    /// is not valid JSON in JSON mode becomes an `error <text>` log line on
    /// the returned context.
    pub fn handle(
        &self,
        is_json: bool,
        globals: HashMap<String, Value>,
        response_body: &str,
        status: u16,
        headers: HeaderView,
    ) -> ScriptContext {
        let mut client = ScriptContext::new(globals).with_fail_message(self.config.fail_message.as_str());
        debug!(status, is_json, "running post-response script");

        let body = if is_json {
            match serde_json::from_str::<serde_json::Value>(response_body) {
                Ok(json) => Value::from(json),
                Err(err) => {
                    warn!(error = %err, "response body is not valid JSON");
                    client.log(format!("error {err}"));
                    return client;
                }
            }
        } else {
            Value::from(response_body)
        };
        let response = ResponseView::new(body, status, headers);

        if let Err(err) = run_guarded(|| self.script.run(&mut client, &response)) {
            warn!(error = %err, "post-response script failed");
            client.log(format!("error {err}"));
        }

        debug!(
            updated = client.properties().updated().len(),
            lines = client.stdout().len(),
            tests = client.tests().len(),
            "post-response script finished"
        );
        client
    }

    /// Like [`Harness::handle`], deciding JSON mode from the response's
    /// content type.
    pub fn handle_response(&self, globals: HashMap<String, Value>, input: &ResponseInput) -> ScriptContext {
        self.handle(
            input.is_json(&self.config),
            globals,
            &input.body,
            input.status,
            input.header_view(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_headers() -> HeaderView {
        HeaderView::new()
    }

    #[test]
    fn json_body_is_decoded_and_variables_recorded() {
        let harness = Harness::from_fn(|client, response| {
            client.assert(response.body().get("a").strict_equals(&Value::from(1)), None)?;
            client.properties_mut().set("seen", true);
            Ok(())
        });

        let client = harness.handle(true, HashMap::new(), r#"{"a":1}"#, 200, no_headers());

        assert_eq!(client.properties().get("seen"), Some(&Value::Bool(true)));
        assert_eq!(client.properties().updated(), ["seen"]);
        assert!(client.stdout().is_empty());
    }

    #[test]
    fn text_body_is_kept_raw() {
        let harness = Harness::from_fn(|client, response| {
            client.log(response.body());
            client.log(response.status());
            Ok(())
        });

        let client = harness.handle(false, HashMap::new(), r#"{"a":1}"#, 201, no_headers());
        assert_eq!(client.stdout(), ["{\"a\":1}\n", "201\n"]);
    }

    #[test]
    fn thrown_error_becomes_log_line() {
        let harness = Harness::from_fn(|client, _| {
            client.log("before");
            Err(ScriptError::throw("boom"))
        });

        let client = harness.handle(false, HashMap::new(), "", 500, no_headers());
        assert_eq!(client.stdout(), ["before\n", "error boom\n"]);
    }

    #[test]
    fn failed_assertion_becomes_log_line() {
        let harness = Harness::from_fn(|client, response| {
            client.properties_mut().set("partial", 1);
            client.assert(response.status() == 200, None)?;
            client.properties_mut().set("never", 2);
            Ok(())
        });

        let client = harness.handle(false, HashMap::new(), "", 404, no_headers());
        assert_eq!(client.stdout(), ["error Assert failed\n"]);
        assert_eq!(client.properties().updated(), ["partial"]);
    }

    #[test]
    fn panic_in_script_is_contained() {
        let harness = Harness::from_fn(|client, response| {
            let items: Vec<u16> = Vec::new();
            let picked = items[usize::from(response.status())];
            client.log(picked);
            Ok(())
        });

        let client = harness.handle(false, HashMap::new(), "", 3, no_headers());
        assert_eq!(client.stdout().len(), 1);
        assert!(client.stdout()[0].starts_with("error panic: "));
    }

    #[test]
    fn invalid_json_is_logged_and_script_skipped() {
        let harness = Harness::from_fn(|client, _| {
            client.properties_mut().set("ran", true);
            Ok(())
        });

        let client = harness.handle(true, HashMap::new(), "not json", 200, no_headers());
        assert_eq!(client.stdout().len(), 1);
        assert!(client.stdout()[0].starts_with("error "));
        assert!(client.properties().updated().is_empty());
    }

    #[test]
    fn globals_seed_the_store_without_marking_updates() {
        let harness = Harness::from_fn(|client, _| {
            let host = client.properties().get("host").cloned().unwrap_or_default();
            client.log(host);
            Ok(())
        });

        let mut globals = HashMap::new();
        globals.insert("host".to_string(), Value::from("api.example.com"));
        let client = harness.handle(false, globals, "", 200, no_headers());

        assert_eq!(client.stdout(), ["api.example.com\n"]);
        assert!(client.properties().updated().is_empty());
    }

    #[test]
    fn configured_fail_message_applies() {
        let config = HarnessConfig {
            fail_message: "check failed".to_string(),
            ..HarnessConfig::default()
        };
        let script = |client: &mut ScriptContext, _: &ResponseView| -> Result<(), ScriptError> {
            client.assert(false, None)?;
            Ok(())
        };
        let harness = Harness::with_config(script, config);

        let client = harness.handle(false, HashMap::new(), "", 200, no_headers());
        assert_eq!(client.stdout(), ["error check failed\n"]);
    }

    #[test]
    fn handle_response_detects_json_from_content_type() {
        let harness = Harness::from_fn(|client, response| {
            client.log(response.body().get("id"));
            client.log(response.headers().value_of("x-request-id").unwrap_or("none"));
            Ok(())
        });
        let input = ResponseInput {
            status: 200,
            headers: vec![
                ("Content-Type".to_string(), "application/json; charset=utf-8".to_string()),
                ("X-Request-Id".to_string(), "r-1".to_string()),
            ],
            body: r#"{"id": 7}"#.to_string(),
        };

        let client = harness.handle_response(HashMap::new(), &input);
        assert_eq!(client.stdout(), ["7\n", "r-1\n"]);
    }
}
