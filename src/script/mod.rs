//! # Post-Response Scripts
//!
//! A script body is operator code fixed when the harness is built. It runs
//! once per response with the `client` context and the `response` view, and
//! reports failure through its `Result`.

pub mod context;
pub mod harness;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

pub use context::ScriptContext;
pub use harness::Harness;

use crate::error::ScriptError;
use crate::http::ResponseView;

/// A script body the harness can run.
pub trait PostScript {
    fn run(&self, client: &mut ScriptContext, response: &ResponseView) -> Result<(), ScriptError>;
}

impl<F> PostScript for F
where
    F: Fn(&mut ScriptContext, &ResponseView) -> Result<(), ScriptError>,
{
    fn run(&self, client: &mut ScriptContext, response: &ResponseView) -> Result<(), ScriptError> {
        self(client, response)
    }
}

/// Run script code, turning a panic into a [`ScriptError::Panic`].
pub(crate) fn run_guarded<T>(body: impl FnOnce() -> Result<T, ScriptError>) -> Result<T, ScriptError> {
    panic::catch_unwind(AssertUnwindSafe(body)).unwrap_or_else(|payload| Err(ScriptError::Panic(panic_message(payload))))
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "script panicked".to_string()
    }
}
