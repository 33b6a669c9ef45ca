//! Post-response scripting for Getman.
//!
//! After an HTTP exchange completes, a script body runs against the response
//! to assert expectations, derive variables for later requests and write log
//! output. [`Harness`] drives one run and hands back the [`ScriptContext`]
//! holding the changed variables, the log and the registered tests.
//!
//! Panics inside a script or a registered test are caught and reported on the
//! run's own log, but the process-wide panic hook still runs first. An
//! embedding application that wants nothing on stderr should install its own
//! hook with [`std::panic::set_hook`].

pub mod config;
pub mod environment;
pub mod error;
pub mod http;
pub mod script;
pub mod testing;
pub mod value;

pub use config::HarnessConfig;
pub use environment::PropertyStore;
pub use error::{HarnessError, ScriptError};
pub use http::{HeaderField, HeaderView, ResponseInput, ResponseView};
pub use script::{Harness, PostScript, ScriptContext};
pub use testing::{AssertionError, ScriptResult, TestResult, is_equal};
pub use value::{Kind, Value};
