//! # HTTP Response Surface
//!
//! The parts of a finished exchange a script can see: status, headers and
//! body.

pub mod headers;
pub mod response;

pub use headers::{HeaderField, HeaderView};
pub use response::{ResponseInput, ResponseView};
