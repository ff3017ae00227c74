//! Tracing and logging (shared setup).

pub mod subscriber;

pub use subscriber::{LogFormat, ParseLogFormatError, component_span, init};
