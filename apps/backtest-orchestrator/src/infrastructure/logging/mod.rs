//! Log Sink Adapters
//!
//! Implementations of `LogSink` for worker output.

pub mod collecting_sink;
pub mod tracing_sink;

pub use collecting_sink::CollectingLogSink;
pub use tracing_sink::TracingLogSink;
