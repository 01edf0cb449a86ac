//! Log sink forwarding worker output into the tracing pipeline.

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::application::ports::{LogLevel, LogRecord, LogSink};
use crate::domain::shared::{Symbol, TaskId};

/// Production sink: each worker line becomes one tracing event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogSink;

impl TracingLogSink {
    /// Create the sink.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LogSink for TracingLogSink {
    async fn append(&self, record: LogRecord) {
        let task_id = record.task_id.as_ref().map_or("-", TaskId::as_str);
        let symbol = record.symbol.as_ref().map_or("-", Symbol::as_str);
        match record.level {
            LogLevel::Info => info!(task_id, symbol, "{}", record.message),
            LogLevel::Warn => warn!(task_id, symbol, "{}", record.message),
            LogLevel::Error => error!(task_id, symbol, "{}", record.message),
        }
    }
}
