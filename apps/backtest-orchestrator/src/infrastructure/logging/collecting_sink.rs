//! In-memory log sink for testing and inspection.

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::application::ports::{LogRecord, LogSink};
use crate::domain::shared::TaskId;

/// Sink that keeps every record in memory.
///
/// Suitable for testing and development. Not for production use.
#[derive(Debug, Default)]
pub struct CollectingLogSink {
    records: RwLock<Vec<LogRecord>>,
}

impl CollectingLogSink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All records collected so far.
    #[must_use]
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.read().clone()
    }

    /// Records attributed to one task.
    #[must_use]
    pub fn records_for(&self, task_id: &TaskId) -> Vec<LogRecord> {
        self.records
            .read()
            .iter()
            .filter(|r| r.task_id.as_ref() == Some(task_id))
            .cloned()
            .collect()
    }

    /// Number of collected records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Check if nothing has been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Drop all collected records.
    pub fn clear(&self) {
        self.records.write().clear();
    }
}

#[async_trait]
impl LogSink for CollectingLogSink {
    async fn append(&self, record: LogRecord) {
        self.records.write().push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::LogLevel;
    use crate::domain::shared::Symbol;

    #[tokio::test]
    async fn collects_and_filters_by_task() {
        let sink = CollectingLogSink::new();
        sink.append(LogRecord::for_job(
            Some(TaskId::new("task-1")),
            Symbol::new("SHSE.600000"),
            LogLevel::Info,
            "line one",
        ))
        .await;
        sink.append(LogRecord::for_job(
            Some(TaskId::new("task-2")),
            Symbol::new("SZSE.000001"),
            LogLevel::Warn,
            "line two",
        ))
        .await;

        assert_eq!(sink.len(), 2);
        let for_one = sink.records_for(&TaskId::new("task-1"));
        assert_eq!(for_one.len(), 1);
        assert_eq!(for_one[0].message, "line one");

        sink.clear();
        assert!(sink.is_empty());
    }
}
