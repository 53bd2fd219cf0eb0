//! Append-only log of timer completions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Timer;

/// Audit entry written when a timer completes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRecord {
    pub name: String,
    pub category: String,
    /// Configured duration of the timer, not the time actually spent
    pub duration_seconds: u64,
    pub completed_at: DateTime<Utc>,
}

impl CompletionRecord {
    pub fn for_timer(timer: &Timer, completed_at: DateTime<Utc>) -> Self {
        Self {
            name: timer.name.clone(),
            category: timer.category.clone(),
            duration_seconds: timer.duration_seconds,
            completed_at,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryLog {
    records: Vec<CompletionRecord>,
}

impl HistoryLog {
    pub fn from_records(records: Vec<CompletionRecord>) -> Self {
        Self { records }
    }

    pub fn append(&mut self, record: CompletionRecord) {
        self.records.push(record);
    }

    /// Records oldest first
    pub fn list(&self) -> &[CompletionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
