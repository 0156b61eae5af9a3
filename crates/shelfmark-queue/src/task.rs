//! Task definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Task identifier: `task_` followed by a random suffix.
///
/// The prefix makes ids recognizable in logs and API payloads; the suffix is
/// a v4 UUID, so ids are unique without any central registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Generate a fresh task id.
    pub fn generate() -> Self {
        Self(format!("task_{}", Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TaskId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Kind of AI work a task asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Summarize a bookmarked page
    Summary,
    /// Suggest tags for a bookmark
    Tags,
    /// Suggest a category for a bookmark
    Category,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Summary => "summary",
            TaskKind::Tags => "tags",
            TaskKind::Category => "category",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scheduling priority. Smaller value runs first; `Ord` follows the numeric
/// discriminant, so `High < Normal < Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High = 1,
    Normal = 2,
    Low = 3,
}

impl Priority {
    /// All priorities in dequeue scan order (most urgent first).
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Normal, Priority::Low];

    pub(crate) fn bucket(self) -> usize {
        self as usize - 1
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Normal
    }
}

/// A queued unit of AI work.
///
/// Tasks are immutable once enqueued; dequeue removes them from the queue
/// entirely. The payload is opaque to the queue and only interpreted by the
/// consumer that executes the task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub user_id: String,
    pub kind: TaskKind,
    pub payload: serde_json::Value,
    pub priority: Priority,
    pub enqueued_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_task_id_format() {
        let id = TaskId::generate();
        assert!(id.as_str().starts_with("task_"));
        assert!(id.as_str().len() > "task_".len());
    }

    #[test]
    fn test_task_id_uniqueness() {
        let ids: HashSet<String> = (0..1000)
            .map(|_| TaskId::generate().as_str().to_string())
            .collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::High < Priority::Normal);
        assert!(Priority::Normal < Priority::Low);
        assert_eq!(Priority::High as usize, 1);
        assert_eq!(Priority::Low as usize, 3);
    }

    #[test]
    fn test_kind_serialization() {
        let json = serde_json::to_string(&TaskKind::Category).unwrap();
        assert_eq!(json, "\"category\"");
        let kind: TaskKind = serde_json::from_str("\"summary\"").unwrap();
        assert_eq!(kind, TaskKind::Summary);
    }
}
