//! Shared storage for task outcomes
//!
//! The worker records what happened to every executed task here; the
//! synchronous suggestion endpoints wait on it, and the task polling
//! endpoint reads it directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use shelfmark_queue::{TaskId, TaskKind};

/// Entries kept before stale outcomes are swept on insert
const MAX_RETAINED: usize = 1024;

/// Outcomes older than this many minutes are swept once the store fills up
const RETENTION_MINUTES: i64 = 10;

/// Interval between checks while waiting for an outcome
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Outcome of an executed suggestion task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskOutcome {
    pub task_id: TaskId,
    pub kind: TaskKind,
    pub success: bool,
    /// Serialized suggestion payload on success
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    /// Whether the provider refused the call with a rate limit
    pub rate_limited: bool,
    pub tokens_used: u32,
    pub completed_at: DateTime<Utc>,
}

/// Shared storage for task outcomes
pub type ResultStore = Arc<RwLock<HashMap<TaskId, TaskOutcome>>>;

/// Create a new task result store
pub fn new_result_store() -> ResultStore {
    Arc::new(RwLock::new(HashMap::new()))
}

/// Record an outcome, sweeping stale entries once the store fills up.
pub async fn record(store: &ResultStore, outcome: TaskOutcome) {
    let mut results = store.write().await;
    if results.len() >= MAX_RETAINED {
        let horizon = Utc::now() - chrono::Duration::minutes(RETENTION_MINUTES);
        results.retain(|_, entry| entry.completed_at > horizon);
    }
    results.insert(outcome.task_id.clone(), outcome);
}

/// Get a recorded outcome, if any.
pub async fn get(store: &ResultStore, task_id: &TaskId) -> Option<TaskOutcome> {
    store.read().await.get(task_id).cloned()
}

/// Wait for an outcome to appear, polling until the deadline passes.
/// `None` means the task had not completed within the deadline; it keeps
/// running in the worker and its outcome stays pollable afterwards.
pub async fn wait_for(
    store: &ResultStore,
    task_id: &TaskId,
    deadline: Duration,
) -> Option<TaskOutcome> {
    let started = tokio::time::Instant::now();
    loop {
        if let Some(outcome) = get(store, task_id).await {
            return Some(outcome);
        }
        if started.elapsed() >= deadline {
            return None;
        }
        tokio::time::sleep(WAIT_POLL_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn outcome(task_id: TaskId) -> TaskOutcome {
        TaskOutcome {
            task_id,
            kind: TaskKind::Tags,
            success: true,
            data: Some(json!({"tags": ["rust"]})),
            error: None,
            rate_limited: false,
            tokens_used: 12,
            completed_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_record_and_get() {
        let store = new_result_store();
        let id = TaskId::generate();

        assert!(get(&store, &id).await.is_none());

        record(&store, outcome(id.clone())).await;
        let found = get(&store, &id).await.expect("outcome recorded");
        assert!(found.success);
        assert_eq!(found.tokens_used, 12);
    }

    #[tokio::test]
    async fn test_wait_for_sees_late_outcome() {
        let store = new_result_store();
        let id = TaskId::generate();

        let writer = store.clone();
        let task_id = id.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            record(&writer, outcome(task_id)).await;
        });

        let found = wait_for(&store, &id, Duration::from_secs(2)).await;
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn test_wait_for_times_out() {
        let store = new_result_store();
        let id = TaskId::generate();

        let found = wait_for(&store, &id, Duration::from_millis(80)).await;
        assert!(found.is_none());
    }
}
