//! In-memory admission queue with priority scheduling
//!
//! The queue decides which AI tasks are *admitted to run*, not how they run.
//! Admission is unconditional: `enqueue` always succeeds and callers throttle
//! themselves via the rate limiter before enqueuing. Execution is what gets
//! throttled here: `dequeue` hands out nothing while the number of in-flight
//! tasks (tracked by `mark_started` / `mark_completed`) has reached the
//! configured ceiling. Consumers poll; nothing ever blocks inside the queue.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::task::{Priority, Task, TaskId, TaskKind};

/// Queue configuration, fixed at construction.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Hard ceiling on simultaneously in-flight tasks
    pub max_concurrent: usize,
    /// Max tasks a single user may admit within `rate_limit_window`
    pub user_rate_limit: u32,
    /// Window length for `user_rate_limit`
    pub rate_limit_window: Duration,
    /// Advisory deadline the consumer applies to a single task's execution;
    /// the queue itself never expires pending tasks
    pub request_timeout: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 2,
            user_rate_limit: 10,
            rate_limit_window: Duration::from_secs(60),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Snapshot of queue depth and in-flight count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStatus {
    pub pending: usize,
    pub active: usize,
    pub max_concurrent: usize,
}

/// Everything the operations read or write. Kept behind one mutex so every
/// operation is a single short critical section; no await happens while the
/// lock is held.
#[derive(Debug, Default)]
struct QueueState {
    /// One FIFO bucket per priority, indexed by `Priority::bucket()`.
    /// Equal-priority order is insertion order by construction, with no
    /// dependence on timestamp granularity.
    buckets: [VecDeque<Task>; 3],
    /// In-flight count, driven by the consumer via mark_started/mark_completed
    active: usize,
}

impl QueueState {
    fn pending(&self) -> usize {
        self.buckets.iter().map(VecDeque::len).sum()
    }
}

/// AI task admission queue.
///
/// Shared as `Arc<TaskQueue>` between producers (HTTP handlers) and the
/// consumer (the suggestion worker). All operations are total: none of them
/// blocks, fails, or returns an error.
#[derive(Debug)]
pub struct TaskQueue {
    config: QueueConfig,
    state: Mutex<QueueState>,
}

impl TaskQueue {
    pub fn new(config: QueueConfig) -> Self {
        Self {
            config,
            state: Mutex::new(QueueState::default()),
        }
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    fn state(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().expect("task queue mutex poisoned")
    }

    /// Admit a task. Always succeeds and returns the generated id; capacity
    /// only matters at dequeue time.
    pub fn enqueue(
        &self,
        user_id: &str,
        kind: TaskKind,
        payload: serde_json::Value,
        priority: Priority,
    ) -> TaskId {
        let id = TaskId::generate();
        let task = Task {
            id: id.clone(),
            user_id: user_id.to_string(),
            kind,
            payload,
            priority,
            enqueued_at: Utc::now(),
        };

        let mut state = self.state();
        state.buckets[priority.bucket()].push_back(task);

        debug!(
            task_id = %id,
            kind = %kind,
            priority = ?priority,
            pending = state.pending(),
            "Task enqueued"
        );

        id
    }

    /// Take the next runnable task, or `None` when the queue is empty or the
    /// in-flight ceiling is reached.
    ///
    /// Buckets are scanned most-urgent-first; within a bucket tasks leave in
    /// insertion order. The active counter is not touched here; the consumer
    /// reports the start of execution separately via [`mark_started`].
    ///
    /// [`mark_started`]: TaskQueue::mark_started
    pub fn dequeue(&self) -> Option<Task> {
        let mut state = self.state();

        if state.active >= self.config.max_concurrent {
            return None;
        }

        for priority in Priority::ALL {
            if let Some(task) = state.buckets[priority.bucket()].pop_front() {
                debug!(
                    task_id = %task.id,
                    kind = %task.kind,
                    priority = ?task.priority,
                    pending = state.pending(),
                    "Task dequeued"
                );
                return Some(task);
            }
        }

        None
    }

    /// Record that the consumer started executing a task.
    pub fn mark_started(&self) {
        let mut state = self.state();
        state.active += 1;
        debug!(active = state.active, "Task started");
    }

    /// Record that a task finished (in success or failure). Calls beyond the
    /// number of started tasks are silent no-ops; the count never goes below
    /// zero.
    pub fn mark_completed(&self) {
        let mut state = self.state();
        state.active = state.active.saturating_sub(1);
        debug!(active = state.active, "Task completed");
    }

    /// Snapshot pending depth and in-flight count.
    pub fn status(&self) -> QueueStatus {
        let state = self.state();
        QueueStatus {
            pending: state.pending(),
            active: state.active,
            max_concurrent: self.config.max_concurrent,
        }
    }

    /// Drop all pending tasks and reset the in-flight count. Administrative;
    /// outcomes of tasks already being executed are unaffected.
    pub fn clear(&self) {
        let mut state = self.state();
        let dropped = state.pending();
        for bucket in &mut state.buckets {
            bucket.clear();
        }
        state.active = 0;
        debug!(dropped = dropped, "Queue cleared");
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new(QueueConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn queue_with_limit(max_concurrent: usize) -> TaskQueue {
        TaskQueue::new(QueueConfig {
            max_concurrent,
            ..QueueConfig::default()
        })
    }

    #[test]
    fn test_enqueue_dequeue() {
        let queue = TaskQueue::default();

        let id = queue.enqueue("ada", TaskKind::Tags, json!({"url": "https://example.com"}), Priority::Normal);

        let task = queue.dequeue().expect("should have task");
        assert_eq!(task.id, id);
        assert_eq!(task.user_id, "ada");
        assert_eq!(task.kind, TaskKind::Tags);

        assert!(queue.dequeue().is_none());
    }

    #[test]
    fn test_dequeue_empty_returns_none() {
        let queue = TaskQueue::default();
        assert!(queue.dequeue().is_none());
    }

    #[test]
    fn test_priority_order() {
        let queue = queue_with_limit(5);
        queue.enqueue("ada", TaskKind::Tags, json!({}), Priority::Low);
        queue.enqueue("ada", TaskKind::Summary, json!({}), Priority::High);
        queue.enqueue("ada", TaskKind::Category, json!({}), Priority::Normal);

        let first = queue.dequeue().expect("first");
        assert_eq!(first.priority, Priority::High);
        let second = queue.dequeue().expect("second");
        assert_eq!(second.priority, Priority::Normal);
        let third = queue.dequeue().expect("third");
        assert_eq!(third.priority, Priority::Low);
    }

    #[test]
    fn test_fifo_within_priority() {
        let queue = queue_with_limit(5);
        let a = queue.enqueue("ada", TaskKind::Tags, json!({"n": 1}), Priority::Normal);
        let b = queue.enqueue("ada", TaskKind::Tags, json!({"n": 2}), Priority::Normal);
        let c = queue.enqueue("ada", TaskKind::Tags, json!({"n": 3}), Priority::Normal);

        assert_eq!(queue.dequeue().expect("a").id, a);
        assert_eq!(queue.dequeue().expect("b").id, b);
        assert_eq!(queue.dequeue().expect("c").id, c);
    }

    #[test]
    fn test_dequeue_gated_at_capacity() {
        let queue = queue_with_limit(2);
        queue.enqueue("ada", TaskKind::Tags, json!({}), Priority::Normal);
        queue.enqueue("ada", TaskKind::Tags, json!({}), Priority::Normal);
        queue.enqueue("ada", TaskKind::Tags, json!({}), Priority::Normal);

        queue.mark_started();
        queue.mark_started();
        assert!(queue.dequeue().is_none(), "at capacity, nothing runnable");

        queue.mark_completed();
        assert!(queue.dequeue().is_some(), "slot freed, task runnable again");
    }

    #[test]
    fn test_pending_tracks_enqueue_minus_dequeue() {
        let queue = queue_with_limit(5);
        assert_eq!(queue.status().pending, 0);

        queue.enqueue("ada", TaskKind::Tags, json!({}), Priority::Normal);
        queue.enqueue("ada", TaskKind::Summary, json!({}), Priority::High);
        assert_eq!(queue.status().pending, 2);

        queue.dequeue();
        assert_eq!(queue.status().pending, 1);

        queue.dequeue();
        assert_eq!(queue.status().pending, 0);
    }

    #[test]
    fn test_mark_completed_floors_at_zero() {
        let queue = TaskQueue::default();
        queue.mark_started();
        queue.mark_completed();
        queue.mark_completed();
        queue.mark_completed();
        assert_eq!(queue.status().active, 0);
    }

    #[test]
    fn test_clear_resets_everything() {
        let queue = queue_with_limit(5);
        queue.enqueue("ada", TaskKind::Tags, json!({}), Priority::Low);
        queue.enqueue("ada", TaskKind::Tags, json!({}), Priority::High);
        queue.mark_started();
        queue.mark_started();

        queue.clear();

        let status = queue.status();
        assert_eq!(status.pending, 0);
        assert_eq!(status.active, 0);
        assert!(queue.dequeue().is_none());
    }

    #[test]
    fn test_status_reports_config_ceiling() {
        let queue = queue_with_limit(7);
        assert_eq!(queue.status().max_concurrent, 7);
    }
}
