//! End-to-end tests for the admission queue and the caller-side rate limiter

use std::time::Duration;

use shelfmark_queue::{Priority, QueueConfig, TaskKind, TaskQueue, UserRateLimiter};

fn config(max_concurrent: usize) -> QueueConfig {
    QueueConfig {
        max_concurrent,
        user_rate_limit: 10,
        rate_limit_window: Duration::from_secs(60),
        request_timeout: Duration::from_secs(5),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_saturated_queue_admits_but_does_not_release() {
        let queue = TaskQueue::new(config(5));

        for n in 0..5 {
            queue.enqueue("ada", TaskKind::Tags, json!({ "n": n }), Priority::Normal);
        }
        for _ in 0..5 {
            queue.mark_started();
        }

        // All execution slots taken: admission continues, release does not
        assert!(queue.dequeue().is_none());
        let status = queue.status();
        assert_eq!(status.pending, 5);
        assert_eq!(status.active, 5);
        assert_eq!(status.max_concurrent, 5);
    }

    #[test]
    fn test_mixed_kinds_release_in_priority_then_fifo_order() {
        let queue = TaskQueue::new(config(5));

        queue.enqueue("ada", TaskKind::Tags, json!({}), Priority::Low);
        queue.enqueue("ada", TaskKind::Summary, json!({}), Priority::High);
        queue.enqueue("ada", TaskKind::Category, json!({}), Priority::Normal);

        let order: Vec<TaskKind> = std::iter::from_fn(|| queue.dequeue())
            .map(|task| task.kind)
            .collect();
        assert_eq!(
            order,
            vec![TaskKind::Summary, TaskKind::Category, TaskKind::Tags]
        );
    }

    #[test]
    fn test_interleaved_enqueue_dequeue_keeps_insertion_order() {
        let queue = TaskQueue::new(config(5));

        let a = queue.enqueue("ada", TaskKind::Tags, json!({}), Priority::Normal);
        let b = queue.enqueue("ada", TaskKind::Tags, json!({}), Priority::Normal);
        assert_eq!(queue.dequeue().expect("a").id, a);

        let c = queue.enqueue("ada", TaskKind::Tags, json!({}), Priority::Normal);
        assert_eq!(queue.dequeue().expect("b").id, b);
        assert_eq!(queue.dequeue().expect("c").id, c);
    }

    #[test]
    fn test_capacity_cycle_drains_queue() {
        let queue = TaskQueue::new(config(1));
        queue.enqueue("ada", TaskKind::Tags, json!({}), Priority::Normal);
        queue.enqueue("ada", TaskKind::Category, json!({}), Priority::Normal);

        // Simulate a single-slot consumer loop: dequeue, run, complete, repeat
        let first = queue.dequeue().expect("first");
        queue.mark_started();
        assert!(queue.dequeue().is_none());
        queue.mark_completed();

        let second = queue.dequeue().expect("second");
        queue.mark_started();
        queue.mark_completed();

        assert_eq!(first.kind, TaskKind::Tags);
        assert_eq!(second.kind, TaskKind::Category);
        assert_eq!(queue.status().pending, 0);
        assert_eq!(queue.status().active, 0);
    }

    #[tokio::test]
    async fn test_caller_gates_admission_with_limiter() {
        let cfg = QueueConfig {
            user_rate_limit: 2,
            ..config(5)
        };
        let queue = TaskQueue::new(cfg.clone());
        let limiter = UserRateLimiter::from_config(&cfg);

        // The caller's admission path: acquire first, enqueue only on success
        for _ in 0..4 {
            if limiter.try_acquire("ada").await.is_ok() {
                queue.enqueue("ada", TaskKind::Tags, json!({}), Priority::Normal);
            }
        }

        // Two admissions allowed within the window, two refused before enqueue
        assert_eq!(queue.status().pending, 2);
        let usage = limiter.usage("ada").await;
        assert_eq!(usage.used, 2);
    }
}
