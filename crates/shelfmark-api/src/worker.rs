//! Background worker draining the task queue
//!
//! The worker polls the queue, claims a concurrency slot for each released
//! task, and runs the provider call on a spawned tokio task. Slots are held
//! by an RAII guard so a panicking task still releases its slot.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use shelfmark_llm::{BookmarkContext, LlmError, Metrics, SuggestionProvider};
use shelfmark_queue::{Task, TaskKind, TaskQueue};

use crate::results::{self, ResultStore, TaskOutcome};
use crate::state::AppState;

/// Polls the queue and executes released tasks against the provider
pub struct SuggestionWorker {
    state: AppState,
    poll_interval: Duration,
}

impl SuggestionWorker {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            poll_interval: Duration::from_millis(100),
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub async fn run(&self) {
        let status = self.state.queue().status();
        info!(
            max_concurrent = status.max_concurrent,
            provider = self.state.provider().name(),
            "Suggestion worker started"
        );

        loop {
            match self.state.queue().dequeue() {
                Some(task) => {
                    // Claim the slot before spawning so the admission gate
                    // closes ahead of the next dequeue.
                    let queue = self.state.queue();
                    queue.mark_started();
                    let slot = SlotGuard { queue };

                    let provider = self.state.provider();
                    let metrics = self.state.metrics();
                    let results = self.state.results();

                    tokio::spawn(async move {
                        execute_task(task, provider, metrics, results).await;
                        drop(slot);
                    });
                }
                None => {
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }
    }
}

/// Releases the claimed concurrency slot on drop
struct SlotGuard {
    queue: Arc<TaskQueue>,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.queue.mark_completed();
    }
}

async fn execute_task(
    task: Task,
    provider: Arc<dyn SuggestionProvider>,
    metrics: Arc<Metrics>,
    results: ResultStore,
) {
    debug!(
        task_id = %task.id,
        kind = %task.kind,
        user_id = %task.user_id,
        "Executing task"
    );

    let context: BookmarkContext = match serde_json::from_value(task.payload.clone()) {
        Ok(context) => context,
        Err(e) => {
            error!(task_id = %task.id, error = %e, "Task payload deserialization failed");
            results::record(
                &results,
                TaskOutcome {
                    task_id: task.id,
                    kind: task.kind,
                    success: false,
                    data: None,
                    error: Some(format!("Invalid task payload: {e}")),
                    rate_limited: false,
                    tokens_used: 0,
                    completed_at: Utc::now(),
                },
            )
            .await;
            return;
        }
    };

    let call = match task.kind {
        TaskKind::Tags => provider.suggest_tags(&context).await.map(|suggestion| {
            let data = serde_json::json!({ "tags": suggestion.tags });
            (data, suggestion.tokens_used)
        }),
        TaskKind::Category => provider.suggest_category(&context).await.map(|suggestion| {
            let data = serde_json::json!({
                "category": suggestion.category,
                "confidence": suggestion.confidence,
            });
            (data, suggestion.tokens_used)
        }),
        TaskKind::Summary => provider.suggest_summary(&context).await.map(|suggestion| {
            let data = serde_json::json!({ "summary": suggestion.summary });
            (data, suggestion.tokens_used)
        }),
    };

    let outcome = match call {
        Ok((data, tokens_used)) => {
            metrics.record_llm_call(tokens_used as u64, false);
            info!(
                task_id = %task.id,
                kind = %task.kind,
                tokens = tokens_used,
                "Task completed"
            );

            TaskOutcome {
                task_id: task.id,
                kind: task.kind,
                success: true,
                data: Some(data),
                error: None,
                rate_limited: false,
                tokens_used,
                completed_at: Utc::now(),
            }
        }
        Err(e) => {
            metrics.record_llm_call(0, true);
            let rate_limited = matches!(e, LlmError::RateLimited);
            if rate_limited {
                metrics.record_rate_limited();
                warn!(task_id = %task.id, kind = %task.kind, "Provider rate limited");
            } else {
                error!(task_id = %task.id, kind = %task.kind, error = %e, "Provider call failed");
            }

            TaskOutcome {
                task_id: task.id,
                kind: task.kind,
                success: false,
                data: None,
                error: Some(e.to_string()),
                rate_limited,
                tokens_used: 0,
                completed_at: Utc::now(),
            }
        }
    };

    results::record(&results, outcome).await;
}
