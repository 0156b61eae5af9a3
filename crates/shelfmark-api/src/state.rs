//! Application State
//!
//! Centralizes access to the queue, rate limiter, provider and metrics. One
//! state object per process; tests build their own for isolation.

use crate::results::ResultStore;
use shelfmark_llm::{Metrics, SuggestionProvider};
use shelfmark_queue::{TaskQueue, UserRateLimiter};
use std::sync::Arc;

/// Application state shared across handlers and the worker
#[derive(Clone)]
pub struct AppState {
    queue: Arc<TaskQueue>,
    rate_limiter: Arc<UserRateLimiter>,
    provider: Arc<dyn SuggestionProvider>,
    metrics: Arc<Metrics>,
    results: ResultStore,
}

impl AppState {
    /// Create new application state
    pub fn new(
        queue: Arc<TaskQueue>,
        rate_limiter: Arc<UserRateLimiter>,
        provider: Arc<dyn SuggestionProvider>,
        metrics: Arc<Metrics>,
        results: ResultStore,
    ) -> Self {
        Self {
            queue,
            rate_limiter,
            provider,
            metrics,
            results,
        }
    }

    /// Get the admission queue (cloned Arc for sharing)
    pub fn queue(&self) -> Arc<TaskQueue> {
        self.queue.clone()
    }

    /// Get the per-user rate limiter (cloned Arc for sharing)
    pub fn rate_limiter(&self) -> Arc<UserRateLimiter> {
        self.rate_limiter.clone()
    }

    /// Get the suggestion provider (cloned Arc for sharing)
    pub fn provider(&self) -> Arc<dyn SuggestionProvider> {
        self.provider.clone()
    }

    /// Get metrics collector (cloned Arc for sharing)
    pub fn metrics(&self) -> Arc<Metrics> {
        self.metrics.clone()
    }

    /// Get the task result store (cloned Arc for sharing)
    pub fn results(&self) -> ResultStore {
        self.results.clone()
    }
}
