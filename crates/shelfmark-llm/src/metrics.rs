//! Service metrics
//!
//! Counters live on the shared application state rather than in a process
//! global, so tests get isolated collectors for free.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics collector
#[derive(Debug, Default)]
pub struct Metrics {
    /// Total provider calls
    pub llm_calls: AtomicU64,
    /// Total provider errors (rate limiting included)
    pub llm_errors: AtomicU64,
    /// Provider calls refused upstream with a rate limit
    pub rate_limited: AtomicU64,
    /// Total tokens consumed
    pub tokens_used: AtomicU64,
    /// Suggestions successfully served to clients
    pub suggestions_served: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a provider call
    pub fn record_llm_call(&self, tokens: u64, error: bool) {
        self.llm_calls.fetch_add(1, Ordering::Relaxed);
        self.tokens_used.fetch_add(tokens, Ordering::Relaxed);
        if error {
            self.llm_errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record an upstream rate-limit refusal
    pub fn record_rate_limited(&self) {
        self.rate_limited.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a suggestion served to a client
    pub fn record_suggestion_served(&self) {
        self.suggestions_served.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            llm_calls: self.llm_calls.load(Ordering::Relaxed),
            llm_errors: self.llm_errors.load(Ordering::Relaxed),
            rate_limited: self.rate_limited.load(Ordering::Relaxed),
            tokens_used: self.tokens_used.load(Ordering::Relaxed),
            suggestions_served: self.suggestions_served.load(Ordering::Relaxed),
        }
    }

    /// Get provider error rate
    pub fn llm_error_rate(&self) -> f64 {
        let total = self.llm_calls.load(Ordering::Relaxed);
        let errors = self.llm_errors.load(Ordering::Relaxed);
        if total == 0 {
            0.0
        } else {
            errors as f64 / total as f64
        }
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub llm_calls: u64,
    pub llm_errors: u64,
    pub rate_limited: u64,
    pub tokens_used: u64,
    pub suggestions_served: u64,
}

impl MetricsSnapshot {
    /// Export metrics in Prometheus text format
    pub fn to_prometheus(&self) -> String {
        let mut output = String::new();

        output.push_str("# HELP shelfmark_llm_calls_total Total number of provider calls\n");
        output.push_str("# TYPE shelfmark_llm_calls_total counter\n");
        output.push_str(&format!("shelfmark_llm_calls_total {}\n", self.llm_calls));

        output.push_str("# HELP shelfmark_llm_errors_total Total number of provider errors\n");
        output.push_str("# TYPE shelfmark_llm_errors_total counter\n");
        output.push_str(&format!("shelfmark_llm_errors_total {}\n", self.llm_errors));

        output.push_str("# HELP shelfmark_rate_limited_total Provider calls refused upstream\n");
        output.push_str("# TYPE shelfmark_rate_limited_total counter\n");
        output.push_str(&format!("shelfmark_rate_limited_total {}\n", self.rate_limited));

        output.push_str("# HELP shelfmark_tokens_used_total Total tokens consumed\n");
        output.push_str("# TYPE shelfmark_tokens_used_total counter\n");
        output.push_str(&format!("shelfmark_tokens_used_total {}\n", self.tokens_used));

        output.push_str("# HELP shelfmark_suggestions_served_total Suggestions served to clients\n");
        output.push_str("# TYPE shelfmark_suggestions_served_total counter\n");
        output.push_str(&format!(
            "shelfmark_suggestions_served_total {}\n",
            self.suggestions_served
        ));

        let error_rate = if self.llm_calls > 0 {
            self.llm_errors as f64 / self.llm_calls as f64
        } else {
            0.0
        };
        output.push_str("# HELP shelfmark_llm_error_rate Current provider error rate\n");
        output.push_str("# TYPE shelfmark_llm_error_rate gauge\n");
        output.push_str(&format!("shelfmark_llm_error_rate {:.4}\n", error_rate));

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics() {
        let metrics = Metrics::new();

        metrics.record_llm_call(100, false);
        metrics.record_llm_call(50, true);
        metrics.record_rate_limited();
        metrics.record_suggestion_served();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.llm_calls, 2);
        assert_eq!(snapshot.llm_errors, 1);
        assert_eq!(snapshot.rate_limited, 1);
        assert_eq!(snapshot.tokens_used, 150);
        assert_eq!(snapshot.suggestions_served, 1);

        assert_eq!(metrics.llm_error_rate(), 0.5);
    }

    #[test]
    fn test_prometheus_export() {
        let metrics = Metrics::new();
        metrics.record_llm_call(42, false);

        let output = metrics.snapshot().to_prometheus();
        assert!(output.contains("shelfmark_llm_calls_total 1"));
        assert!(output.contains("shelfmark_tokens_used_total 42"));
        assert!(output.contains("# TYPE shelfmark_llm_error_rate gauge"));
    }
}
