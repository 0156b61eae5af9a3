//! Per-user rate limiting for task admission
//!
//! Enforcement lives with the caller, not inside the queue: the HTTP layer
//! calls [`UserRateLimiter::try_acquire`] *before* enqueuing, so queue
//! operations stay total and error-free.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::queue::QueueConfig;

/// Request tracking for one user
#[derive(Debug, Clone)]
struct RequestWindow {
    count: u32,
    window_start: Instant,
}

impl Default for RequestWindow {
    fn default() -> Self {
        Self {
            count: 0,
            window_start: Instant::now(),
        }
    }
}

/// Rate limit error
#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("Rate limited, retry after {retry_after:?}")]
    Limited { retry_after: Duration },
}

/// Per-user usage snapshot
#[derive(Debug, Clone)]
pub struct UserUsage {
    pub used: u32,
    pub limit: u32,
    pub window_remaining: Duration,
}

/// Fixed-window per-user rate limiter.
///
/// Windows are keyed by user id and reset lazily when a full window has
/// elapsed since the first request in it.
#[derive(Debug)]
pub struct UserRateLimiter {
    max_requests: u32,
    window: Duration,
    windows: RwLock<HashMap<String, RequestWindow>>,
}

impl UserRateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            windows: RwLock::new(HashMap::new()),
        }
    }

    /// Build a limiter from the queue's admission knobs.
    pub fn from_config(config: &QueueConfig) -> Self {
        Self::new(config.user_rate_limit, config.rate_limit_window)
    }

    /// Try to acquire a permit for a user (non-blocking).
    pub async fn try_acquire(&self, user_id: &str) -> Result<(), RateLimitError> {
        let mut windows = self.windows.write().await;
        let window = windows.entry(user_id.to_string()).or_default();

        // Reset the window lazily once it has fully elapsed
        let elapsed = window.window_start.elapsed();
        if elapsed >= self.window {
            *window = RequestWindow::default();
        }

        if window.count >= self.max_requests {
            let retry_after = self.window.saturating_sub(window.window_start.elapsed());
            return Err(RateLimitError::Limited { retry_after });
        }

        window.count += 1;
        Ok(())
    }

    /// Current usage for a user.
    pub async fn usage(&self, user_id: &str) -> UserUsage {
        let windows = self.windows.read().await;
        let window = windows.get(user_id).cloned().unwrap_or_default();

        let elapsed = window.window_start.elapsed();
        let (used, window_remaining) = if elapsed >= self.window {
            (0, self.window)
        } else {
            (window.count, self.window - elapsed)
        };

        UserUsage {
            used,
            limit: self.max_requests,
            window_remaining,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_limit_enforced_per_user() {
        let limiter = UserRateLimiter::new(3, Duration::from_secs(60));

        assert!(limiter.try_acquire("ada").await.is_ok());
        assert!(limiter.try_acquire("ada").await.is_ok());
        assert!(limiter.try_acquire("ada").await.is_ok());

        assert!(matches!(
            limiter.try_acquire("ada").await,
            Err(RateLimitError::Limited { .. })
        ));

        // A different user has an independent window
        assert!(limiter.try_acquire("grace").await.is_ok());
    }

    #[tokio::test]
    async fn test_window_resets() {
        let limiter = UserRateLimiter::new(1, Duration::from_millis(50));

        assert!(limiter.try_acquire("ada").await.is_ok());
        assert!(limiter.try_acquire("ada").await.is_err());

        tokio::time::sleep(Duration::from_millis(80)).await;

        assert!(limiter.try_acquire("ada").await.is_ok());
    }

    #[tokio::test]
    async fn test_usage_snapshot() {
        let limiter = UserRateLimiter::new(10, Duration::from_secs(60));

        limiter.try_acquire("ada").await.unwrap();
        limiter.try_acquire("ada").await.unwrap();

        let usage = limiter.usage("ada").await;
        assert_eq!(usage.used, 2);
        assert_eq!(usage.limit, 10);
        assert!(usage.window_remaining <= Duration::from_secs(60));

        let fresh = limiter.usage("grace").await;
        assert_eq!(fresh.used, 0);
    }

    #[tokio::test]
    async fn test_retry_after_within_window() {
        let limiter = UserRateLimiter::new(1, Duration::from_secs(60));
        limiter.try_acquire("ada").await.unwrap();

        match limiter.try_acquire("ada").await {
            Err(RateLimitError::Limited { retry_after }) => {
                assert!(retry_after <= Duration::from_secs(60));
                assert!(retry_after > Duration::from_secs(0));
            }
            Ok(()) => panic!("should be limited"),
        }
    }
}
