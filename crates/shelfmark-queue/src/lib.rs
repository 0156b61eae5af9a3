//! # Shelfmark Queue
//!
//! In-memory admission queue for AI suggestion tasks.
//!
//! Features:
//! - Priority scheduling with strict FIFO order within a priority
//! - Admission decoupled from execution: enqueue never blocks or fails,
//!   dequeue is gated by the in-flight ceiling
//! - Consumer-driven in-flight accounting (`mark_started` / `mark_completed`)
//! - Fixed-window per-user rate limiting for callers to apply before enqueue

pub mod queue;
pub mod rate_limit;
pub mod task;

pub use queue::{QueueConfig, QueueStatus, TaskQueue};
pub use rate_limit::{RateLimitError, UserRateLimiter, UserUsage};
pub use task::{Priority, Task, TaskId, TaskKind};
