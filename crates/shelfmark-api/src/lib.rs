//! # Shelfmark API
//!
//! HTTP surface for the Shelfmark suggestion service.
//!
//! Features:
//! - Axum-based web server
//! - Tower middleware (caller identity, request IDs, tracing)
//! - Admission-queue backed suggestion endpoints
//! - Per-user rate limiting
//! - Graceful shutdown

pub mod error;
pub mod middleware;
pub mod results;
pub mod routes;
pub mod server;
pub mod state;
pub mod worker;

pub use error::{ApiError, ApiResult};
pub use results::{new_result_store, ResultStore, TaskOutcome};
pub use server::{init_tracing, ServerConfig, ShelfmarkServer};
pub use state::AppState;
pub use worker::SuggestionWorker;
