//! Shelfmark API server with graceful shutdown

use axum::{middleware, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

use crate::error::ApiError;
use crate::middleware::{
    body_limit_layer, cors_layer, identity_middleware, request_id_middleware, timeout_layer,
    tracing_middleware,
};
use crate::results::new_result_store;
use crate::routes::api_router;
use crate::state::AppState;
use crate::worker::SuggestionWorker;
use shelfmark_llm::{LlmConfig, Metrics, MockProvider, OpenAIProvider, SuggestionProvider};
use shelfmark_queue::{QueueConfig, TaskQueue, UserRateLimiter};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server address
    pub addr: SocketAddr,
    /// Whole-request timeout; must exceed the queue's request timeout so
    /// partial suggestion responses still make it out
    pub timeout: Duration,
    /// Max request body size (bytes)
    pub max_body_size: usize,
    /// Admission queue configuration
    pub queue: QueueConfig,
    /// How often the worker polls an empty queue
    pub worker_poll_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8080".parse().unwrap(),
            timeout: Duration::from_secs(60),
            max_body_size: 256 * 1024, // 256KB
            queue: QueueConfig::default(),
            worker_poll_interval: Duration::from_millis(100),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

impl ServerConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let queue_defaults = QueueConfig::default();
        let queue = QueueConfig {
            max_concurrent: env_parse("SHELFMARK_MAX_CONCURRENT")
                .unwrap_or(queue_defaults.max_concurrent),
            user_rate_limit: env_parse("SHELFMARK_USER_RATE_LIMIT")
                .unwrap_or(queue_defaults.user_rate_limit),
            rate_limit_window: env_parse("SHELFMARK_RATE_WINDOW_SECS")
                .map(Duration::from_secs)
                .unwrap_or(queue_defaults.rate_limit_window),
            request_timeout: env_parse("SHELFMARK_REQUEST_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(queue_defaults.request_timeout),
        };

        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], env_parse("SHELFMARK_PORT").unwrap_or(8080))),
            timeout: Duration::from_secs(env_parse("SHELFMARK_TIMEOUT_SECS").unwrap_or(60)),
            queue,
            ..Default::default()
        }
    }
}

/// Shelfmark API server
pub struct ShelfmarkServer {
    config: ServerConfig,
    app_state: AppState,
}

impl ShelfmarkServer {
    /// Create a new server
    pub fn new(config: ServerConfig) -> Self {
        let llm_config = LlmConfig::from_env();
        let provider: Arc<dyn SuggestionProvider> = match llm_config.openai_api_key {
            Some(ref key) => {
                tracing::info!(model = %llm_config.model, "Initializing OpenAI suggestion provider");
                Arc::new(
                    OpenAIProvider::new(key, &llm_config.model)
                        .with_base_url(&llm_config.base_url),
                )
            }
            None => {
                tracing::warn!("OPENAI_API_KEY not found. Using mock suggestion provider.");
                Arc::new(MockProvider::new())
            }
        };

        let app_state = AppState::new(
            Arc::new(TaskQueue::new(config.queue.clone())),
            Arc::new(UserRateLimiter::from_config(&config.queue)),
            provider,
            Arc::new(Metrics::new()),
            new_result_store(),
        );

        Self { config, app_state }
    }

    /// Get the shared application state
    pub fn state(&self) -> AppState {
        self.app_state.clone()
    }

    /// Get the configured router
    pub fn router(&self) -> Router {
        // Apply middleware layers (order matters - bottom to top execution)
        api_router(self.app_state.clone())
            // Body size limit (innermost)
            .layer(body_limit_layer(self.config.max_body_size))
            // Timeout
            .layer(timeout_layer(self.config.timeout))
            // CORS
            .layer(cors_layer())
            // Tracing
            .layer(middleware::from_fn(tracing_middleware))
            // Request ID (outside tracing so the span can see it)
            .layer(middleware::from_fn(request_id_middleware))
            // Caller identity (outermost - runs first)
            .layer(middleware::from_fn(identity_middleware))
    }

    /// Run the server with graceful shutdown
    pub async fn run(self) -> Result<(), ApiError> {
        let app = self.router();
        let addr = self.config.addr;

        // Start the suggestion worker in the background
        let worker = SuggestionWorker::new(self.app_state.clone())
            .with_poll_interval(self.config.worker_poll_interval);
        tokio::spawn(async move {
            worker.run().await;
        });

        tracing::info!("Starting Shelfmark API server on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}

/// Initialize tracing subscriber
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,shelfmark_api=debug,tower_http=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.addr.port(), 8080);
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.queue.max_concurrent, 2);
    }

    #[test]
    fn test_request_timeout_fits_inside_server_timeout() {
        let config = ServerConfig::default();
        assert!(config.queue.request_timeout < config.timeout);
    }
}
