//! API routes for Shelfmark suggestion endpoints

use axum::{
    extract::{Extension, Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::OpenApi;

use crate::error::{ApiError, ApiResult};
use crate::middleware::UserId;
use crate::results::{self, TaskOutcome};
use crate::state::AppState;
use shelfmark_queue::{Priority, TaskId, TaskKind};

/// Health check response
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Basic health check handler (lightweight)
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Basic health check", body = HealthResponse)
    )
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Suggestion request for a bookmark
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SuggestionRequest {
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    #[serde(default)]
    pub existing_tags: Vec<String>,
}

/// Combined tag and category suggestions
///
/// Fields are independently nullable: a failed or timed-out branch comes
/// back as `null` while the other still carries its suggestion.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SuggestionResponse {
    pub tags: Option<Vec<String>>,
    pub category: Option<String>,
    pub confidence: Option<f32>,
    pub tokens_used: u32,
    /// Task IDs still running past the request deadline; poll them on
    /// `/api/v1/tasks/{id}`
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pending: Vec<String>,
}

/// Reject obviously unusable bookmark input before it reaches the queue.
fn validate_bookmark(title: &str, url: &str) -> Result<(), ApiError> {
    if title.trim().is_empty() {
        return Err(ApiError::Validation("title must not be empty".to_string()));
    }
    if url.trim().is_empty() {
        return Err(ApiError::Validation("url must not be empty".to_string()));
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ApiError::Validation(
            "url must use the http or https scheme".to_string(),
        ));
    }
    Ok(())
}

/// Suggest tags and a category for a bookmark
#[utoipa::path(
    post,
    path = "/api/v1/suggestions",
    request_body = SuggestionRequest,
    responses(
        (status = 200, description = "Suggestions, possibly partial", body = SuggestionResponse),
        (status = 401, description = "Missing caller identity"),
        (status = 422, description = "Invalid input"),
        (status = 429, description = "Rate limited")
    ),
    security(
        ("user_id" = [])
    )
)]
pub async fn create_suggestions(
    Extension(user_id): Extension<UserId>,
    State(state): State<AppState>,
    Json(req): Json<SuggestionRequest>,
) -> ApiResult<Json<SuggestionResponse>> {
    validate_bookmark(&req.title, &req.url)?;
    state.rate_limiter().try_acquire(&user_id.0).await?;

    let payload = serde_json::json!({
        "title": req.title,
        "url": req.url,
        "description": req.description,
        "existing_tags": req.existing_tags,
    });

    let queue = state.queue();
    let tags_id = queue.enqueue(&user_id.0, TaskKind::Tags, payload.clone(), Priority::Normal);
    let category_id = queue.enqueue(&user_id.0, TaskKind::Category, payload, Priority::Normal);

    let deadline = queue.config().request_timeout;
    let store = state.results();
    let (tags_outcome, category_outcome) = tokio::join!(
        results::wait_for(&store, &tags_id, deadline),
        results::wait_for(&store, &category_id, deadline),
    );

    // A provider-side rate limit on either branch fails the whole request,
    // so the client backs off instead of hammering the other branch.
    for outcome in [&tags_outcome, &category_outcome].into_iter().flatten() {
        if outcome.rate_limited {
            return Err(ApiError::RateLimited);
        }
    }

    let mut response = SuggestionResponse {
        tags: None,
        category: None,
        confidence: None,
        tokens_used: 0,
        pending: Vec::new(),
    };
    let mut served = false;

    match tags_outcome {
        Some(outcome) if outcome.success => {
            response.tags = field(&outcome, "tags");
            response.tokens_used += outcome.tokens_used;
            served = true;
        }
        Some(_) => {}
        None => {
            warn!(task_id = %tags_id, user_id = %user_id.0, "Tag suggestion timed out");
            response.pending.push(tags_id.to_string());
        }
    }

    match category_outcome {
        Some(outcome) if outcome.success => {
            response.category = field(&outcome, "category");
            response.confidence = field(&outcome, "confidence");
            response.tokens_used += outcome.tokens_used;
            served = true;
        }
        Some(_) => {}
        None => {
            warn!(task_id = %category_id, user_id = %user_id.0, "Category suggestion timed out");
            response.pending.push(category_id.to_string());
        }
    }

    if served {
        state.metrics().record_suggestion_served();
    }

    Ok(Json(response))
}

/// Pull one field out of an outcome's data payload.
fn field<T: serde::de::DeserializeOwned>(outcome: &TaskOutcome, name: &str) -> Option<T> {
    outcome
        .data
        .as_ref()
        .and_then(|data| data.get(name))
        .and_then(|value| serde_json::from_value(value.clone()).ok())
}

/// Summary request for a bookmarked page
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SummaryRequest {
    pub title: String,
    pub url: String,
    pub description: Option<String>,
}

/// Suggested summary, `null` when the provider could not produce one
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SummaryResponse {
    pub summary: Option<String>,
    pub tokens_used: u32,
    /// Task ID still running past the request deadline; poll it on
    /// `/api/v1/tasks/{id}`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending: Option<String>,
}

/// Summarize a bookmarked page
#[utoipa::path(
    post,
    path = "/api/v1/summaries",
    request_body = SummaryRequest,
    responses(
        (status = 200, description = "Summary, null if unavailable", body = SummaryResponse),
        (status = 401, description = "Missing caller identity"),
        (status = 422, description = "Invalid input"),
        (status = 429, description = "Rate limited")
    ),
    security(
        ("user_id" = [])
    )
)]
pub async fn create_summary(
    Extension(user_id): Extension<UserId>,
    State(state): State<AppState>,
    Json(req): Json<SummaryRequest>,
) -> ApiResult<Json<SummaryResponse>> {
    validate_bookmark(&req.title, &req.url)?;
    state.rate_limiter().try_acquire(&user_id.0).await?;

    let payload = serde_json::json!({
        "title": req.title,
        "url": req.url,
        "description": req.description,
    });

    let queue = state.queue();
    let task_id = queue.enqueue(&user_id.0, TaskKind::Summary, payload, Priority::High);

    let deadline = queue.config().request_timeout;
    let outcome = results::wait_for(&state.results(), &task_id, deadline).await;

    match outcome {
        Some(outcome) if outcome.rate_limited => Err(ApiError::RateLimited),
        Some(outcome) if outcome.success => {
            state.metrics().record_suggestion_served();
            Ok(Json(SummaryResponse {
                summary: field(&outcome, "summary"),
                tokens_used: outcome.tokens_used,
                pending: None,
            }))
        }
        Some(_) => Ok(Json(SummaryResponse {
            summary: None,
            tokens_used: 0,
            pending: None,
        })),
        None => {
            warn!(task_id = %task_id, user_id = %user_id.0, "Summary timed out");
            Ok(Json(SummaryResponse {
                summary: None,
                tokens_used: 0,
                pending: Some(task_id.to_string()),
            }))
        }
    }
}

/// Queue status response
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct QueueStatusResponse {
    pub pending: usize,
    pub active: usize,
    pub max_concurrent: usize,
}

/// Get admission queue status
#[utoipa::path(
    get,
    path = "/api/v1/queue/status",
    responses(
        (status = 200, description = "Current queue depth and activity", body = QueueStatusResponse),
        (status = 401, description = "Missing caller identity")
    ),
    security(
        ("user_id" = [])
    )
)]
pub async fn get_queue_status(State(state): State<AppState>) -> Json<QueueStatusResponse> {
    let status = state.queue().status();
    Json(QueueStatusResponse {
        pending: status.pending,
        active: status.active,
        max_concurrent: status.max_concurrent,
    })
}

/// Task status response (for polling)
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct TaskStatusResponse {
    pub task_id: String,
    pub status: String,
    pub kind: Option<String>,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub rate_limited: bool,
    pub tokens_used: u32,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Get the outcome of a task
///
/// Unknown task IDs report as `pending`; the queue does not index tasks by
/// ID, so a never-enqueued ID and a not-yet-executed one look the same.
#[utoipa::path(
    get,
    path = "/api/v1/tasks/{id}",
    params(
        ("id" = String, Path, description = "Task ID returned alongside a suggestion request")
    ),
    responses(
        (status = 200, description = "Task outcome, or pending", body = TaskStatusResponse),
        (status = 401, description = "Missing caller identity")
    ),
    security(
        ("user_id" = [])
    )
)]
pub async fn get_task_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<TaskStatusResponse> {
    let task_id = TaskId::from(id);

    match results::get(&state.results(), &task_id).await {
        Some(outcome) => Json(TaskStatusResponse {
            task_id: task_id.to_string(),
            status: if outcome.success {
                "completed"
            } else {
                "failed"
            }
            .to_string(),
            kind: Some(outcome.kind.to_string()),
            data: outcome.data,
            error: outcome.error,
            rate_limited: outcome.rate_limited,
            tokens_used: outcome.tokens_used,
            completed_at: Some(outcome.completed_at),
        }),
        None => Json(TaskStatusResponse {
            task_id: task_id.to_string(),
            status: "pending".to_string(),
            kind: None,
            data: None,
            error: None,
            rate_limited: false,
            tokens_used: 0,
            completed_at: None,
        }),
    }
}

/// Prometheus metrics handler
#[utoipa::path(
    get,
    path = "/metrics",
    responses(
        (status = 200, description = "Prometheus formatted metrics", body = String)
    )
)]
pub async fn get_prometheus_metrics(State(state): State<AppState>) -> String {
    state.metrics().snapshot().to_prometheus()
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        create_suggestions,
        create_summary,
        get_queue_status,
        get_task_status,
        get_prometheus_metrics,
    ),
    components(
        schemas(
            HealthResponse,
            SuggestionRequest, SuggestionResponse,
            SummaryRequest, SummaryResponse,
            QueueStatusResponse,
            TaskStatusResponse,
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "user_id",
                utoipa::openapi::security::SecurityScheme::ApiKey(
                    utoipa::openapi::security::ApiKey::Header(
                        utoipa::openapi::security::ApiKeyValue::new("x-user-id"),
                    ),
                ),
            )
        }
    }
}

/// Build the API router
pub fn api_router(state: AppState) -> Router {
    use utoipa_swagger_ui::SwaggerUi;

    Router::new()
        // Documentation endpoints
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public endpoints
        .route("/health", get(health))
        .route("/metrics", get(get_prometheus_metrics))
        // Suggestion endpoints
        .route("/api/v1/suggestions", post(create_suggestions))
        .route("/api/v1/summaries", post(create_summary))
        // Queue introspection
        .route("/api/v1/queue/status", get(get_queue_status))
        .route("/api/v1/tasks/{id}", get(get_task_status))
        // State
        .with_state(state)
}
