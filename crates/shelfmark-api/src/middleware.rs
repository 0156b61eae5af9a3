//! Tower middleware for the Shelfmark API

use axum::{
    extract::Request,
    http::{header, Method},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::Instrument;

use crate::error::ApiError;

/// Authenticated caller identity, inserted by [`identity_middleware`]
#[derive(Clone, Debug)]
pub struct UserId(pub String);

/// Request ID wrapper
#[derive(Clone, Debug)]
pub struct RequestId(pub String);

/// Paths served without a caller identity
fn is_public(path: &str) -> bool {
    path == "/health"
        || path == "/metrics"
        || path.starts_with("/swagger-ui")
        || path.starts_with("/api-docs")
}

/// Caller identity middleware
///
/// The gateway in front of this service authenticates users and forwards the
/// verified identity in the `x-user-id` header; this middleware only requires
/// that the header is present. OPTIONS requests pass through so CORS
/// preflights work without the custom header.
pub async fn identity_middleware(mut request: Request, next: Next) -> Result<Response, ApiError> {
    let path = request.uri().path();
    if request.method() == Method::OPTIONS || is_public(path) {
        return Ok(next.run(request).await);
    }

    let user_id = request
        .headers()
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Missing x-user-id header".to_string()))?
        .to_string();

    request.extensions_mut().insert(UserId(user_id));

    Ok(next.run(request).await)
}

/// Request tracing middleware
pub async fn tracing_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_else(|| "unknown".to_string());
    let user_id = request
        .extensions()
        .get::<UserId>()
        .map(|id| id.0.clone())
        .unwrap_or_else(|| "anonymous".to_string());

    let span = tracing::info_span!(
        "http_request",
        method = %method,
        path = %path,
        request_id = %request_id,
        user_id = %user_id,
    );

    let response = next.run(request).instrument(span).await;

    tracing::info!(
        method = %method,
        path = %path,
        status = %response.status().as_u16(),
        latency_ms = %start.elapsed().as_millis(),
        "Request completed"
    );

    response
}

/// Request ID middleware
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = uuid::Uuid::new_v4().to_string();

    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    let mut response = next.run(request).await;

    response
        .headers_mut()
        .insert("X-Request-ID", request_id.parse().unwrap());

    response
}

/// CORS configuration helper
/// Reads allowed origins from SHELFMARK_CORS_ORIGINS env var (comma-separated)
/// Falls back to restrictive default if not set
pub fn cors_layer() -> tower_http::cors::CorsLayer {
    use tower_http::cors::{AllowOrigin, CorsLayer};

    let origins = std::env::var("SHELFMARK_CORS_ORIGINS").ok();

    let allow_origin = match origins {
        Some(origins_str) if !origins_str.is_empty() => {
            let origins: Vec<axum::http::HeaderValue> = origins_str
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                tracing::warn!("SHELFMARK_CORS_ORIGINS is set but contains no valid origins, using restrictive default");
                AllowOrigin::exact("https://localhost".parse().unwrap())
            } else {
                tracing::info!("CORS configured for {} origin(s)", origins.len());
                AllowOrigin::list(origins)
            }
        }
        _ => {
            tracing::warn!("SHELFMARK_CORS_ORIGINS not set, using restrictive CORS (localhost only)");
            AllowOrigin::exact("https://localhost".parse().unwrap())
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::HeaderName::from_static("x-user-id"),
        ])
        .max_age(std::time::Duration::from_secs(3600))
}

/// Timeout layer helper
pub fn timeout_layer(duration: std::time::Duration) -> tower_http::timeout::TimeoutLayer {
    tower_http::timeout::TimeoutLayer::new(duration)
}

/// Request body size limit
pub fn body_limit_layer(limit: usize) -> tower_http::limit::RequestBodyLimitLayer {
    tower_http::limit::RequestBodyLimitLayer::new(limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_paths_skip_identity() {
        assert!(is_public("/health"));
        assert!(is_public("/metrics"));
        assert!(is_public("/swagger-ui/index.html"));
        assert!(is_public("/api-docs/openapi.json"));
        assert!(!is_public("/api/v1/suggestions"));
        assert!(!is_public("/"));
    }
}
