//! HTTP Endpoints
//!
//! REST API for the voice tutor.

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{HeaderValue, Method, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use voice_tutor_core::ResponseEnvelope;

use crate::conversation;
use crate::metrics::metrics_handler;
use crate::state::AppState;

const DEFAULT_ORIGIN: &str = "http://localhost:3000";
const REQUEST_TIMED_OUT: &str = "Request timed out";

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let server = &state.config.server;
    let cors_layer = build_cors_layer(&server.cors_origins, server.cors_enabled);
    let body_limit = DefaultBodyLimit::max(server.max_upload_bytes);
    let timeout = TimeoutLayer::new(Duration::from_secs(server.timeout_seconds));

    Router::new()
        // Conversation endpoints
        .route("/api/conversation", post(conversation::handle_turn))
        .route("/api/conversation/start", post(conversation::start))
        .route("/api/conversation/end", post(conversation::end))
        .route("/api/conversation/feedback", post(conversation::feedback))
        .route("/api/conversation/latest", get(conversation::latest))
        // Paths used by existing browser clients
        .route("/api/conversation/turn", post(conversation::handle_turn))
        .route("/api/feedback/generate", post(conversation::feedback))
        // Health check
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        // Prometheus metrics
        .route("/metrics", get(metrics_handler))
        .layer(body_limit)
        .layer(timeout)
        .layer(middleware::map_response(timeout_envelope))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
}

/// Build CORS layer from configured origins
///
/// - If cors_enabled is false, returns permissive layer (for dev)
/// - If cors_origins is empty, defaults to localhost:3000
/// - Otherwise, uses the configured origins
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        tracing::warn!("CORS is disabled - allowing all origins (NOT FOR PRODUCTION)");
        return CorsLayer::permissive();
    }

    let parsed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!("Invalid CORS origin: {}", origin);
                None
            })
        })
        .collect();

    if parsed_origins.is_empty() {
        tracing::info!("No usable CORS origins configured, defaulting to {}", DEFAULT_ORIGIN);
        return CorsLayer::new()
            .allow_origin(HeaderValue::from_static(DEFAULT_ORIGIN))
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any);
    }

    tracing::info!("CORS configured with {} origins", parsed_origins.len());
    CorsLayer::new()
        .allow_origin(parsed_origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

/// The timeout layer answers with a bare 408; give it the error envelope
async fn timeout_envelope(response: Response) -> Response {
    if response.status() != StatusCode::REQUEST_TIMEOUT {
        return response;
    }
    tracing::warn!("Request timed out");
    (
        StatusCode::REQUEST_TIMEOUT,
        Json(ResponseEnvelope::error(REQUEST_TIMED_OUT)),
    )
        .into_response()
}

/// Liveness
async fn health_check() -> &'static str {
    "OK"
}

/// Which providers this instance talks to
async fn readiness_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let orchestrator = &state.orchestrator;
    Json(serde_json::json!({
        "status": "ready",
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.config.environment,
        "providers": {
            "asr": orchestrator.stt_provider(),
            "llm": orchestrator.completion_model(),
            "tts": orchestrator.tts_provider(),
        },
        "conversation_store": if state.store.is_durable() { "durable" } else { "memory" },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[tokio::test]
    async fn test_timeout_envelope() {
        let response = timeout_envelope(StatusCode::REQUEST_TIMEOUT.into_response()).await;
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"], REQUEST_TIMED_OUT);

        let response = timeout_envelope(Response::new(Body::from("OK"))).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
