//! Prometheus metrics
//!
//! The recorder is process-global. Until [`init_metrics`] runs, the
//! `record_*` functions are no-ops.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

use crate::state::AppState;

const REQUESTS_TOTAL: &str = "voice_tutor_requests_total";
const ERRORS_TOTAL: &str = "voice_tutor_errors_total";
const STT_LATENCY: &str = "voice_tutor_stt_latency_seconds";
const LLM_LATENCY: &str = "voice_tutor_llm_latency_seconds";
const TTS_LATENCY: &str = "voice_tutor_tts_latency_seconds";
const TOTAL_LATENCY: &str = "voice_tutor_total_latency_seconds";

const LATENCY_BUCKETS: &[f64] = &[0.1, 0.25, 0.5, 1.0, 2.0, 4.0, 8.0, 15.0, 30.0, 60.0];

/// Install the global Prometheus recorder
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Suffix("_latency_seconds".to_string()),
            LATENCY_BUCKETS,
        )?
        .install_recorder()?;

    metrics::describe_counter!(REQUESTS_TOTAL, "Conversation turns by envelope status");
    metrics::describe_counter!(ERRORS_TOTAL, "Failed conversation turns by pipeline stage");
    metrics::describe_histogram!(STT_LATENCY, "Transcription latency");
    metrics::describe_histogram!(LLM_LATENCY, "Suggestion and reply latency");
    metrics::describe_histogram!(TTS_LATENCY, "Speech synthesis latency");
    metrics::describe_histogram!(TOTAL_LATENCY, "End-to-end turn latency");

    Ok(handle)
}

pub fn record_request(status: &'static str) {
    metrics::counter!(REQUESTS_TOTAL, "status" => status).increment(1);
}

pub fn record_error(stage: &'static str) {
    metrics::counter!(ERRORS_TOTAL, "stage" => stage).increment(1);
}

pub fn record_stt_latency(elapsed: Duration) {
    metrics::histogram!(STT_LATENCY).record(elapsed.as_secs_f64());
}

pub fn record_llm_latency(elapsed: Duration) {
    metrics::histogram!(LLM_LATENCY).record(elapsed.as_secs_f64());
}

pub fn record_tts_latency(elapsed: Duration) {
    metrics::histogram!(TTS_LATENCY).record(elapsed.as_secs_f64());
}

pub fn record_total_latency(elapsed: Duration) {
    metrics::histogram!(TOTAL_LATENCY).record(elapsed.as_secs_f64());
}

/// GET /metrics
pub async fn metrics_handler(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
            handle.render(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "metrics disabled").into_response(),
    }
}
