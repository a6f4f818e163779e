//! Conversation endpoints
//!
//! `POST /api/conversation` takes a multipart form with the recorded `audio`
//! file and the `history` so far as a JSON string, and answers with a
//! response envelope. Start, end and feedback take and return plain JSON.

use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, Multipart, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use voice_tutor_core::{ConversationTurn, ResponseEnvelope};
use voice_tutor_pipeline::{TurnOutcome, TurnRequest};

use crate::metrics::{
    record_error, record_llm_latency, record_request, record_stt_latency, record_total_latency,
    record_tts_latency,
};
use crate::state::AppState;
use crate::ServerError;

const FORM_UNREADABLE: &str = "Unable to parse form";
const INVALID_HISTORY: &str = "Invalid history format";
const AUDIO_MISSING: &str = "Unable to get audio file";
const INVALID_BODY: &str = "Invalid request body";
const NOTHING_TO_REVIEW: &str = "No conversation available for feedback";
const NOTHING_SAVED: &str = "No conversation found";

/// Where the client goes once a conversation is saved
pub const ANALYSIS_REDIRECT: &str = "/conversation-analysis";

struct AudioUpload {
    bytes: Vec<u8>,
    file_name: Option<String>,
}

#[derive(Default)]
struct TurnForm {
    audio: Option<AudioUpload>,
    history: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HistoryBody {
    #[serde(default)]
    history: Option<Vec<ConversationTurn>>,
}

/// POST /api/conversation
pub async fn handle_turn(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ResponseEnvelope>, ServerError> {
    let multipart = multipart.map_err(|e| {
        tracing::warn!(error = %e, "Error parsing form");
        ServerError::InvalidRequest(FORM_UNREADABLE)
    })?;
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("conversation_turn", %request_id);
    run_turn(state, headers, multipart).instrument(span).await
}

async fn run_turn(
    state: AppState,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<ResponseEnvelope>, ServerError> {
    let form = read_form(multipart).await?;
    let history = parse_history(form.history.as_deref())?;
    let audio = form.audio.ok_or(ServerError::InvalidRequest(AUDIO_MISSING))?;
    let speaker_name = state.speakers.resolve(&headers).await;

    tracing::info!(
        audio_bytes = audio.bytes.len(),
        history_turns = history.len(),
        "Conversation turn received"
    );

    // Dropping this future (client disconnect, request timeout) cancels
    // every provider call still in flight.
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let request = TurnRequest {
        audio: audio.bytes,
        file_name: audio.file_name,
        history,
        speaker_name,
    };

    match state.orchestrator.run_turn(request, &cancel).await {
        Ok(outcome) => {
            record_outcome(&outcome);
            Ok(Json(outcome.envelope))
        }
        Err(err) => {
            record_error(err.stage().as_str());
            record_request("error");
            Err(err.into())
        }
    }
}

/// POST /api/conversation/start
///
/// Opening history for a new conversation.
pub async fn start(State(state): State<AppState>, headers: HeaderMap) -> Json<serde_json::Value> {
    let speaker = state
        .orchestrator
        .resolve_speaker(state.speakers.resolve(&headers).await);
    let greeting = state.orchestrator.greeting_turn();

    Json(serde_json::json!({
        "status": "success",
        "history": [greeting],
        "user_name": speaker,
    }))
}

/// POST /api/conversation/end
///
/// Saves the final history for the speaker.
pub async fn end(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ServerError> {
    let history = parse_history_body(&body)?;
    let speaker = state
        .orchestrator
        .resolve_speaker(state.speakers.resolve(&headers).await);

    let turns = history.len();
    state.store.save(&speaker, history).await?;
    tracing::info!(speaker = %speaker, turns, "Conversation ended");

    Ok(Json(serde_json::json!({
        "status": "success",
        "redirect": ANALYSIS_REDIRECT,
    })))
}

/// GET /api/conversation/latest
///
/// The speaker's most recently saved history.
pub async fn latest(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<ConversationTurn>>, ServerError> {
    let speaker = state
        .orchestrator
        .resolve_speaker(state.speakers.resolve(&headers).await);

    match state.store.latest(&speaker).await? {
        Some(saved) => Ok(Json(saved.history)),
        None => Err(ServerError::NotFound(NOTHING_SAVED)),
    }
}

/// POST /api/conversation/feedback
///
/// Reviews the posted history, or the speaker's last saved conversation
/// when the body carries none.
pub async fn feedback(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ServerError> {
    let mut history = parse_history_body(&body)?;
    if history.is_empty() {
        let speaker = state
            .orchestrator
            .resolve_speaker(state.speakers.resolve(&headers).await);
        history = state
            .store
            .latest(&speaker)
            .await?
            .map(|saved| saved.history)
            .unwrap_or_default();
    }
    if history.is_empty() {
        return Err(ServerError::InvalidRequest(NOTHING_TO_REVIEW));
    }

    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let feedback = state
        .orchestrator
        .generate_feedback(&history, &cancel)
        .await
        .map_err(|err| {
            record_error(err.stage().as_str());
            ServerError::from(err)
        })?;

    Ok(Json(serde_json::json!({ "feedback": feedback })))
}

async fn read_form(mut multipart: Multipart) -> Result<TurnForm, ServerError> {
    let mut form = TurnForm::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "Error parsing form");
                return Err(ServerError::InvalidRequest(FORM_UNREADABLE));
            }
        };

        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("audio") => {
                let file_name = field.file_name().map(str::to_string);
                let bytes = field.bytes().await.map_err(|e| {
                    tracing::warn!(error = %e, "Error reading audio file");
                    ServerError::InvalidRequest(AUDIO_MISSING)
                })?;
                form.audio = Some(AudioUpload {
                    bytes: bytes.to_vec(),
                    file_name,
                });
            }
            Some("history") => {
                let text = field.text().await.map_err(|e| {
                    tracing::warn!(error = %e, "Error reading history field");
                    ServerError::InvalidRequest(INVALID_HISTORY)
                })?;
                form.history = Some(text);
            }
            other => tracing::debug!(field = ?other, "Ignoring form field"),
        }
    }

    Ok(form)
}

/// Absent, blank or `null` history is an empty conversation
fn parse_history(raw: Option<&str>) -> Result<Vec<ConversationTurn>, ServerError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(Vec::new()),
        Some(json) => serde_json::from_str::<Option<Vec<ConversationTurn>>>(json)
            .map(Option::unwrap_or_default)
            .map_err(|e| {
                tracing::warn!(error = %e, "Error unmarshaling history");
                ServerError::InvalidRequest(INVALID_HISTORY)
            }),
    }
}

fn parse_history_body(body: &[u8]) -> Result<Vec<ConversationTurn>, ServerError> {
    serde_json::from_slice::<HistoryBody>(body)
        .map(|b| b.history.unwrap_or_default())
        .map_err(|e| {
            tracing::warn!(error = %e, "Error decoding request body");
            ServerError::InvalidRequest(INVALID_BODY)
        })
}

fn record_outcome(outcome: &TurnOutcome) {
    let timings = &outcome.timings;
    record_stt_latency(timings.transcription);
    record_llm_latency(timings.completion);
    record_tts_latency(timings.synthesis);
    record_total_latency(timings.total);
    record_request(outcome.envelope.status().as_str());
}

#[cfg(test)]
mod tests {
    use super::*;
    use voice_tutor_core::TurnRole;

    #[test]
    fn test_parse_history() {
        assert!(parse_history(None).unwrap().is_empty());
        assert!(parse_history(Some("  ")).unwrap().is_empty());
        assert!(parse_history(Some("null")).unwrap().is_empty());

        let history = parse_history(Some(
            r#"[{"role":"assistant","content":"Hello!"},
                {"role":"user","content":"hi","suggestion":"Hi.","user_name":"Ana"}]"#,
        ))
        .unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].role, TurnRole::User);
        assert_eq!(history[1].suggestion.as_deref(), Some("Hi."));
    }

    #[test]
    fn test_parse_history_rejects_bad_input() {
        for raw in ["not json", r#"{"role":"user"}"#, r#"[{"role":"system","content":"x"}]"#] {
            let err = parse_history(Some(raw)).unwrap_err();
            assert!(matches!(err, ServerError::InvalidRequest(INVALID_HISTORY)));
        }
    }

    #[test]
    fn test_parse_history_body() {
        assert!(parse_history_body(b"{}").unwrap().is_empty());
        assert!(parse_history_body(br#"{"history":null}"#).unwrap().is_empty());
        let history =
            parse_history_body(br#"{"history":[{"role":"assistant","content":"Hello!"}]}"#)
                .unwrap();
        assert_eq!(history.len(), 1);
        assert!(matches!(
            parse_history_body(b""),
            Err(ServerError::InvalidRequest(INVALID_BODY))
        ));
    }
}
