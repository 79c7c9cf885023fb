//! Thin HTTP layer over the assistant handlers.
//!
//! One `AppState` carries the shared read-only QA handle plus the settings
//! each handler needs; every route is a plain request/response mapping with
//! no cross-request state. Blocking work (inference, capture) runs under
//! `spawn_blocking`.

use crate::assistant::{Assistant, Reply};
use crate::cli::Settings;
use crate::errors::AssistantError;
use crate::qa::QaHandle;
use crate::report::{analyze_csv, render_chart};
use crate::speech::{
    listen_and_transcribe, CaptureSettings, TranscriptionClient, SERVICE_ERROR_MESSAGE,
    UNINTELLIGIBLE_MESSAGE,
};
use crate::tips::random_tip;
use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;

const INDEX_HTML: &str = include_str!("index.html");
const DOCTOR_PNG: &[u8] = include_bytes!("../../assets/doctor.png");

/// Shared per-process state; read-only after startup
#[derive(Clone)]
pub struct AppState {
    assistant: Arc<Assistant>,
    transcriber: Arc<TranscriptionClient>,
    capture: CaptureSettings,
    model_id: String,
}

impl AppState {
    pub fn new(settings: &Settings, qa: QaHandle) -> Result<Self> {
        let transcriber = TranscriptionClient::new(
            settings.transcribe_url.clone(),
            settings.transcribe_timeout,
        )
        .context("failed to build transcription client")?;
        Ok(Self {
            assistant: Arc::new(Assistant::new(Arc::new(qa))),
            transcriber: Arc::new(transcriber),
            capture: settings.capture.clone(),
            model_id: settings.model_id.clone(),
        })
    }
}

/// Build the route table
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/assets/doctor.png", get(doctor_png))
        .route("/healthz", get(healthz))
        .route("/api/ask", post(ask_handler))
        .route("/api/voice", post(voice_handler))
        .route("/api/report", post(report_handler))
        .route("/api/report/chart", post(chart_handler))
        .route("/api/tip", get(tip_handler))
        .with_state(state)
}

/// Bind and serve until shutdown
pub async fn serve(settings: Settings, qa: QaHandle) -> Result<()> {
    let state = AppState::new(&settings, qa)?;
    let app = router(state);

    let addr: SocketAddr = settings
        .bind
        .parse()
        .with_context(|| format!("invalid bind address {}", settings.bind))?;
    log::info!("healthbuddy listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("server shutdown")?;
    Ok(())
}

#[derive(Debug, Deserialize)]
struct AskRequest {
    question: String,
}

#[derive(Debug, Serialize)]
struct VoiceResponse {
    transcript: String,
    #[serde(flatten)]
    reply: Reply,
}

#[derive(Debug, Serialize)]
struct HealthzResponse {
    status: &'static str,
    model: String,
}

#[derive(Debug, Serialize)]
struct TipResponse {
    tip: &'static str,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn doctor_png() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "image/png")], DOCTOR_PNG)
}

async fn healthz(State(state): State<AppState>) -> Json<HealthzResponse> {
    let model = match state.assistant.qa().unavailable_reason() {
        None => "ready".to_string(),
        Some(reason) => reason.to_string(),
    };
    Json(HealthzResponse {
        status: "ok",
        model,
    })
}

async fn tip_handler() -> Json<TipResponse> {
    Json(TipResponse { tip: random_tip() })
}

async fn ask_handler(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> std::result::Result<Json<Reply>, (StatusCode, Json<ErrorBody>)> {
    let question = request.question.trim().to_string();
    if question.is_empty() {
        return Err(bad_request("question must not be empty"));
    }
    let reply = respond_blocking(&state, question).await?;
    Ok(Json(reply))
}

async fn voice_handler(
    State(state): State<AppState>,
) -> std::result::Result<Json<VoiceResponse>, (StatusCode, Json<ErrorBody>)> {
    let transcript = listen_and_transcribe(state.capture.clone(), &state.transcriber)
        .await
        .map_err(speech_error)?;
    log::info!("voice query transcript: {}", transcript);
    let reply = respond_blocking(&state, transcript.clone()).await?;
    Ok(Json(VoiceResponse { transcript, reply }))
}

async fn report_handler(
    body: String,
) -> std::result::Result<Json<crate::report::Analysis>, (StatusCode, Json<ErrorBody>)> {
    let analysis = analyze_csv(&body).map_err(report_error)?;
    Ok(Json(analysis))
}

async fn chart_handler(
    body: String,
) -> std::result::Result<Response, (StatusCode, Json<ErrorBody>)> {
    let analysis = analyze_csv(&body).map_err(report_error)?;
    match render_chart(&analysis).map_err(internal_error)? {
        Some(png) => Ok(([(header::CONTENT_TYPE, "image/png")], png).into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

/// Inference is CPU-bound; keep it off the async workers
async fn respond_blocking(
    state: &AppState,
    question: String,
) -> std::result::Result<Reply, (StatusCode, Json<ErrorBody>)> {
    let assistant = state.assistant.clone();
    tokio::task::spawn_blocking(move || assistant.respond(&question))
        .await
        .map_err(|e| internal_error(AssistantError::Inference(e.to_string())))
}

fn speech_error(err: AssistantError) -> (StatusCode, Json<ErrorBody>) {
    match err {
        AssistantError::Unintelligible => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorBody {
                message: UNINTELLIGIBLE_MESSAGE.to_string(),
            }),
        ),
        AssistantError::TranscriptionService(detail) => {
            log::warn!("transcription service error: {}", detail);
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorBody {
                    message: SERVICE_ERROR_MESSAGE.to_string(),
                }),
            )
        }
        other => internal_error(other),
    }
}

fn report_error(err: AssistantError) -> (StatusCode, Json<ErrorBody>) {
    match err {
        AssistantError::Report(detail) => bad_request(detail),
        other => internal_error(other),
    }
}

fn bad_request(message: impl Into<String>) -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            message: message.into(),
        }),
    )
}

fn internal_error(err: AssistantError) -> (StatusCode, Json<ErrorBody>) {
    log::error!("internal error: {}", err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            message: err.to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speech_errors_map_to_distinct_messages() {
        let (status, body) = speech_error(AssistantError::Unintelligible);
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body.0.message, UNINTELLIGIBLE_MESSAGE);

        let (status, body) =
            speech_error(AssistantError::TranscriptionService("timeout".to_string()));
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body.0.message, SERVICE_ERROR_MESSAGE);
    }

    #[test]
    fn test_report_errors_are_bad_requests() {
        let (status, body) = report_error(AssistantError::Report(
            "non-numeric value in column 'Sugar Level' at line 2".to_string(),
        ));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.0.message.contains("Sugar Level"));
    }

    #[test]
    fn test_doctor_image_is_png() {
        assert_eq!(&DOCTOR_PNG[..4], &[0x89, b'P', b'N', b'G']);
    }
}
