//! Recording session control endpoints.
//!
//! The recording machine holds a cpal stream and stays pinned to the main
//! task; handlers talk to it through a command channel with oneshot replies
//! and read status through the shared handle.

use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tokio::sync::{mpsc, oneshot};
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::session::{CompletedCapture, SessionError, SessionStatusHandle, StopSummary};

/// Commands the API sends to the machine's owning task.
pub enum SessionCommand {
    Start(oneshot::Sender<Result<(), SessionError>>),
    Stop(oneshot::Sender<Result<StopSummary, SessionError>>),
    Reset(oneshot::Sender<Result<(), SessionError>>),
    Pause(oneshot::Sender<Result<(), SessionError>>),
    Resume(oneshot::Sender<Result<(), SessionError>>),
    SetTranscript(String, oneshot::Sender<Result<(), SessionError>>),
    Finish(oneshot::Sender<Result<CompletedCapture, SessionError>>),
}

#[derive(Clone)]
pub struct SessionApiState {
    pub tx: mpsc::Sender<SessionCommand>,
    pub status: SessionStatusHandle,
}

impl SessionApiState {
    /// Send a command and wait for the machine's reply.
    pub async fn dispatch<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<Result<T, SessionError>>) -> SessionCommand,
    ) -> ApiResult<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(make(reply_tx))
            .await
            .map_err(|_| ApiError::internal("Recording machine is not running"))?;

        let result = reply_rx
            .await
            .map_err(|_| ApiError::internal("Recording machine dropped the request"))?;

        result.map_err(ApiError::from)
    }
}

#[derive(Debug, serde::Deserialize)]
pub struct TranscriptEdit {
    pub transcript: String,
}

pub fn router(state: SessionApiState) -> Router {
    Router::new()
        .route("/session/start", post(start_session))
        .route("/session/stop", post(stop_session))
        .route("/session/reset", post(reset_session))
        .route("/session/pause", post(pause_session))
        .route("/session/resume", post(resume_session))
        .route("/session/transcript", post(edit_transcript))
        .route("/session/status", get(session_status))
        .with_state(state)
}

async fn start_session(State(state): State<SessionApiState>) -> ApiResult<Json<Value>> {
    info!("Session start requested via API");
    state.dispatch(SessionCommand::Start).await?;

    Ok(Json(json!({
        "success": true,
        "phase": state.status.phase().await.as_str(),
    })))
}

async fn stop_session(State(state): State<SessionApiState>) -> ApiResult<Json<Value>> {
    info!("Session stop requested via API");
    let summary = state.dispatch(SessionCommand::Stop).await?;

    Ok(Json(json!({
        "success": true,
        "phase": "stopped",
        "elapsed_seconds": summary.elapsed_seconds,
        "transcript": summary.transcript,
        "artifact_bytes": summary.artifact_bytes,
    })))
}

async fn reset_session(State(state): State<SessionApiState>) -> ApiResult<Json<Value>> {
    info!("Session reset requested via API");
    state.dispatch(SessionCommand::Reset).await?;

    Ok(Json(json!({ "success": true, "phase": "idle" })))
}

async fn pause_session(State(state): State<SessionApiState>) -> ApiResult<Json<Value>> {
    state.dispatch(SessionCommand::Pause).await?;
    Ok(Json(json!({ "success": true, "paused": true })))
}

async fn resume_session(State(state): State<SessionApiState>) -> ApiResult<Json<Value>> {
    state.dispatch(SessionCommand::Resume).await?;
    Ok(Json(json!({ "success": true, "paused": false })))
}

async fn edit_transcript(
    State(state): State<SessionApiState>,
    Json(body): Json<TranscriptEdit>,
) -> ApiResult<Json<Value>> {
    state
        .dispatch(|reply| SessionCommand::SetTranscript(body.transcript, reply))
        .await?;

    Ok(Json(json!({ "success": true })))
}

async fn session_status(State(state): State<SessionApiState>) -> Json<Value> {
    let snapshot = state.status.snapshot().await;
    Json(json!(snapshot))
}
