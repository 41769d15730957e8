//! Session state and the shared status handle.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::capture::AudioArtifact;
use super::transcript::TranscriptBuffer;

/// Phase of a recording session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    Idle,
    Recording,
    Stopped,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Idle => "idle",
            SessionPhase::Recording => "recording",
            SessionPhase::Stopped => "stopped",
        }
    }
}

/// Full session state. Single writer: the machine and its event pump.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub phase: SessionPhase,
    pub elapsed_seconds: u64,
    pub paused: bool,
    /// False when the platform offers no speech recognition; recording
    /// still proceeds, the transcript just stops updating.
    pub live_transcript: bool,
    pub transcript: TranscriptBuffer,
    pub artifact: Option<AudioArtifact>,
    pub last_error: Option<String>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            phase: SessionPhase::Idle,
            elapsed_seconds: 0,
            paused: false,
            live_transcript: false,
            transcript: TranscriptBuffer::new(),
            artifact: None,
            last_error: None,
        }
    }
}

/// What status polls see; artifact bytes stay out of it.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub elapsed_seconds: u64,
    pub paused: bool,
    pub live_transcript: bool,
    pub transcript: String,
    pub artifact_bytes: Option<usize>,
    pub last_error: Option<String>,
}

/// Thread-safe handle shared between the machine, its event pump, and API
/// status reads.
#[derive(Clone, Default)]
pub struct SessionStatusHandle {
    inner: Arc<Mutex<SessionState>>,
}

impl SessionStatusHandle {
    pub async fn with<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        let mut state = self.inner.lock().await;
        f(&mut state)
    }

    pub async fn phase(&self) -> SessionPhase {
        self.inner.lock().await.phase
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.inner.lock().await;
        SessionSnapshot {
            phase: state.phase,
            elapsed_seconds: state.elapsed_seconds,
            paused: state.paused,
            live_transcript: state.live_transcript,
            transcript: state.transcript.display(),
            artifact_bytes: state.artifact.as_ref().map(|a| a.bytes.len()),
            last_error: state.last_error.clone(),
        }
    }
}
