//! Recording & transcription session.
//!
//! Coordinates two concurrent capture streams (raw audio and incremental
//! speech recognition) into one coherent, user-editable artifact pair
//! (audio + transcript).

use thiserror::Error;

pub mod capture;
pub mod machine;
pub mod recognizer;
pub mod status;
pub mod transcript;

pub use capture::{AudioArtifact, AudioCapture, MicCapture};
pub use machine::{CompletedCapture, RecordingMachine, StopSummary};
pub use recognizer::{SpeechRecognizer, SpeechSegment};
pub use status::{SessionPhase, SessionSnapshot, SessionState, SessionStatusHandle};
pub use transcript::TranscriptBuffer;

/// Events funneled into the session's single-consumer queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Speech(SpeechSegment),
    /// Periodic 1-second timer pulse; purely observational.
    Tick,
}

#[derive(Debug, Error)]
pub enum SessionError {
    /// The platform declined microphone access. Recoverable: the session
    /// stays Idle and the user may retry.
    #[error("Microphone permission denied: {0}")]
    PermissionDenied(String),

    /// The platform has no speech recognition engine. Soft degradation:
    /// recording proceeds without a live transcript.
    #[error("Speech recognition unavailable: {0}")]
    RecognitionUnavailable(String),

    #[error("Invalid session transition: {0}")]
    InvalidTransition(&'static str),

    #[error("Audio capture failed: {0}")]
    Capture(String),
}
