//! Speech recognition boundary.
//!
//! The recognizer is a platform collaborator: when one exists it streams
//! incremental results into the session event queue; when the platform has
//! none, recording degrades gracefully: audio capture is authoritative and
//! the live transcript is a convenience.

use tokio::sync::mpsc;

use super::{SessionError, SessionEvent};

/// One incremental recognition result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechSegment {
    pub text: String,
    /// Final segments are committed; interim segments are display-only
    /// guesses the engine may still revise.
    pub is_final: bool,
}

impl SpeechSegment {
    pub fn final_segment(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: true,
        }
    }

    pub fn interim(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: false,
        }
    }
}

/// Continuous, interim-enabled speech recognition stream.
///
/// `start` hands the recognizer a sender into the session event queue and
/// fails with `RecognitionUnavailable` when the platform has no engine.
/// `stop` must drop the sender so the session's event pump can drain.
pub trait SpeechRecognizer {
    fn start(&mut self, events: mpsc::Sender<SessionEvent>) -> Result<(), SessionError>;

    fn stop(&mut self);
}
