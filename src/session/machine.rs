//! Recording session state machine.
//!
//! Idle → Recording → Stopped → (handoff | reset). The machine is the single
//! logical owner of session state; audio and speech results are delivered by
//! independently-cancellable tasks funneling into one event queue with one
//! consumer. The elapsed-time ticker is cancelled on every transition out of
//! Recording so timers never leak.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::capture::{AudioArtifact, AudioCapture};
use super::recognizer::SpeechRecognizer;
use super::status::{SessionPhase, SessionState, SessionStatusHandle};
use super::{SessionError, SessionEvent};

/// What `stop` reports back to the caller.
#[derive(Debug, Clone)]
pub struct StopSummary {
    pub elapsed_seconds: u64,
    pub transcript: String,
    pub artifact_bytes: usize,
}

/// The completed capture handed off to the generation side.
#[derive(Debug, Clone)]
pub struct CompletedCapture {
    pub audio: AudioArtifact,
    pub transcript: String,
}

pub struct RecordingMachine {
    capture: Box<dyn AudioCapture>,
    recognizer: Option<Box<dyn SpeechRecognizer>>,
    status: SessionStatusHandle,
    events_tx: Option<mpsc::Sender<SessionEvent>>,
    pump: Option<JoinHandle<()>>,
    ticker: Option<JoinHandle<()>>,
}

impl RecordingMachine {
    pub fn new(
        capture: Box<dyn AudioCapture>,
        recognizer: Option<Box<dyn SpeechRecognizer>>,
        status: SessionStatusHandle,
    ) -> Self {
        Self {
            capture,
            recognizer,
            status,
            events_tx: None,
            pump: None,
            ticker: None,
        }
    }

    pub fn status_handle(&self) -> SessionStatusHandle {
        self.status.clone()
    }

    /// Idle → Recording. Acquires the microphone, starts the recognition
    /// stream if one exists, and spawns the event pump and 1-second ticker.
    pub async fn start(&mut self) -> Result<(), SessionError> {
        if self.status.phase().await != SessionPhase::Idle {
            return Err(SessionError::InvalidTransition(
                "session must be idle to start recording",
            ));
        }

        // Fresh state before acquiring anything.
        self.status.with(|s| *s = SessionState::default()).await;

        if let Err(e) = self.capture.start() {
            warn!("Failed to acquire microphone: {}", e);
            self.status
                .with(|s| s.last_error = Some(e.to_string()))
                .await;
            return Err(e);
        }

        // The capture succeeding is the transition; everything past this
        // point degrades rather than aborts.
        self.status
            .with(|s| s.phase = SessionPhase::Recording)
            .await;

        let (tx, mut rx) = mpsc::channel::<SessionEvent>(64);

        let live = match &mut self.recognizer {
            Some(recognizer) => match recognizer.start(tx.clone()) {
                Ok(()) => true,
                Err(e) => {
                    warn!("Speech recognition failed to start: {}", e);
                    self.status
                        .with(|s| s.last_error = Some(e.to_string()))
                        .await;
                    false
                }
            },
            None => {
                info!("No speech recognizer on this platform; recording without live transcript");
                false
            }
        };
        self.status.with(|s| s.live_transcript = live).await;

        // Single consumer, single writer. Events arriving outside the
        // Recording phase are dropped.
        let status = self.status.clone();
        let pump = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                status
                    .with(|state| {
                        if state.phase != SessionPhase::Recording {
                            return;
                        }
                        match event {
                            SessionEvent::Speech(seg) if seg.is_final => {
                                state.transcript.push_final(&seg.text)
                            }
                            SessionEvent::Speech(seg) => state.transcript.set_interim(&seg.text),
                            SessionEvent::Tick => {
                                if !state.paused {
                                    state.elapsed_seconds += 1;
                                }
                            }
                        }
                    })
                    .await;
            }
        });

        let ticker_tx = tx.clone();
        let ticker = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            interval.tick().await; // the first tick completes immediately
            loop {
                interval.tick().await;
                if ticker_tx.send(SessionEvent::Tick).await.is_err() {
                    break;
                }
            }
        });

        self.events_tx = Some(tx);
        self.pump = Some(pump);
        self.ticker = Some(ticker);

        info!("Recording session started (live transcript: {})", live);
        Ok(())
    }

    /// Recording → Stopped. Cancels the ticker, stops the recognition
    /// stream, drains the event queue, seals the audio artifact and freezes
    /// the transcript as the editable seed.
    pub async fn stop(&mut self) -> Result<StopSummary, SessionError> {
        if self.status.phase().await != SessionPhase::Recording {
            return Err(SessionError::InvalidTransition(
                "no recording in progress",
            ));
        }

        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }

        if let Some(recognizer) = &mut self.recognizer {
            recognizer.stop();
        }

        // Drop our sender; with the ticker aborted and the recognizer
        // stopped the pump drains whatever is queued and exits.
        self.events_tx.take();
        if let Some(pump) = self.pump.take() {
            let _ = pump.await;
        }

        let artifact = match self.capture.stop() {
            Ok(artifact) => artifact,
            Err(e) => {
                self.status
                    .with(|s| {
                        s.phase = SessionPhase::Stopped;
                        s.last_error = Some(e.to_string());
                    })
                    .await;
                return Err(e);
            }
        };

        let summary = self
            .status
            .with(|state| {
                state.transcript.freeze();
                let artifact_bytes = artifact.bytes.len();
                state.artifact = Some(artifact);
                state.phase = SessionPhase::Stopped;
                StopSummary {
                    elapsed_seconds: state.elapsed_seconds,
                    transcript: state.transcript.text().to_string(),
                    artifact_bytes,
                }
            })
            .await;

        info!(
            "Recording stopped: {}s, {} transcript chars, {} audio bytes",
            summary.elapsed_seconds,
            summary.transcript.len(),
            summary.artifact_bytes
        );

        Ok(summary)
    }

    /// Stopped → Idle: discard the artifact and transcript. The next start
    /// acquires the microphone from scratch.
    pub async fn reset(&mut self) -> Result<(), SessionError> {
        if self.status.phase().await != SessionPhase::Stopped {
            return Err(SessionError::InvalidTransition(
                "only a stopped session can be reset",
            ));
        }

        self.status.with(|s| *s = SessionState::default()).await;
        info!("Recording session reset");
        Ok(())
    }

    /// Suspend the elapsed-time counter. Capture keeps running.
    pub async fn pause(&mut self) -> Result<(), SessionError> {
        self.set_paused(true).await
    }

    pub async fn resume(&mut self) -> Result<(), SessionError> {
        self.set_paused(false).await
    }

    async fn set_paused(&mut self, paused: bool) -> Result<(), SessionError> {
        self.status
            .with(|s| {
                if s.phase != SessionPhase::Recording {
                    return Err(SessionError::InvalidTransition(
                        "pause only applies while recording",
                    ));
                }
                s.paused = paused;
                Ok(())
            })
            .await
    }

    /// Replace the frozen transcript with the user's edited text.
    pub async fn set_transcript(&mut self, text: &str) -> Result<(), SessionError> {
        self.status
            .with(|s| {
                if s.phase != SessionPhase::Stopped {
                    return Err(SessionError::InvalidTransition(
                        "transcript is editable only after recording stops",
                    ));
                }
                s.transcript.replace(text);
                Ok(())
            })
            .await
    }

    /// Hand off the completed capture and tear the session down to Idle.
    pub async fn finish(&mut self) -> Result<CompletedCapture, SessionError> {
        self.status
            .with(|s| {
                if s.phase != SessionPhase::Stopped {
                    return Err(SessionError::InvalidTransition(
                        "no completed capture to hand off",
                    ));
                }
                let audio = s.artifact.take().ok_or(SessionError::InvalidTransition(
                    "no completed capture to hand off",
                ))?;
                let transcript = s.transcript.text().to_string();
                *s = SessionState::default();
                Ok(CompletedCapture { audio, transcript })
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::recognizer::SpeechSegment;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex as StdMutex};

    /// Capture double: counts acquisitions, yields a fixed artifact.
    struct FakeCapture {
        starts: Arc<AtomicUsize>,
        deny: bool,
        active: bool,
    }

    impl FakeCapture {
        fn new() -> (Self, Arc<AtomicUsize>) {
            let starts = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    starts: starts.clone(),
                    deny: false,
                    active: false,
                },
                starts,
            )
        }

        fn denying() -> Self {
            Self {
                starts: Arc::new(AtomicUsize::new(0)),
                deny: true,
                active: false,
            }
        }
    }

    impl AudioCapture for FakeCapture {
        fn start(&mut self) -> Result<(), SessionError> {
            if self.deny {
                return Err(SessionError::PermissionDenied("denied by test".to_string()));
            }
            self.starts.fetch_add(1, Ordering::SeqCst);
            self.active = true;
            Ok(())
        }

        fn stop(&mut self) -> Result<AudioArtifact, SessionError> {
            self.active = false;
            Ok(AudioArtifact {
                bytes: vec![0u8; 512],
                mime_type: "audio/webm",
            })
        }

        fn is_active(&self) -> bool {
            self.active
        }
    }

    type SenderSlot = Arc<StdMutex<Option<mpsc::Sender<SessionEvent>>>>;

    /// Recognizer double: exposes its event sender so tests can script
    /// segments, and drops it on stop as the trait requires.
    struct ScriptedRecognizer {
        slot: SenderSlot,
        unavailable: bool,
    }

    impl ScriptedRecognizer {
        fn new() -> (Self, SenderSlot) {
            let slot: SenderSlot = Arc::new(StdMutex::new(None));
            (
                Self {
                    slot: slot.clone(),
                    unavailable: false,
                },
                slot,
            )
        }

        fn unavailable() -> Self {
            Self {
                slot: Arc::new(StdMutex::new(None)),
                unavailable: true,
            }
        }
    }

    impl SpeechRecognizer for ScriptedRecognizer {
        fn start(&mut self, events: mpsc::Sender<SessionEvent>) -> Result<(), SessionError> {
            if self.unavailable {
                return Err(SessionError::RecognitionUnavailable(
                    "no engine on this platform".to_string(),
                ));
            }
            *self.slot.lock().unwrap() = Some(events);
            Ok(())
        }

        fn stop(&mut self) {
            self.slot.lock().unwrap().take();
        }
    }

    async fn send_event(slot: &SenderSlot, event: SessionEvent) {
        let tx = slot.lock().unwrap().as_ref().unwrap().clone();
        tx.send(event).await.unwrap();
        // The clone drops here; only the recognizer keeps a sender alive.
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    fn machine_with_recognizer() -> (RecordingMachine, SenderSlot, Arc<AtomicUsize>) {
        let (capture, starts) = FakeCapture::new();
        let (recognizer, slot) = ScriptedRecognizer::new();
        let machine = RecordingMachine::new(
            Box::new(capture),
            Some(Box::new(recognizer)),
            SessionStatusHandle::default(),
        );
        (machine, slot, starts)
    }

    #[tokio::test]
    async fn test_final_segments_join_with_single_space() {
        let (mut machine, slot, _) = machine_with_recognizer();
        machine.start().await.unwrap();

        send_event(&slot, SessionEvent::Speech(SpeechSegment::final_segment("turn on"))).await;
        send_event(&slot, SessionEvent::Speech(SpeechSegment::final_segment("the machine"))).await;
        settle().await;

        let summary = machine.stop().await.unwrap();
        assert_eq!(summary.transcript, "turn on the machine");
    }

    #[tokio::test]
    async fn test_interim_segments_are_never_committed() {
        let (mut machine, slot, _) = machine_with_recognizer();
        machine.start().await.unwrap();

        send_event(&slot, SessionEvent::Speech(SpeechSegment::final_segment("turn on"))).await;
        send_event(&slot, SessionEvent::Speech(SpeechSegment::interim("the mach"))).await;
        settle().await;

        let snap = machine.status_handle().snapshot().await;
        assert_eq!(snap.transcript, "turn on the mach");

        let summary = machine.stop().await.unwrap();
        assert_eq!(summary.transcript, "turn on");
    }

    #[tokio::test]
    async fn test_stop_before_any_final_yields_empty_editable_transcript() {
        let (mut machine, _slot, _) = machine_with_recognizer();
        machine.start().await.unwrap();

        let summary = machine.stop().await.unwrap();
        assert_eq!(summary.transcript, "");
        assert!(summary.artifact_bytes > 0);

        // Still editable after stopping.
        machine.set_transcript("typed by hand instead").await.unwrap();
        let snap = machine.status_handle().snapshot().await;
        assert_eq!(snap.transcript, "typed by hand instead");
    }

    #[tokio::test]
    async fn test_permission_denied_keeps_session_idle() {
        let mut machine = RecordingMachine::new(
            Box::new(FakeCapture::denying()),
            None,
            SessionStatusHandle::default(),
        );

        let err = machine.start().await.unwrap_err();
        assert!(matches!(err, SessionError::PermissionDenied(_)));

        let snap = machine.status_handle().snapshot().await;
        assert_eq!(snap.phase, SessionPhase::Idle);
        assert!(snap.last_error.is_some());

        // Retry works once the platform allows it.
        let (capture, _) = FakeCapture::new();
        machine.capture = Box::new(capture);
        machine.start().await.unwrap();
        assert_eq!(machine.status_handle().phase().await, SessionPhase::Recording);
    }

    #[tokio::test]
    async fn test_recognizer_unavailable_degrades_gracefully() {
        let (capture, _) = FakeCapture::new();
        let mut machine = RecordingMachine::new(
            Box::new(capture),
            Some(Box::new(ScriptedRecognizer::unavailable())),
            SessionStatusHandle::default(),
        );

        machine.start().await.unwrap();

        let snap = machine.status_handle().snapshot().await;
        assert_eq!(snap.phase, SessionPhase::Recording);
        assert!(!snap.live_transcript);

        let summary = machine.stop().await.unwrap();
        assert!(summary.artifact_bytes > 0);
    }

    #[tokio::test]
    async fn test_events_rejected_after_stop() {
        let (mut machine, slot, _) = machine_with_recognizer();
        machine.start().await.unwrap();

        let weak = slot.lock().unwrap().as_ref().unwrap().downgrade();
        machine.stop().await.unwrap();

        // Every sender is gone and the queue is drained: late deliveries
        // have nowhere to land.
        assert!(weak.upgrade().is_none());

        let snap = machine.status_handle().snapshot().await;
        assert_eq!(snap.transcript, "");
    }

    #[tokio::test]
    async fn test_manual_ticks_advance_elapsed_and_pause_gates_them() {
        let (mut machine, slot, _) = machine_with_recognizer();
        machine.start().await.unwrap();

        for _ in 0..3 {
            send_event(&slot, SessionEvent::Tick).await;
        }
        settle().await;
        assert_eq!(machine.status_handle().snapshot().await.elapsed_seconds, 3);

        machine.pause().await.unwrap();
        send_event(&slot, SessionEvent::Tick).await;
        settle().await;
        assert_eq!(machine.status_handle().snapshot().await.elapsed_seconds, 3);

        machine.resume().await.unwrap();
        send_event(&slot, SessionEvent::Tick).await;
        settle().await;
        assert_eq!(machine.status_handle().snapshot().await.elapsed_seconds, 4);

        machine.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_reset_then_start_reacquires_microphone() {
        let (mut machine, _slot, starts) = machine_with_recognizer();

        machine.start().await.unwrap();
        machine.stop().await.unwrap();
        machine.reset().await.unwrap();
        assert_eq!(machine.status_handle().phase().await, SessionPhase::Idle);

        machine.start().await.unwrap();
        assert_eq!(starts.load(Ordering::SeqCst), 2);

        let snap = machine.status_handle().snapshot().await;
        assert_eq!(snap.elapsed_seconds, 0);
        assert_eq!(snap.transcript, "");
        assert!(snap.artifact_bytes.is_none());
    }

    #[tokio::test]
    async fn test_finish_hands_off_and_tears_down() {
        let (mut machine, slot, _) = machine_with_recognizer();
        machine.start().await.unwrap();
        send_event(&slot, SessionEvent::Speech(SpeechSegment::final_segment("check the valve"))).await;
        settle().await;
        machine.stop().await.unwrap();

        let capture = machine.finish().await.unwrap();
        assert_eq!(capture.transcript, "check the valve");
        assert_eq!(capture.audio.mime_type, "audio/webm");
        assert!(!capture.audio.bytes.is_empty());

        assert_eq!(machine.status_handle().phase().await, SessionPhase::Idle);
        assert!(matches!(
            machine.finish().await.unwrap_err(),
            SessionError::InvalidTransition(_)
        ));
    }

    #[tokio::test]
    async fn test_invalid_transitions_are_rejected() {
        let (mut machine, _slot, _) = machine_with_recognizer();

        assert!(machine.stop().await.is_err());
        assert!(machine.reset().await.is_err());
        assert!(machine.set_transcript("x").await.is_err());

        machine.start().await.unwrap();
        assert!(machine.start().await.is_err());
        assert!(machine.set_transcript("x").await.is_err());

        machine.stop().await.unwrap();
        assert!(machine.pause().await.is_err());
    }
}
