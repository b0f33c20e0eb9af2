//! Capture lifecycle state machine
//!
//! ```text
//!   Idle ──trigger──▶ Listening ──final transcript──▶ Processing ──finish──▶ Idle
//!                        │
//!                        └──end / error, no transcript──▶ Idle
//! ```
//!
//! Triggers while `Processing` are ignored, so a second completion request
//! can never be built while one is in flight.
//!
//! Each start hands the engine a fresh event channel and drops the previous
//! receiver, so a late notification from an earlier listening period can
//! never reach the current one.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use crate::Result;
use crate::view::{Status, StatusSink};
use crate::voice::capture::{CaptureEngine, CaptureEvent, CaptureEventReceiver};
use crate::voice::speech::SpeechOutput;

/// Capture lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Listening,
    Processing,
}

/// What a trigger did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// Capture started
    Started,
    /// Early stop requested; the state changes once the engine reports the end
    Stopping,
    /// Ignored because a query is in flight
    Debounced,
    /// The host has no capture engine
    NotSupported,
}

/// Drives the capture engine and hands finalized transcripts onward
pub struct VoiceCaptureController {
    engine: Arc<dyn CaptureEngine>,
    speech: SpeechOutput,
    status: Arc<dyn StatusSink>,
    lang: String,
    /// Receiver for the current listening period only
    events: Option<CaptureEventReceiver>,
    state: watch::Sender<CaptureState>,
    supported: bool,
    transcript_seen: bool,
}

impl VoiceCaptureController {
    /// Create a controller for an engine
    ///
    /// The engine is checked once here. An unsupported engine reports
    /// [`Status::NotSupported`] and never leaves `Idle`.
    pub fn new(
        engine: Arc<dyn CaptureEngine>,
        speech: SpeechOutput,
        status: Arc<dyn StatusSink>,
        lang: impl Into<String>,
    ) -> Self {
        let (state, _) = watch::channel(CaptureState::Idle);
        let supported = engine.is_supported();

        if supported {
            tracing::debug!("capture engine available");
        } else {
            tracing::warn!("capture engine not supported on this host");
            status.set_status(Status::NotSupported);
        }

        Self {
            engine,
            speech,
            status,
            lang: lang.into(),
            events: None,
            state,
            supported,
            transcript_seen: false,
        }
    }

    /// Handle the user's start/stop trigger
    ///
    /// # Errors
    ///
    /// Returns error if the engine fails to start or stop; the controller
    /// stays in its previous state
    pub async fn trigger(&mut self) -> Result<TriggerOutcome> {
        if !self.supported {
            self.status.set_status(Status::NotSupported);
            return Ok(TriggerOutcome::NotSupported);
        }

        match self.state() {
            CaptureState::Idle => {
                // Never talk over a new listening session
                self.speech.cancel();
                self.transcript_seen = false;

                let (sender, receiver) = mpsc::unbounded_channel();
                // Stale notifications from the previous period die with its receiver
                self.events = None;

                if let Err(e) = self.engine.start(&self.lang, sender).await {
                    tracing::warn!(error = %e, "failed to start capture");
                    self.status.set_status(Status::Error);
                    return Err(e);
                }

                self.events = Some(receiver);

                self.set_state(CaptureState::Listening);
                self.status.set_status(Status::Listening);
                tracing::info!("listening");
                Ok(TriggerOutcome::Started)
            }
            CaptureState::Listening => {
                self.engine.stop().await?;
                tracing::debug!("capture stop requested");
                Ok(TriggerOutcome::Stopping)
            }
            CaptureState::Processing => {
                tracing::debug!("ignoring trigger while processing");
                Ok(TriggerOutcome::Debounced)
            }
        }
    }

    /// Next notification of the current listening period
    ///
    /// Returns `None` while no capture has been started. An engine that
    /// drops its sender without reporting the end is treated as having ended.
    pub async fn next_event(&mut self) -> Option<CaptureEvent> {
        let receiver = self.events.as_mut()?;

        match receiver.recv().await {
            Some(event) => Some(event),
            None => {
                tracing::debug!("capture engine closed its event channel");
                self.events = None;
                Some(CaptureEvent::End)
            }
        }
    }

    /// Feed an engine notification of the current listening period
    ///
    /// Returns the transcript when the first final result of a listening
    /// period arrives; the controller is then `Processing` until [`finish`].
    ///
    /// [`finish`]: Self::finish
    pub fn on_event(&mut self, event: CaptureEvent) -> Option<String> {
        match (self.state(), event) {
            (CaptureState::Listening, CaptureEvent::Result { transcript, is_final: true })
                if !self.transcript_seen && !transcript.trim().is_empty() =>
            {
                self.transcript_seen = true;
                self.set_state(CaptureState::Processing);
                self.status.set_status(Status::Processing);
                tracing::info!(transcript, "transcript received");
                Some(transcript)
            }
            (_, CaptureEvent::Result { is_final, .. }) => {
                tracing::trace!(is_final, "discarding recognition result");
                None
            }
            (CaptureState::Listening, CaptureEvent::End) => {
                tracing::info!("capture ended without a transcript");
                self.set_state(CaptureState::Idle);
                self.status.set_status(Status::Ready);
                None
            }
            (CaptureState::Listening, CaptureEvent::Error(message)) => {
                tracing::warn!(error = %message, "capture engine error");
                self.set_state(CaptureState::Idle);
                self.status.set_status(Status::Error);
                None
            }
            (state, event) => {
                tracing::trace!(?state, ?event, "ignoring capture event");
                None
            }
        }
    }

    /// Return to `Idle` after the query pipeline completes
    pub fn finish(&mut self) {
        if self.state() == CaptureState::Processing {
            self.set_state(CaptureState::Idle);
            tracing::debug!("ready for next capture");
        }
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> CaptureState {
        *self.state.borrow()
    }

    /// Watch state transitions
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CaptureState> {
        self.state.subscribe()
    }

    /// Whether the engine is available
    #[must_use]
    pub const fn is_supported(&self) -> bool {
        self.supported
    }

    fn set_state(&self, state: CaptureState) {
        self.state.send_replace(state);
    }
}
