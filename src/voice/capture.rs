//! Capture engine seam
//!
//! The speech-to-text engine itself is provided by the host. The controller
//! only needs to start and stop it and to receive its notifications, which
//! arrive as [`CaptureEvent`]s on a channel handed over at start. Every start
//! gets a new channel; senders from earlier starts are dead.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::Result;

/// Notification emitted by a capture engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    /// Recognition result; interim results have `is_final == false`
    Result { transcript: String, is_final: bool },
    /// The engine stopped capturing, with or without a result
    End,
    /// The engine failed during capture
    Error(String),
}

/// Sending half of the capture event channel
pub type CaptureEventSender = mpsc::UnboundedSender<CaptureEvent>;

/// Receiving half of the capture event channel
pub type CaptureEventReceiver = mpsc::UnboundedReceiver<CaptureEvent>;

/// Host speech-to-text capability
#[async_trait]
pub trait CaptureEngine: Send + Sync {
    /// Whether the host can capture at all; checked once before enabling the trigger
    fn is_supported(&self) -> bool;

    /// Begin capturing in the given language, reporting through `events`
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Capture`] if capture cannot begin
    async fn start(&self, lang: &str, events: CaptureEventSender) -> Result<()>;

    /// Request an early stop; the engine answers with [`CaptureEvent::End`]
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Capture`] if the engine rejects the request
    async fn stop(&self) -> Result<()>;
}
