//! View-layer seams
//!
//! The core never renders anything itself. It reports enumerated status
//! values and chat messages through these traits and the front end decides
//! how they look.

/// Status reported by the capture controller and the query pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Waiting for the next question
    Ready,
    /// Microphone capture in progress
    Listening,
    /// Transcript received, query in flight
    Processing,
    /// No bearer token configured
    MissingCredential,
    /// The last query failed
    Error,
    /// The host has no capture engine
    NotSupported,
}

/// Who a chat message belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Assistant,
}

/// Receives status updates
pub trait StatusSink: Send + Sync {
    fn set_status(&self, status: Status);
}

/// Full view surface used by the query pipeline
pub trait ChatView: StatusSink {
    /// Render a chat message
    fn show_message(&self, speaker: Speaker, text: &str);

    /// Ask the user to enter a credential (settings dialog, prompt, ...)
    fn request_credential(&self);
}
