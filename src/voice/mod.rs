//! Voice processing module
//!
//! Capture and speech engines are host capabilities consumed through traits;
//! this module owns the state around them.

mod capture;
mod controller;
mod speech;

pub use capture::{CaptureEngine, CaptureEvent, CaptureEventReceiver, CaptureEventSender};
pub use controller::{CaptureState, TriggerOutcome, VoiceCaptureController};
pub use speech::{SpeechEngine, SpeechOutput, SpeechState, Utterance, VoiceSettings};
