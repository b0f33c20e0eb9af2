//! Spoken output sequencing
//!
//! Only one utterance plays at a time. A new `speak` cancels the current one
//! (last call wins) and starting a capture cancels whatever is playing.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::Result;

/// Text plus the voice parameters it should be spoken with
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    /// BCP 47 language tag (e.g. "hu-HU")
    pub lang: String,
    pub rate: f32,
    pub pitch: f32,
}

/// Voice parameters applied to every utterance
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceSettings {
    pub lang: String,
    pub rate: f32,
    pub pitch: f32,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            lang: "hu-HU".to_string(),
            rate: 1.0,
            pitch: 1.0,
        }
    }
}

/// Host text-to-speech capability
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    /// Speak an utterance, resolving when it ends naturally or `cancel` fires
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Speech`] if playback fails
    async fn speak(&self, utterance: Utterance, cancel: CancellationToken) -> Result<()>;
}

/// Whether an utterance is currently playing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechState {
    Silent,
    Speaking,
}

#[derive(Debug)]
struct Playback {
    /// Incremented per utterance so a stale completion can't mark a newer one silent
    generation: u64,
    cancel: Option<CancellationToken>,
}

/// Interruptible speech output
#[derive(Clone)]
pub struct SpeechOutput {
    engine: Arc<dyn SpeechEngine>,
    settings: VoiceSettings,
    playback: Arc<Mutex<Playback>>,
    /// Written only while `playback` is locked
    state: Arc<watch::Sender<SpeechState>>,
}

impl SpeechOutput {
    #[must_use]
    pub fn new(engine: Arc<dyn SpeechEngine>, settings: VoiceSettings) -> Self {
        Self {
            engine,
            settings,
            playback: Arc::new(Mutex::new(Playback {
                generation: 0,
                cancel: None,
            })),
            state: Arc::new(watch::channel(SpeechState::Silent).0),
        }
    }

    /// Start speaking `text`, replacing any utterance in progress
    ///
    /// Returns immediately; playback runs on a spawned task.
    pub fn speak(&self, text: &str) {
        let token = CancellationToken::new();

        let generation = {
            let Ok(mut playback) = self.playback.lock() else {
                return;
            };
            if let Some(previous) = playback.cancel.take() {
                previous.cancel();
                tracing::debug!("previous utterance cancelled");
            }
            playback.generation += 1;
            self.state.send_replace(SpeechState::Speaking);
            playback.cancel = Some(token.clone());
            playback.generation
        };

        let utterance = Utterance {
            text: text.to_string(),
            lang: self.settings.lang.clone(),
            rate: self.settings.rate,
            pitch: self.settings.pitch,
        };
        let engine = Arc::clone(&self.engine);
        let playback = Arc::clone(&self.playback);
        let state = Arc::clone(&self.state);

        tokio::spawn(async move {
            if let Err(e) = engine.speak(utterance, token).await {
                tracing::warn!(error = %e, "speech playback failed");
            }

            if let Ok(mut playback) = playback.lock() {
                if playback.generation == generation {
                    state.send_replace(SpeechState::Silent);
                    playback.cancel = None;
                }
            }
        });
    }

    /// Stop any utterance immediately
    pub fn cancel(&self) {
        if let Ok(mut playback) = self.playback.lock() {
            if let Some(token) = playback.cancel.take() {
                token.cancel();
                tracing::debug!("speech cancelled");
            }
            self.state.send_replace(SpeechState::Silent);
        }
    }

    /// Current speech state
    #[must_use]
    pub fn state(&self) -> SpeechState {
        *self.state.borrow()
    }

    /// Resolve once nothing is playing
    pub async fn wait_silent(&self) {
        let mut state = self.state.subscribe();
        let _ = state.wait_for(|s| *s == SpeechState::Silent).await;
    }
}
