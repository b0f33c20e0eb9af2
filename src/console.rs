//! Terminal front end
//!
//! Stands in for a microphone and a speaker: each line typed on stdin is one
//! utterance, and speech is simulated with a playback delay proportional to
//! the length of the answer.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::Result;
use crate::credential::CredentialStore;
use crate::locale::Locale;
use crate::session::Trigger;
use crate::view::{ChatView, Speaker, Status, StatusSink};
use crate::voice::{CaptureEngine, CaptureEvent, CaptureEventSender, SpeechEngine, Utterance};

/// Average speaking pace at rate 1.0
const WORDS_PER_SECOND: f32 = 2.5;

/// Capture engine fed by lines of text
///
/// `start` consumes the most recently queued line; lines typed while a query
/// was in flight are dropped with it.
#[derive(Debug, Default)]
pub struct ConsoleCaptureEngine {
    pending: Mutex<Option<String>>,
    events: Mutex<Option<CaptureEventSender>>,
}

impl ConsoleCaptureEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a line as the next utterance
    pub fn push_line(&self, line: &str) {
        if let Ok(mut pending) = self.pending.lock() {
            *pending = Some(line.trim().to_string());
        }
    }
}

#[async_trait]
impl CaptureEngine for ConsoleCaptureEngine {
    fn is_supported(&self) -> bool {
        true
    }

    async fn start(&self, lang: &str, events: CaptureEventSender) -> Result<()> {
        let line = self
            .pending
            .lock()
            .ok()
            .and_then(|mut pending| pending.take())
            .unwrap_or_default();

        tracing::debug!(lang, "console capture started");

        if !line.is_empty() {
            let _ = events.send(CaptureEvent::Result {
                transcript: line,
                is_final: true,
            });
        }
        let _ = events.send(CaptureEvent::End);

        if let Ok(mut slot) = self.events.lock() {
            *slot = Some(events);
        }
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        if let Some(events) = self.events.lock().ok().and_then(|slot| slot.clone()) {
            let _ = events.send(CaptureEvent::End);
        }
        Ok(())
    }
}

/// Speech engine that logs the utterance and waits out its playback time
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSpeechEngine;

impl ConsoleSpeechEngine {
    /// Simulated playback time for an utterance
    #[must_use]
    pub fn playback_time(utterance: &Utterance) -> Duration {
        #[allow(clippy::cast_precision_loss)]
        let words = utterance.text.split_whitespace().count() as f32;
        let rate = utterance.rate.max(0.1);
        Duration::from_secs_f32(words / (WORDS_PER_SECOND * rate))
    }
}

#[async_trait]
impl SpeechEngine for ConsoleSpeechEngine {
    async fn speak(&self, utterance: Utterance, cancel: CancellationToken) -> Result<()> {
        let duration = Self::playback_time(&utterance);
        tracing::debug!(
            lang = %utterance.lang,
            rate = utterance.rate,
            pitch = utterance.pitch,
            duration_ms = duration.as_millis(),
            "speaking"
        );

        tokio::select! {
            () = tokio::time::sleep(duration) => tracing::debug!("utterance finished"),
            () = cancel.cancelled() => tracing::debug!("utterance interrupted"),
        }
        Ok(())
    }
}

/// Prints chat messages and status lines to stdout
#[derive(Debug, Clone, Copy)]
pub struct ConsoleView {
    locale: Locale,
}

impl ConsoleView {
    #[must_use]
    pub const fn new(locale: Locale) -> Self {
        Self { locale }
    }
}

impl StatusSink for ConsoleView {
    fn set_status(&self, status: Status) {
        println!("[{}]", self.locale.status_text(status));
    }
}

impl ChatView for ConsoleView {
    fn show_message(&self, speaker: Speaker, text: &str) {
        match speaker {
            Speaker::User => println!("> {text}"),
            Speaker::Assistant => println!("< {text}"),
        }
    }

    fn request_credential(&self) {
        println!("{}", self.locale.credential_prompt());
    }
}

/// Read stdin until EOF or `/quit`
///
/// Plain lines become utterances followed by a trigger; `/token <value>`
/// writes the credential store. The trigger sender is dropped when the task
/// ends, which ends the session.
pub fn spawn_stdin_reader(
    engine: Arc<ConsoleCaptureEngine>,
    credentials: Arc<dyn CredentialStore>,
    triggers: mpsc::Sender<Trigger>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    tracing::error!(error = %e, "failed to read stdin");
                    break;
                }
            };

            match parse_command(&line) {
                Command::Quit => break,
                Command::Token(token) => match credentials.set(token) {
                    Ok(()) => println!("token saved"),
                    Err(e) => println!("token not saved: {e}"),
                },
                Command::Utterance(text) => {
                    engine.push_line(text);
                    if triggers.send(Trigger).await.is_err() {
                        break;
                    }
                }
            }
        }

        tracing::debug!("stdin reader finished");
    })
}

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Quit,
    Token(&'a str),
    Utterance(&'a str),
}

fn parse_command(line: &str) -> Command<'_> {
    let line = line.trim();
    if line == "/quit" {
        return Command::Quit;
    }
    if let Some(token) = line.strip_prefix("/token") {
        return Command::Token(token.trim());
    }
    Command::Utterance(line)
}
