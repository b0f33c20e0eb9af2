//! Shared test utilities
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use voxkb::voice::{CaptureEngine, CaptureEvent, CaptureEventSender, SpeechEngine, Utterance};
use voxkb::{
    ChatView, CompletionClient, Credential, Error, KnowledgeItem, KnowledgeStore, PendingRequest,
    Result, Speaker, Status, StatusSink,
};

/// The two-item knowledge base used across scenarios
#[must_use]
pub fn sample_store() -> KnowledgeStore {
    KnowledgeStore::new(vec![
        KnowledgeItem::new("nyitvatartás", "Hétfőtől péntekig 9 és 17 óra között vagyunk nyitva."),
        KnowledgeItem::new("hours", "We are open 9 to 5 on weekdays."),
    ])
}

/// Capture engine that replays one scripted batch of events per `start`
#[derive(Default)]
pub struct ScriptedCapture {
    unsupported: bool,
    script: Mutex<VecDeque<Vec<CaptureEvent>>>,
    sender: Mutex<Option<CaptureEventSender>>,
    starts: AtomicUsize,
    stops: AtomicUsize,
}

impl ScriptedCapture {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn unsupported() -> Self {
        Self {
            unsupported: true,
            ..Self::default()
        }
    }

    /// Queue the events emitted by the next `start`
    pub fn script(&self, events: Vec<CaptureEvent>) {
        self.script.lock().unwrap().push_back(events);
    }

    /// Queue a single final transcript followed by end-of-capture
    pub fn script_transcript(&self, text: &str) {
        self.script(vec![
            CaptureEvent::Result {
                transcript: text.to_string(),
                is_final: true,
            },
            CaptureEvent::End,
        ]);
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CaptureEngine for ScriptedCapture {
    fn is_supported(&self) -> bool {
        !self.unsupported
    }

    async fn start(&self, _lang: &str, events: CaptureEventSender) -> Result<()> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        let batch = self.script.lock().unwrap().pop_front().unwrap_or_default();
        for event in batch {
            let _ = events.send(event);
        }
        *self.sender.lock().unwrap() = Some(events);
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        if let Some(events) = self.sender.lock().unwrap().as_ref() {
            let _ = events.send(CaptureEvent::End);
        }
        Ok(())
    }
}

/// Speech engine that plays until cancelled and records what it was given
#[derive(Default)]
pub struct RecordingSpeech {
    spoken: Mutex<Vec<Utterance>>,
    interrupted: AtomicUsize,
}

impl RecordingSpeech {
    pub fn spoken(&self) -> Vec<Utterance> {
        self.spoken.lock().unwrap().clone()
    }

    pub fn interrupted(&self) -> usize {
        self.interrupted.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechEngine for RecordingSpeech {
    async fn speak(&self, utterance: Utterance, cancel: CancellationToken) -> Result<()> {
        self.spoken.lock().unwrap().push(utterance);
        cancel.cancelled().await;
        self.interrupted.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Completion client with a canned reply
///
/// With a gate, every call waits for one permit before answering.
pub struct StubCompletion {
    reply: Option<String>,
    calls: AtomicUsize,
    requests: Mutex<Vec<PendingRequest>>,
    gate: Option<Arc<Semaphore>>,
}

impl StubCompletion {
    #[must_use]
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    /// Every call fails with a malformed-response error
    #[must_use]
    pub fn failing() -> Self {
        Self {
            reply: None,
            ..Self::replying("")
        }
    }

    #[must_use]
    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<PendingRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for StubCompletion {
    async fn complete(
        &self,
        request: &PendingRequest,
        credential: Option<&Credential>,
    ) -> Result<String> {
        if credential.is_none() {
            return Err(Error::MissingCredential);
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }

        self.reply
            .clone()
            .ok_or_else(|| Error::MalformedResponse("no choices".to_string()))
    }
}

/// View that records everything it is asked to show
#[derive(Default)]
pub struct RecordingView {
    statuses: Mutex<Vec<Status>>,
    messages: Mutex<Vec<(Speaker, String)>>,
    credential_requests: AtomicUsize,
}

impl RecordingView {
    pub fn statuses(&self) -> Vec<Status> {
        self.statuses.lock().unwrap().clone()
    }

    pub fn last_status(&self) -> Option<Status> {
        self.statuses.lock().unwrap().last().copied()
    }

    pub fn messages(&self) -> Vec<(Speaker, String)> {
        self.messages.lock().unwrap().clone()
    }

    pub fn credential_requests(&self) -> usize {
        self.credential_requests.load(Ordering::SeqCst)
    }
}

impl StatusSink for RecordingView {
    fn set_status(&self, status: Status) {
        self.statuses.lock().unwrap().push(status);
    }
}

impl ChatView for RecordingView {
    fn show_message(&self, speaker: Speaker, text: &str) {
        self.messages.lock().unwrap().push((speaker, text.to_string()));
    }

    fn request_credential(&self) {
        self.credential_requests.fetch_add(1, Ordering::SeqCst);
    }
}

/// Poll `condition` until it holds, failing after one second
pub async fn wait_for(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(1), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}
