//! Assistant session
//!
//! A session owns everything a running assistant needs: the capture
//! controller, the query pipeline, and the view. `run` is the single event
//! loop. The in-flight query is polled inside the loop rather than awaited
//! inline, so triggers that arrive while it runs reach the controller and
//! are debounced instead of piling up.

use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::completion::CompletionClient;
use crate::credential::CredentialStore;
use crate::knowledge::KnowledgeStore;
use crate::locale::Locale;
use crate::pipeline::{QueryOutcome, QueryPipeline};
use crate::view::{ChatView, Speaker, Status};
use crate::voice::{
    CaptureEngine, CaptureState, SpeechEngine, SpeechOutput, VoiceCaptureController,
    VoiceSettings,
};

/// The user's start/stop press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trigger;

/// Collaborators a session is assembled from
pub struct Components {
    pub locale: Locale,
    pub voice: VoiceSettings,
    pub store: KnowledgeStore,
    pub completion: Arc<dyn CompletionClient>,
    pub credentials: Arc<dyn CredentialStore>,
    pub capture: Arc<dyn CaptureEngine>,
    pub speech: Arc<dyn SpeechEngine>,
    pub view: Arc<dyn ChatView>,
}

/// A running assistant
pub struct Session {
    controller: VoiceCaptureController,
    pipeline: Arc<QueryPipeline>,
    speech: SpeechOutput,
    credentials: Arc<dyn CredentialStore>,
    view: Arc<dyn ChatView>,
}

impl Session {
    #[must_use]
    pub fn new(components: Components) -> Self {
        let Components {
            locale,
            voice,
            store,
            completion,
            credentials,
            capture,
            speech,
            view,
        } = components;

        let speech = SpeechOutput::new(speech, voice);
        let controller = VoiceCaptureController::new(
            capture,
            speech.clone(),
            view.clone(),
            locale.tag(),
        );
        let pipeline = Arc::new(QueryPipeline::new(
            locale,
            store,
            completion,
            Arc::clone(&credentials),
            speech.clone(),
            view.clone(),
        ));

        Self {
            controller,
            pipeline,
            speech,
            credentials,
            view,
        }
    }

    /// Watch capture state transitions
    #[must_use]
    pub fn capture_state(&self) -> watch::Receiver<CaptureState> {
        self.controller.subscribe()
    }

    /// Speech output shared with the pipeline
    #[must_use]
    pub fn speech(&self) -> SpeechOutput {
        self.speech.clone()
    }

    /// Run until `shutdown` fires, or the trigger channel closes and no
    /// query is in flight
    pub async fn run(mut self, mut triggers: mpsc::Receiver<Trigger>, shutdown: CancellationToken) {
        self.announce();

        let mut inflight: Option<BoxFuture<'static, QueryOutcome>> = None;
        let mut triggers_open = true;

        loop {
            tokio::select! {
                biased;

                () = shutdown.cancelled() => {
                    tracing::debug!("shutdown requested");
                    break;
                }
                Some(event) = self.controller.next_event() => {
                    if let Some(transcript) = self.controller.on_event(event) {
                        self.view.show_message(Speaker::User, &transcript);
                        let pipeline = Arc::clone(&self.pipeline);
                        inflight = Some(async move { pipeline.handle(&transcript).await }.boxed());
                    }
                }
                outcome = poll_inflight(&mut inflight), if inflight.is_some() => {
                    inflight = None;
                    tracing::debug!(?outcome, "query finished");
                    self.controller.finish();
                }
                trigger = triggers.recv(), if triggers_open => {
                    match trigger {
                        Some(Trigger) => {
                            if let Err(e) = self.controller.trigger().await {
                                tracing::warn!(error = %e, "trigger failed");
                            }
                        }
                        None => {
                            tracing::debug!("trigger channel closed");
                            triggers_open = false;
                        }
                    }
                }
                else => break,
            }

            if !triggers_open && inflight.is_none() {
                break;
            }
        }

        self.speech.cancel();
        tracing::info!("session ended");
    }

    /// Initial status, and the credential prompt if none is stored yet
    fn announce(&self) {
        if self.controller.is_supported() {
            self.view.set_status(Status::Ready);
        }

        if self.credentials.get().is_none() {
            tracing::info!("no credential stored yet");
            self.view.request_credential();
        }
    }
}

async fn poll_inflight(inflight: &mut Option<BoxFuture<'static, QueryOutcome>>) -> QueryOutcome {
    match inflight {
        Some(query) => query.await,
        None => std::future::pending().await,
    }
}
