//! Query pipeline
//!
//! Transcript in, spoken answer out: retrieve context, build the prompt,
//! call the model, then display and speak the reply. Every failure ends in
//! the same fixed apology; nothing is retried.

use std::sync::Arc;

use tracing::Instrument;

use crate::completion::CompletionClient;
use crate::credential::CredentialStore;
use crate::knowledge::{ContextRetriever, KnowledgeStore};
use crate::locale::Locale;
use crate::prompt::PromptBuilder;
use crate::view::{ChatView, Speaker, Status};
use crate::voice::SpeechOutput;

/// How a query ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    /// Reply displayed and spoken
    Answered(String),
    /// No credential configured; nothing was sent
    MissingCredential,
    /// Completion failed; the apology was displayed
    Failed,
}

/// Orchestrates retrieval, prompting, completion, and output for one query
pub struct QueryPipeline {
    locale: Locale,
    store: KnowledgeStore,
    retriever: ContextRetriever,
    prompt: PromptBuilder,
    completion: Arc<dyn CompletionClient>,
    credentials: Arc<dyn CredentialStore>,
    speech: SpeechOutput,
    view: Arc<dyn ChatView>,
}

impl QueryPipeline {
    #[must_use]
    pub fn new(
        locale: Locale,
        store: KnowledgeStore,
        completion: Arc<dyn CompletionClient>,
        credentials: Arc<dyn CredentialStore>,
        speech: SpeechOutput,
        view: Arc<dyn ChatView>,
    ) -> Self {
        Self {
            locale,
            store,
            retriever: ContextRetriever::new(locale),
            prompt: PromptBuilder::new(locale),
            completion,
            credentials,
            speech,
            view,
        }
    }

    /// Answer one transcript
    pub async fn handle(&self, transcript: &str) -> QueryOutcome {
        let Some(credential) = self.credentials.get() else {
            tracing::warn!("no credential configured, requesting one");
            self.view.set_status(Status::MissingCredential);
            self.view.request_credential();
            return QueryOutcome::MissingCredential;
        };

        let context = self.retriever.retrieve(transcript, self.store.items());
        let request = self.prompt.build(transcript, &context);
        let span = tracing::info_span!("query", request_id = %request.id);

        let result = self
            .completion
            .complete(&request, Some(&credential))
            .instrument(span)
            .await;

        match result {
            Ok(reply) => {
                tracing::info!(request_id = %request.id, reply_len = reply.len(), "query answered");
                self.view.show_message(Speaker::Assistant, &reply);
                self.speech.speak(&reply);
                self.view.set_status(Status::Ready);
                QueryOutcome::Answered(reply)
            }
            Err(e) => {
                tracing::error!(request_id = %request.id, error = %e, "query failed");
                self.view.show_message(Speaker::Assistant, self.locale.apology());
                self.view.set_status(Status::Error);
                QueryOutcome::Failed
            }
        }
    }
}
