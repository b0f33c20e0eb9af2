//! Remote chat-completion client
//!
//! One POST per query, no retries. Sampling is pinned low and the reply
//! length is capped; neither is configurable.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};

use crate::credential::Credential;
use crate::prompt::{ChatMessage, PendingRequest};
use crate::{Error, Result};

/// GitHub Models chat-completions endpoint
pub const DEFAULT_ENDPOINT: &str = "https://models.inference.ai.azure.com/chat/completions";

/// Model used when none is configured
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Sampling temperature, kept low to suppress hallucination
pub const TEMPERATURE: f32 = 0.2;

/// Reply length cap
pub const MAX_TOKENS: u32 = 200;

/// Sends a built request to a language model and returns its reply
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Complete a request
    ///
    /// # Errors
    ///
    /// - [`Error::MissingCredential`] if `credential` is `None`; no request is sent
    /// - [`Error::Transport`] on network failure, timeout, or a non-2xx status
    /// - [`Error::MalformedResponse`] if the body has no `choices[0].message.content`
    async fn complete(
        &self,
        request: &PendingRequest,
        credential: Option<&Credential>,
    ) -> Result<String>;
}

/// Completion client for OpenAI-compatible HTTP endpoints
#[derive(Debug, Clone)]
pub struct HttpCompletionClient {
    client: Client,
    endpoint: String,
    model: String,
}

impl HttpCompletionClient {
    /// Create a client for an endpoint and model
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be constructed
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            model: model.into(),
        })
    }
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    async fn complete(
        &self,
        request: &PendingRequest,
        credential: Option<&Credential>,
    ) -> Result<String> {
        let Some(credential) = credential else {
            return Err(Error::MissingCredential);
        };

        let body = CompletionRequest {
            messages: request.messages(),
            model: &self.model,
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        tracing::debug!(
            request_id = %request.id,
            endpoint = %self.endpoint,
            model = %self.model,
            "sending completion request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header(AUTHORIZATION, credential.bearer())
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let text = response.text().await?;
        let reply = extract_reply(&text)?;

        tracing::debug!(
            request_id = %request.id,
            reply_len = reply.len(),
            "completion received"
        );

        Ok(reply)
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    messages: [ChatMessage; 2],
    model: &'a str,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Option<Vec<Choice>>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Pull `choices[0].message.content` out of a response body
fn extract_reply(body: &str) -> Result<String> {
    let response: CompletionResponse = serde_json::from_str(body)
        .map_err(|e| Error::MalformedResponse(format!("body is not a completion response: {e}")))?;

    let choices = response
        .choices
        .ok_or_else(|| Error::MalformedResponse("missing `choices`".to_string()))?;

    choices
        .into_iter()
        .next()
        .ok_or_else(|| Error::MalformedResponse("empty `choices`".to_string()))?
        .message
        .and_then(|m| m.content)
        .ok_or_else(|| Error::MalformedResponse("missing `choices[0].message.content`".to_string()))
}
