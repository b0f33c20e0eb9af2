//! Prompt construction
//!
//! The request sent to the model is always two messages: a system
//! instruction carrying the fixed rules with the retrieved context spliced
//! in, and a user message carrying the raw query. The ordering is part of the
//! anti-hallucination contract: role, the "answer exclusively from the
//! knowledge base" constraint, the knowledge block, then the rules.

use std::fmt::Write;

use serde::Serialize;
use uuid::Uuid;

use crate::locale::{Locale, PromptTemplate};

/// Chat role of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// A single chat message as sent on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// One in-flight completion request
#[derive(Debug, Clone)]
pub struct PendingRequest {
    /// Correlates log lines for a single query
    pub id: Uuid,
    /// Raw transcript, unmodified
    pub query: String,
    /// Retrieved context block (or the fallback sentence)
    pub context: String,
    /// Rendered system instruction
    pub system_prompt: String,
}

impl PendingRequest {
    /// System message followed by the user message
    #[must_use]
    pub fn messages(&self) -> [ChatMessage; 2] {
        [
            ChatMessage {
                role: Role::System,
                content: self.system_prompt.clone(),
            },
            ChatMessage {
                role: Role::User,
                content: self.query.clone(),
            },
        ]
    }
}

/// Combines the fixed rules, the context block, and the query
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptBuilder {
    locale: Locale,
}

impl PromptBuilder {
    #[must_use]
    pub const fn new(locale: Locale) -> Self {
        Self { locale }
    }

    /// Build the request for a query and its retrieved context
    #[must_use]
    pub fn build(&self, query: &str, context: &str) -> PendingRequest {
        PendingRequest {
            id: Uuid::new_v4(),
            query: query.to_string(),
            context: context.to_string(),
            system_prompt: render_system_prompt(self.locale.prompt_template(), context),
        }
    }
}

fn render_system_prompt(template: &PromptTemplate, context: &str) -> String {
    let mut prompt = format!(
        "{}\n{}\n{}\n{context}\n{}",
        template.role, template.exclusive, template.knowledge_header, template.rules_header
    );

    for (i, rule) in template.rules.iter().enumerate() {
        let _ = write!(prompt, "\n{}. {rule}", i + 1);
    }

    prompt
}
