//! Keyword-overlap context retrieval

use std::collections::HashSet;

use crate::knowledge::KnowledgeItem;
use crate::locale::Locale;

/// Builds the context block for a query
///
/// An item matches when any whitespace token of its topic or of its content
/// (case-folded) equals a token of the query. Every match is included, in
/// store order; there is no ranking, stemming, or punctuation stripping.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextRetriever {
    locale: Locale,
}

impl ContextRetriever {
    #[must_use]
    pub const fn new(locale: Locale) -> Self {
        Self { locale }
    }

    /// Return the newline-joined contents of all matching items, or the
    /// locale's fallback sentence when nothing matches
    #[must_use]
    pub fn retrieve(&self, query: &str, store: &[KnowledgeItem]) -> String {
        let words = tokenize(query);

        let matched: Vec<&str> = store
            .iter()
            .filter(|item| is_match(item, &words))
            .map(|item| item.content.as_str())
            .collect();

        tracing::debug!(
            query_tokens = words.len(),
            matched = matched.len(),
            store_size = store.len(),
            "context retrieved"
        );

        if matched.is_empty() {
            return self.locale.fallback_context().to_string();
        }

        matched.join("\n")
    }
}

/// Case-folded whitespace tokens
fn tokenize(text: &str) -> HashSet<String> {
    text.split_whitespace().map(str::to_lowercase).collect()
}

fn is_match(item: &KnowledgeItem, words: &HashSet<String>) -> bool {
    if item.content.trim().is_empty() || words.is_empty() {
        return false;
    }

    let overlaps = |text: &str| {
        text.split_whitespace()
            .any(|token| words.contains(&token.to_lowercase()))
    };

    overlaps(&item.topic) || overlaps(&item.content)
}
