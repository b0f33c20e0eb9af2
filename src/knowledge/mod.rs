//! Knowledge base for query context
//!
//! - **source**: Load knowledge items from a JSON file or an HTTP(S) URL
//! - **retriever**: Select the items relevant to a query by token overlap

mod retriever;
mod source;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use retriever::ContextRetriever;
pub use source::{HttpSource, JsonFileSource, KnowledgeSource, source_for};

/// A single topic/content entry of the knowledge base
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeItem {
    /// Short topic label (e.g. "hours")
    #[serde(default)]
    pub topic: String,
    /// Text handed to the model when the item matches
    #[serde(default)]
    pub content: String,
}

impl KnowledgeItem {
    /// Create a new item
    #[must_use]
    pub fn new(topic: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            content: content.into(),
        }
    }
}

/// Ordered, read-only collection of knowledge items
///
/// Loaded once at startup; cloning shares the underlying items.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeStore {
    items: Arc<[KnowledgeItem]>,
}

impl KnowledgeStore {
    /// Create a store from already loaded items
    #[must_use]
    pub fn new(items: Vec<KnowledgeItem>) -> Self {
        Self {
            items: items.into(),
        }
    }

    /// Load from a source, degrading to an empty store on failure
    pub async fn load_or_empty(source: &dyn KnowledgeSource) -> Self {
        match source.load().await {
            Ok(items) => {
                tracing::info!(
                    source = %source.describe(),
                    items = items.len(),
                    "knowledge base loaded"
                );
                Self::new(items)
            }
            Err(e) => {
                tracing::warn!(
                    source = %source.describe(),
                    error = %e,
                    "failed to load knowledge base, continuing with an empty store"
                );
                Self::default()
            }
        }
    }

    /// Items in load order
    #[must_use]
    pub fn items(&self) -> &[KnowledgeItem] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
