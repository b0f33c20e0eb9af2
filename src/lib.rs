//! voxkb - Voice-driven knowledge base assistant
//!
//! This library provides the core of a spoken question-answering loop:
//! - Knowledge base loading and keyword retrieval
//! - Grounded prompt construction and chat-completion calls
//! - Capture lifecycle and interruptible speech output
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                    Front end                         │
//! │   Trigger  │  CaptureEngine  │  SpeechEngine  │ View │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                    Session                           │
//! │   VoiceCaptureController  │  QueryPipeline          │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │   ContextRetriever  │  PromptBuilder  │  Completion  │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod completion;
pub mod config;
pub mod console;
pub mod credential;
pub mod error;
pub mod knowledge;
pub mod locale;
pub mod pipeline;
pub mod prompt;
pub mod session;
pub mod view;
pub mod voice;

pub use completion::{CompletionClient, HttpCompletionClient};
pub use config::Config;
pub use credential::{Credential, CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use error::{Error, Result};
pub use knowledge::{ContextRetriever, KnowledgeItem, KnowledgeSource, KnowledgeStore};
pub use locale::Locale;
pub use pipeline::{QueryOutcome, QueryPipeline};
pub use prompt::{PendingRequest, PromptBuilder};
pub use session::{Components, Session, Trigger};
pub use view::{ChatView, Speaker, Status, StatusSink};
