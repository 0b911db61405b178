//! Domain types shared by the corpus, retrieval and conversation engines.

use serde::{Deserialize, Serialize};

pub type RecordId = usize;

/// One row of the ATECO catalog.
///
/// - `code`: unique classification identifier (e.g., "01.11")
/// - `title`: short label for the activity
/// - `hierarchy`: human-readable path from the root category to this entry
/// - `descriptor`: raw multi-paragraph explanatory text, absent for some rows
/// - `activity`: coarse activity grouping used for later disambiguation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub code: String,
    pub title: String,
    pub hierarchy: String,
    #[serde(default, alias = "description")]
    pub descriptor: Option<String>,
    #[serde(default)]
    pub activity: Option<String>,
}

/// Metadata carried by every corpus record, copied from the owning entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeMeta {
    pub code: String,
    pub title: String,
    pub description: String,
    pub activity: Option<String>,
}

/// An atomic, independently searchable unit of catalog text.
///
/// `id` is a dense zero-based sequence over all fragments of the corpus,
/// local to one build. `text` is the composite text handed to the embedder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusRecord {
    pub id: RecordId,
    pub text: String,
    pub meta: CodeMeta,
}

/// One retrieval hit. `score` is similarity, higher is better.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchMatch {
    pub text: String,
    pub meta: CodeMeta,
    pub score: f32,
}

/// Aggregated per-code candidate shown to the operator.
///
/// At most one row per distinct code in a result set; `score` is the
/// maximum score among that code's matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateRow {
    pub code: String,
    pub title: String,
    pub description: String,
    pub activity: Option<String>,
    pub score: f32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One turn of a conversation.
///
/// `content` is what the human sees. For user turns, `augmented_content`
/// is the same input rewritten with the candidate list injected; it is
/// consumed by the language model and never displayed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub augmented_content: Option<String>,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into(), augmented_content: None }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into(), augmented_content: None }
    }

    /// The text the model should see for this turn.
    pub fn model_content(&self) -> &str {
        self.augmented_content.as_deref().unwrap_or(&self.content)
    }
}
