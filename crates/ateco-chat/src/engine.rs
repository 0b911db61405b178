//! Conversation engine.
//!
//! Holds two append-only histories: the transcript the operator sees, and
//! the model-context history whose user turns carry the candidate-augmented
//! text. One retrieval + generation cycle runs at a time.

use futures::StreamExt;

use ateco_core::error::{Error, Result};
use ateco_core::traits::Retriever;
use ateco_core::types::{CandidateRow, ConversationTurn, Role};
use ateco_retrieval::{aggregate, filter_by_activity};

use crate::model::ChatModel;
use crate::prompt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    AwaitingModel,
}

/// One completed exchange: the full assistant reply plus the candidates it
/// was grounded on.
#[derive(Debug, Clone)]
pub struct Reply {
    pub text: String,
    pub candidates: Vec<CandidateRow>,
}

pub struct Conversation {
    transcript: Vec<ConversationTurn>,
    model_history: Vec<ConversationTurn>,
    state: State,
    activity_filter: Option<String>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    pub fn new() -> Self {
        Self {
            transcript: Vec::new(),
            model_history: Vec::new(),
            state: State::Idle,
            activity_filter: None,
        }
    }

    /// The turns shown to the operator.
    pub fn transcript(&self) -> &[ConversationTurn] {
        &self.transcript
    }

    pub fn is_empty(&self) -> bool {
        self.transcript.is_empty()
    }

    /// Restrict candidates to one activity before display and augmentation.
    /// Narrows the ranked set; never re-ranks it.
    pub fn set_activity_filter(&mut self, activity: Option<String>) {
        self.activity_filter = activity;
    }

    /// Discard both histories. The next input behaves like a first-ever one.
    pub fn clear(&mut self) {
        self.transcript.clear();
        self.model_history.clear();
        self.state = State::Idle;
        self.activity_filter = None;
    }

    /// All user statements so far plus `input`, joined with ". ". Later
    /// turns refine earlier context instead of replacing it, so the whole
    /// accumulated wording drives retrieval.
    pub fn aggregate_query(&self, input: &str) -> String {
        let mut parts: Vec<&str> = self
            .transcript
            .iter()
            .filter(|t| t.role == Role::User)
            .map(|t| t.content.as_str())
            .collect();
        parts.push(input);
        parts.join(". ")
    }

    /// Run one retrieval + generation cycle for `input`.
    ///
    /// Each generated chunk is forwarded to `on_token` as it arrives. On
    /// success the full reply is appended to both histories. On generation
    /// failure the partial output is discarded and both histories are left
    /// as they were before the call, so the user can simply resubmit. Zero
    /// retrieved candidates is not an error: the model is invoked with an
    /// empty candidate block and will ask for more detail.
    pub async fn respond<F>(
        &mut self,
        input: &str,
        retriever: &dyn Retriever,
        chat_model: &dyn ChatModel,
        top_k: usize,
        mut on_token: F,
    ) -> Result<Reply>
    where
        F: FnMut(&str),
    {
        if self.state == State::AwaitingModel {
            return Err(Error::Operation(
                "a response is already being generated for this conversation".to_string(),
            ));
        }

        let query = self.aggregate_query(input);
        tracing::debug!(query = %query, "retrieving candidates");
        let matches = retriever.search(&query, top_k).await?;
        let mut candidates = aggregate(&matches);
        if let Some(activity) = &self.activity_filter {
            candidates = filter_by_activity(candidates, activity);
        }
        if candidates.is_empty() {
            tracing::debug!("no candidates retrieved; model will ask for detail");
        }

        let block = prompt::candidate_block(&candidates);
        let augmented = prompt::augment_user_input(input, &block);

        self.state = State::AwaitingModel;
        self.transcript.push(ConversationTurn::user(input));
        let mut model_turn = ConversationTurn::user(input);
        model_turn.augmented_content = Some(augmented);
        self.model_history.push(model_turn);

        match self.drive_generation(chat_model, &mut on_token).await {
            Ok(text) => {
                self.transcript.push(ConversationTurn::assistant(text.clone()));
                self.model_history.push(ConversationTurn::assistant(text.clone()));
                self.state = State::Idle;
                Ok(Reply { text, candidates })
            }
            Err(e) => {
                // Drop the failed exchange's user turns so a resubmit
                // behaves like a fresh attempt.
                self.transcript.pop();
                self.model_history.pop();
                self.state = State::Idle;
                Err(e)
            }
        }
    }

    async fn drive_generation<F>(&self, chat_model: &dyn ChatModel, on_token: &mut F) -> Result<String>
    where
        F: FnMut(&str),
    {
        let mut stream = chat_model.stream_chat(prompt::SYSTEM_PROMPT, &self.model_history).await?;
        let mut full = String::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            on_token(&chunk);
            full.push_str(&chunk);
        }
        Ok(full)
    }

    /// One-shot summary of the user's activity from the whole transcript,
    /// for handing a clean description to downstream consumers.
    pub async fn describe_activity(&self, chat_model: &dyn ChatModel) -> Result<String> {
        let instruction = prompt::parsing_instruction(&self.transcript);
        let history = vec![ConversationTurn::user(instruction)];
        let stream = chat_model.stream_chat(prompt::SYSTEM_PROMPT_PARSING, &history).await?;
        stream.collect_text().await
    }
}
