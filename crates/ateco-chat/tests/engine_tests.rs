use std::sync::Mutex;

use ateco_chat::{prompt, Conversation, ScriptedChatModel};
use ateco_core::error::Result;
use ateco_core::traits::Retriever;
use ateco_core::types::{CodeMeta, Role, SearchMatch};

struct StubRetriever {
    matches: Vec<SearchMatch>,
    queries: Mutex<Vec<String>>,
}

impl StubRetriever {
    fn new(matches: Vec<SearchMatch>) -> Self {
        Self { matches, queries: Mutex::new(Vec::new()) }
    }

    fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Retriever for StubRetriever {
    async fn search(&self, query: &str, _top_k: usize) -> Result<Vec<SearchMatch>> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok(self.matches.clone())
    }
}

fn wine_match(score: f32) -> SearchMatch {
    SearchMatch {
        text: "Includes wine bottling".to_string(),
        meta: CodeMeta {
            code: "11.02".to_string(),
            title: "Wine production".to_string(),
            description: "Includes:\n* wine bottling".to_string(),
            activity: Some("manufacturing".to_string()),
        },
        score,
    }
}

#[tokio::test]
async fn user_inputs_accumulate_into_the_retrieval_query() {
    let retriever = StubRetriever::new(vec![wine_match(0.8)]);
    let model = ScriptedChatModel::new(vec![
        ScriptedChatModel::reply(&["ok"]),
        ScriptedChatModel::reply(&["ok"]),
    ]);
    let mut conversation = Conversation::new();

    conversation
        .respond("I produce wine", &retriever, &model, 5, |_| {})
        .await
        .expect("first turn");
    conversation
        .respond("also bottled at the farm", &retriever, &model, 5, |_| {})
        .await
        .expect("second turn");

    let queries = retriever.queries();
    assert_eq!(queries[0], "I produce wine");
    assert_eq!(queries[1], "I produce wine. also bottled at the farm");
}

#[tokio::test]
async fn augmented_turn_carries_candidates_but_transcript_does_not() {
    let retriever = StubRetriever::new(vec![wine_match(0.8)]);
    let model = ScriptedChatModel::new(vec![ScriptedChatModel::reply(&["Si tratta di 11.02."])]);
    let mut conversation = Conversation::new();

    let reply = conversation
        .respond("I produce wine", &retriever, &model, 5, |_| {})
        .await
        .expect("respond");

    assert_eq!(reply.candidates.len(), 1);
    assert_eq!(reply.candidates[0].code, "11.02");

    // The transcript shows the raw input only.
    assert_eq!(conversation.transcript()[0].content, "I produce wine");
    assert!(conversation.transcript()[0].augmented_content.is_none());

    // The model saw the instruction template with the candidate block.
    let calls = model.calls();
    assert_eq!(calls.len(), 1);
    let (system, history) = &calls[0];
    assert_eq!(system, prompt::SYSTEM_PROMPT);
    let model_view = history[0].model_content();
    assert!(model_view.contains("Descrizione: I produce wine"));
    assert!(model_view.contains("Candidati: 11.02: Wine production"));
}

#[tokio::test]
async fn tokens_stream_incrementally_and_reply_is_appended() {
    let retriever = StubRetriever::new(vec![wine_match(0.8)]);
    let model = ScriptedChatModel::new(vec![ScriptedChatModel::reply(&["Ciao", " mondo"])]);
    let mut conversation = Conversation::new();

    let mut seen = Vec::new();
    let reply = conversation
        .respond("I produce wine", &retriever, &model, 5, |t| seen.push(t.to_string()))
        .await
        .expect("respond");

    assert_eq!(seen, vec!["Ciao", " mondo"]);
    assert_eq!(reply.text, "Ciao mondo");
    assert_eq!(conversation.transcript().len(), 2);
    assert_eq!(conversation.transcript()[1].role, Role::Assistant);
    assert_eq!(conversation.transcript()[1].content, "Ciao mondo");
}

#[tokio::test]
async fn zero_candidates_still_invokes_the_model() {
    let retriever = StubRetriever::new(Vec::new());
    let model = ScriptedChatModel::new(vec![ScriptedChatModel::reply(&["Servono dettagli."])]);
    let mut conversation = Conversation::new();

    let reply = conversation
        .respond("something unclassifiable", &retriever, &model, 5, |_| {})
        .await
        .expect("respond");

    assert!(reply.candidates.is_empty());
    let calls = model.calls();
    assert_eq!(calls.len(), 1, "model invoked despite empty candidate set");
    assert!(calls[0].1[0].model_content().ends_with("Candidati: "));
}

#[tokio::test]
async fn generation_failure_discards_partial_output_and_history() {
    let retriever = StubRetriever::new(vec![wine_match(0.8)]);
    let model = ScriptedChatModel::new(vec![
        ScriptedChatModel::failing(&["partial "], "connection reset"),
        ScriptedChatModel::reply(&["Si tratta di 11.02."]),
    ]);
    let mut conversation = Conversation::new();

    let mut seen = Vec::new();
    let err = conversation
        .respond("I produce wine", &retriever, &model, 5, |t| seen.push(t.to_string()))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("connection reset"));
    assert_eq!(seen, vec!["partial "], "partial chunks were forwarded before the failure");
    assert!(conversation.is_empty(), "no turn survives a failed exchange");

    // Resubmitting behaves like a fresh attempt: no double-counted input.
    conversation
        .respond("I produce wine", &retriever, &model, 5, |_| {})
        .await
        .expect("resubmit");
    assert_eq!(retriever.queries()[1], "I produce wine");
    assert_eq!(conversation.transcript().len(), 2);
}

#[tokio::test]
async fn clear_resets_both_histories() {
    let retriever = StubRetriever::new(vec![wine_match(0.8)]);
    let model = ScriptedChatModel::new(vec![
        ScriptedChatModel::reply(&["prima"]),
        ScriptedChatModel::reply(&["dopo"]),
    ]);
    let mut conversation = Conversation::new();

    conversation
        .respond("I produce wine", &retriever, &model, 5, |_| {})
        .await
        .expect("first");
    conversation.clear();
    assert!(conversation.is_empty());

    conversation
        .respond("I grow maize", &retriever, &model, 5, |_| {})
        .await
        .expect("after clear");

    // The post-clear retrieval sees only the new input, and the model
    // context restarts from a single user turn.
    assert_eq!(retriever.queries()[1], "I grow maize");
    let calls = model.calls();
    assert_eq!(calls[1].1.len(), 1);
}

#[tokio::test]
async fn activity_filter_narrows_candidates() {
    let mut farming = wine_match(0.9);
    farming.meta.code = "01.11".to_string();
    farming.meta.title = "Cereal farming".to_string();
    farming.meta.activity = Some("farming".to_string());
    let retriever = StubRetriever::new(vec![farming, wine_match(0.8)]);
    let model = ScriptedChatModel::new(vec![ScriptedChatModel::reply(&["ok"])]);
    let mut conversation = Conversation::new();
    conversation.set_activity_filter(Some("manufacturing".to_string()));

    let reply = conversation
        .respond("wine", &retriever, &model, 5, |_| {})
        .await
        .expect("respond");

    assert_eq!(reply.candidates.len(), 1);
    assert_eq!(reply.candidates[0].code, "11.02");
}

#[tokio::test]
async fn describe_activity_uses_the_parsing_prompt() {
    let retriever = StubRetriever::new(vec![wine_match(0.8)]);
    let model = ScriptedChatModel::new(vec![
        ScriptedChatModel::reply(&["ok"]),
        ScriptedChatModel::reply(&["Produzione e imbottigliamento di vino."]),
    ]);
    let mut conversation = Conversation::new();

    conversation
        .respond("I produce wine", &retriever, &model, 5, |_| {})
        .await
        .expect("respond");
    let description = conversation.describe_activity(&model).await.expect("describe");
    assert_eq!(description, "Produzione e imbottigliamento di vino.");

    let calls = model.calls();
    let (system, history) = &calls[1];
    assert_eq!(system, prompt::SYSTEM_PROMPT_PARSING);
    assert_eq!(history.len(), 1);
    assert!(history[0].content.contains("[UTENTE]: I produce wine"));
    assert!(history[0].content.contains("[ASSISTENTE]: ok"));
}
