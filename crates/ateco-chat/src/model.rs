//! Streaming chat-model collaborator.
//!
//! Generation runs as a background task pushing text chunks into a bounded
//! channel while the consumer drains them; closing the channel is the
//! end-of-stream sentinel. Dropping the `TokenStream` closes the channel and
//! stops the producer at its next send.

use std::collections::VecDeque;
use std::sync::Mutex;

use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use ateco_core::error::{Error, Result};
use ateco_core::types::{ConversationTurn, Role};

const STREAM_CAPACITY: usize = 64;

/// Stream of generated text chunks, best consumed with `StreamExt::next`.
pub struct TokenStream {
    rx: mpsc::Receiver<Result<String>>,
}

impl TokenStream {
    pub fn channel(capacity: usize) -> (mpsc::Sender<Result<String>>, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, Self { rx })
    }

    /// Drain the whole stream into one string. Any chunk error aborts.
    pub async fn collect_text(mut self) -> Result<String> {
        let mut full = String::new();
        while let Some(chunk) = self.next().await {
            full.push_str(&chunk?);
        }
        Ok(full)
    }
}

impl Stream for TokenStream {
    type Item = Result<String>;

    fn poll_next(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

/// The generation seam. The role-delimiter syntax of the underlying model
/// family belongs to the implementation; the engine only hands over a system
/// instruction and role-tagged turns.
#[async_trait::async_trait]
pub trait ChatModel: Send + Sync {
    async fn stream_chat(&self, system: &str, history: &[ConversationTurn]) -> Result<TokenStream>;
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    stream: bool,
}

#[derive(Deserialize)]
struct ChunkMessage {
    #[serde(default)]
    content: String,
}

#[derive(Deserialize)]
struct ChatChunk {
    #[serde(default)]
    message: Option<ChunkMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Client for an Ollama-compatible `/api/chat` endpoint (NDJSON streaming).
pub struct OllamaChatModel {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaChatModel {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }
}

#[async_trait::async_trait]
impl ChatModel for OllamaChatModel {
    async fn stream_chat(&self, system: &str, history: &[ConversationTurn]) -> Result<TokenStream> {
        let mut messages = Vec::with_capacity(history.len() + 1);
        if !system.is_empty() {
            messages.push(WireMessage { role: "system", content: system });
        }
        for turn in history {
            let role = match turn.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            };
            messages.push(WireMessage { role, content: turn.model_content() });
        }
        let body = ChatRequest { model: &self.model, messages, stream: true };

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Generation(format!("chat request: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Generation(format!("chat endpoint returned {status}: {text}")));
        }

        let (tx, stream) = TokenStream::channel(STREAM_CAPACITY);
        let mut bytes = response.bytes_stream();
        tokio::spawn(async move {
            let mut buf = String::new();
            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(c) => c,
                    Err(e) => {
                        let _ = tx.send(Err(Error::Generation(format!("stream read: {e}")))).await;
                        return;
                    }
                };
                buf.push_str(&String::from_utf8_lossy(&chunk));
                while let Some(pos) = buf.find('\n') {
                    let line = buf[..pos].trim().to_string();
                    buf.drain(..=pos);
                    if line.is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<ChatChunk>(&line) {
                        Ok(parsed) => {
                            if let Some(err) = parsed.error {
                                let _ = tx.send(Err(Error::Generation(err))).await;
                                return;
                            }
                            if let Some(message) = parsed.message {
                                if !message.content.is_empty()
                                    && tx.send(Ok(message.content)).await.is_err()
                                {
                                    // Receiver dropped: the caller aborted.
                                    return;
                                }
                            }
                            if parsed.done {
                                return;
                            }
                        }
                        Err(e) => {
                            let _ = tx
                                .send(Err(Error::Generation(format!("malformed stream chunk: {e}"))))
                                .await;
                            return;
                        }
                    }
                }
            }
            let _ = tx
                .send(Err(Error::Generation("stream ended before completion".to_string())))
                .await;
        });
        Ok(stream)
    }
}

type ScriptedReply = Vec<std::result::Result<String, String>>;

/// Test double that plays back canned chunk sequences and records every
/// prompt it was given.
pub struct ScriptedChatModel {
    replies: Mutex<VecDeque<ScriptedReply>>,
    calls: Mutex<Vec<(String, Vec<ConversationTurn>)>>,
}

impl ScriptedChatModel {
    pub fn new(replies: Vec<ScriptedReply>) -> Self {
        Self { replies: Mutex::new(replies.into()), calls: Mutex::new(Vec::new()) }
    }

    pub fn reply(chunks: &[&str]) -> ScriptedReply {
        chunks.iter().map(|c| Ok((*c).to_string())).collect()
    }

    pub fn failing(chunks: &[&str], error: &str) -> ScriptedReply {
        let mut reply = Self::reply(chunks);
        reply.push(Err(error.to_string()));
        reply
    }

    pub fn calls(&self) -> Vec<(String, Vec<ConversationTurn>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ChatModel for ScriptedChatModel {
    async fn stream_chat(&self, system: &str, history: &[ConversationTurn]) -> Result<TokenStream> {
        self.calls.lock().unwrap().push((system.to_string(), history.to_vec()));
        let script = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Error::Generation("no scripted reply left".to_string()))?;
        let (tx, stream) = TokenStream::channel(8);
        tokio::spawn(async move {
            for chunk in script {
                let failed = chunk.is_err();
                if tx.send(chunk.map_err(Error::Generation)).await.is_err() {
                    return;
                }
                if failed {
                    return;
                }
            }
        });
        Ok(stream)
    }
}
