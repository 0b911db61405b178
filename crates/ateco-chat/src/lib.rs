pub mod engine;
pub mod model;
pub mod prompt;

pub use engine::{Conversation, Reply};
pub use model::{ChatModel, OllamaChatModel, ScriptedChatModel, TokenStream};
