//! Chat payloads on both sides of the agent.
//!
//! [`AgentRequest`] is what the platform posts to the agent; [`CompletionRequest`]
//! is what the agent posts to the model provider. Individual messages stay as
//! raw `serde_json::Value`s so fields the agent does not understand (names,
//! tool references, attachments) survive the trip untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashMap;

/// Role reserved for the agent's own instruction turn.
pub const SYSTEM_ROLE: &str = "system";

/// The inbound chat request body.
///
/// Only `messages` is interpreted; everything else (`copilot_thread_id`,
/// `agent`, `copilot_references`, …) is captured in [`extra`](Self::extra).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentRequest {
    /// The conversation so far, oldest first.
    #[serde(default)]
    pub messages: Vec<Value>,
    /// All remaining fields not captured above.
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl AgentRequest {
    /// Returns the caller's turns with every `system`-role message removed.
    ///
    /// Order is preserved. Callers may not override the agent's instruction,
    /// so their system turns are dropped rather than merged.
    #[must_use]
    pub fn conversation_turns(&self) -> Vec<Value> {
        self.messages
            .iter()
            .filter(|m| m.get("role").and_then(Value::as_str) != Some(SYSTEM_ROLE))
            .cloned()
            .collect()
    }
}

/// An OpenAI-compatible streaming chat completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// The provider model identifier (e.g. `"gpt-4o"`).
    pub model: String,
    /// System instruction followed by the caller's conversation.
    pub messages: Vec<Value>,
    /// Always `true`: the agent only consumes streamed responses.
    pub stream: bool,
}

impl CompletionRequest {
    /// Builds a streaming request whose first message is `system_prompt`.
    #[must_use]
    pub fn new(model: impl Into<String>, system_prompt: &str, turns: Vec<Value>) -> Self {
        let mut messages = Vec::with_capacity(turns.len() + 1);
        messages.push(json!({"role": SYSTEM_ROLE, "content": system_prompt}));
        messages.extend(turns);
        Self {
            model: model.into(),
            messages,
            stream: true,
        }
    }
}
