//! Shared request/response types for the dispatch layer

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::llm::ProviderId;

/// Role of a message in a conversation history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A single turn of conversation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Timeout class for a dispatch call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestKind {
    Chat,
    Generation,
    HealthCheck,
}

/// Generation options carried by a completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionOptions {
    /// Model override; adapters fall back to the configured default.
    pub model: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub stream: bool,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            model: None,
            max_tokens: 1024,
            temperature: 0.7,
            stream: false,
        }
    }
}

/// A single inbound turn, owned by the dispatcher for the request lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Agent kind used for affinity resolution (e.g. "emotional_support").
    pub agent_id: String,
    pub message: String,
    pub history: Vec<ChatMessage>,
    pub system_prompt: Option<String>,
    pub options: CompletionOptions,
    /// Explicit provider override; takes precedence over affinity resolution.
    pub provider: Option<ProviderId>,
    pub kind: RequestKind,
}

impl CompletionRequest {
    pub fn new(agent_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            message: message.into(),
            history: Vec::new(),
            system_prompt: None,
            options: CompletionOptions::default(),
            provider: None,
            kind: RequestKind::Chat,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_history(mut self, history: Vec<ChatMessage>) -> Self {
        self.history = history;
        self
    }

    pub fn with_provider(mut self, provider: ProviderId) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Total input size in bytes (message + history), reported to the
    /// observability sink per attempt.
    pub fn input_bytes(&self) -> usize {
        self.message.len()
            + self.history.iter().map(|m| m.content.len()).sum::<usize>()
            + self.system_prompt.as_ref().map(|s| s.len()).unwrap_or(0)
    }
}

/// Token usage reported by a provider, when available.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

/// Normalized completion returned by the dispatcher.
///
/// `content` is `None` when the provider returned an empty or null
/// completion — that is a valid result, not an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResult {
    pub content: Option<String>,
    pub provider: ProviderId,
    pub model: String,
    pub usage: Option<TokenUsage>,
    /// Opaque raw response body for callers that need provider extras.
    pub raw: JsonValue,
}
