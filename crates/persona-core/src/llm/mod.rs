//! Multi-provider dispatch layer
//!
//! One adapter per provider behind a common interface, an immutable registry
//! answering "is this provider configured", and a dispatcher that walks the
//! candidate chain with retry and timeout policy.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::DispatchError;
use crate::types::{CompletionRequest, CompletionResult};

pub mod anthropic;
pub mod cohere;
pub mod dispatcher;
pub mod google;
pub mod huggingface;
pub mod openai;
pub mod registry;
pub mod streaming;

pub use dispatcher::AiDispatcher;
pub use registry::ProviderRegistry;
pub use streaming::TokenStream;

/// Supported completion providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderId {
    OpenAi,
    Anthropic,
    Google,
    HuggingFace,
    Cohere,
}

impl ProviderId {
    /// Fixed fallback order used after affinity preferences.
    pub const ALL: [ProviderId; 5] = [
        ProviderId::OpenAi,
        ProviderId::Anthropic,
        ProviderId::Google,
        ProviderId::HuggingFace,
        ProviderId::Cohere,
    ];

    pub fn key_env_var(&self) -> &'static str {
        match self {
            ProviderId::OpenAi => "OPENAI_API_KEY",
            ProviderId::Anthropic => "ANTHROPIC_API_KEY",
            ProviderId::Google => "GOOGLE_API_KEY",
            ProviderId::HuggingFace => "HUGGINGFACE_API_KEY",
            ProviderId::Cohere => "COHERE_API_KEY",
        }
    }

    pub fn model_env_var(&self) -> &'static str {
        match self {
            ProviderId::OpenAi => "OPENAI_MODEL",
            ProviderId::Anthropic => "ANTHROPIC_MODEL",
            ProviderId::Google => "GOOGLE_MODEL",
            ProviderId::HuggingFace => "HUGGINGFACE_MODEL",
            ProviderId::Cohere => "COHERE_MODEL",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderId::OpenAi => "gpt-4o-mini",
            ProviderId::Anthropic => "claude-3-5-haiku-20241022",
            ProviderId::Google => "gemini-1.5-flash",
            ProviderId::HuggingFace => "mistralai/Mistral-7B-Instruct-v0.2",
            ProviderId::Cohere => "command",
        }
    }
}

/// Capabilities a provider exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Chat,
    Stream,
    Image,
    Audio,
    Video,
}

/// Per-provider request builder and response normalizer. Adapters are pure
/// transformation functions — the dispatcher owns all network I/O.
pub trait ProviderAdapter: Send + Sync {
    fn provider(&self) -> ProviderId;

    /// Provider-specific JSON body. Message-array providers place the system
    /// prompt first, then history in order, then the current message;
    /// single-turn providers flatten everything to one prompt string.
    fn build_payload(&self, request: &CompletionRequest, model: &str) -> JsonValue;

    /// Full endpoint URL. Key-in-query providers embed the API key here.
    fn endpoint(&self, request: &CompletionRequest, model: &str, api_key: &str) -> String;

    /// Auth and protocol headers.
    fn headers(&self, api_key: &str) -> Vec<(&'static str, String)>;

    /// Normalize the raw response body. Missing/null content is a valid
    /// result (`content = None`), not an error.
    fn parse_response(&self, body: &str, model: &str) -> Result<CompletionResult, DispatchError>;
}

/// Build the adapter for a provider tag.
pub fn adapter_for(provider: ProviderId) -> Box<dyn ProviderAdapter> {
    match provider {
        ProviderId::OpenAi => Box::new(openai::OpenAiAdapter),
        ProviderId::Anthropic => Box::new(anthropic::AnthropicAdapter),
        ProviderId::Google => Box::new(google::GoogleAdapter),
        ProviderId::HuggingFace => Box::new(huggingface::HuggingFaceAdapter),
        ProviderId::Cohere => Box::new(cohere::CohereAdapter),
    }
}

/// JSON pointer to the incremental-delta field in each provider's streaming
/// chunks. Delta extraction is data, not code branching.
pub fn delta_path(provider: ProviderId) -> &'static str {
    match provider {
        ProviderId::OpenAi => "/choices/0/delta/content",
        ProviderId::Anthropic => "/delta/text",
        ProviderId::Google => "/candidates/0/content/parts/0/text",
        ProviderId::HuggingFace => "/token/text",
        ProviderId::Cohere => "/text",
    }
}

/// Sentinel line terminating an SSE stream.
const SSE_DONE: &str = "[DONE]";

/// Parse one raw network chunk of server-sent events into incremental
/// content deltas. Malformed JSON chunks are skipped silently — a single bad
/// chunk never aborts the stream. Returns the deltas found plus whether the
/// termination sentinel was seen.
pub fn parse_stream_chunk(provider: ProviderId, raw: &str) -> (Vec<String>, bool) {
    let mut deltas = Vec::new();
    let mut done = false;
    for line in raw.lines() {
        let Some(data) = line.strip_prefix("data: ") else {
            continue;
        };
        if data == SSE_DONE {
            done = true;
            break;
        }
        let Ok(parsed) = serde_json::from_str::<JsonValue>(data) else {
            continue;
        };
        if let Some(text) = parsed.pointer(delta_path(provider)).and_then(|v| v.as_str()) {
            if !text.is_empty() {
                deltas.push(text.to_string());
            }
        }
    }
    (deltas, done)
}

/// Flatten a request to a single prompt string for single-turn providers.
pub(crate) fn flatten_prompt(request: &CompletionRequest) -> String {
    let mut parts = Vec::new();
    if let Some(system) = &request.system_prompt {
        parts.push(system.clone());
    }
    for msg in &request.history {
        parts.push(format!("{}: {}", msg.role.as_str(), msg.content));
    }
    parts.push(format!("user: {}", request.message));
    parts.join("\n")
}

/// Message array in wire order: system first, history in order, current
/// message last.
pub(crate) fn message_array(request: &CompletionRequest) -> Vec<JsonValue> {
    let mut messages = Vec::new();
    if let Some(system) = &request.system_prompt {
        messages.push(serde_json::json!({"role": "system", "content": system}));
    }
    for msg in &request.history {
        messages.push(serde_json::json!({"role": msg.role.as_str(), "content": msg.content}));
    }
    messages.push(serde_json::json!({"role": "user", "content": request.message}));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stream_chunk_openai() {
        let raw = "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\
                   data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\
                   data: [DONE]\n";
        let (deltas, done) = parse_stream_chunk(ProviderId::OpenAi, raw);
        assert_eq!(deltas, vec!["Hel", "lo"]);
        assert!(done);
    }

    #[test]
    fn test_parse_stream_chunk_skips_malformed() {
        let raw = "data: {not json}\n\
                   data: {\"delta\":{\"text\":\"ok\"}}\n";
        let (deltas, done) = parse_stream_chunk(ProviderId::Anthropic, raw);
        assert_eq!(deltas, vec!["ok"]);
        assert!(!done);
    }

    #[test]
    fn test_parse_stream_chunk_ignores_non_data_lines() {
        let raw = "event: message_start\nretry: 100\n";
        let (deltas, done) = parse_stream_chunk(ProviderId::Cohere, raw);
        assert!(deltas.is_empty());
        assert!(!done);
    }

    #[test]
    fn test_flatten_prompt_order() {
        let req = crate::types::CompletionRequest::new("x", "now")
            .with_system_prompt("sys")
            .with_history(vec![crate::types::ChatMessage::user("before")]);
        assert_eq!(flatten_prompt(&req), "sys\nuser: before\nuser: now");
    }

    #[test]
    fn test_message_array_system_first() {
        let req = crate::types::CompletionRequest::new("x", "now")
            .with_system_prompt("sys")
            .with_history(vec![crate::types::ChatMessage::assistant("earlier")]);
        let msgs = message_array(&req);
        assert_eq!(msgs.len(), 3);
        assert_eq!(msgs[0]["role"], "system");
        assert_eq!(msgs[1]["role"], "assistant");
        assert_eq!(msgs[2]["content"], "now");
    }
}
