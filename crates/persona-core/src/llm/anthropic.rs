//! Anthropic messages adapter

use serde_json::{json, Value as JsonValue};

use super::{ProviderAdapter, ProviderId};
use crate::error::DispatchError;
use crate::types::{CompletionRequest, CompletionResult, TokenUsage};

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicAdapter;

impl ProviderAdapter for AnthropicAdapter {
    fn provider(&self) -> ProviderId {
        ProviderId::Anthropic
    }

    fn build_payload(&self, request: &CompletionRequest, model: &str) -> JsonValue {
        // Anthropic carries the system prompt as a top-level field; the
        // messages array holds history in order, then the current message.
        let mut messages: Vec<JsonValue> = request
            .history
            .iter()
            .map(|m| json!({"role": m.role.as_str(), "content": m.content}))
            .collect();
        messages.push(json!({"role": "user", "content": request.message}));

        let mut payload = json!({
            "model": model,
            "messages": messages,
            "max_tokens": request.options.max_tokens,
            "temperature": request.options.temperature,
            "stream": request.options.stream,
        });
        if let Some(system) = &request.system_prompt {
            payload["system"] = json!(system);
        }
        payload
    }

    fn endpoint(&self, _request: &CompletionRequest, _model: &str, _api_key: &str) -> String {
        MESSAGES_URL.to_string()
    }

    fn headers(&self, api_key: &str) -> Vec<(&'static str, String)> {
        vec![
            ("x-api-key", api_key.to_string()),
            ("anthropic-version", ANTHROPIC_VERSION.to_string()),
            ("Content-Type", "application/json".to_string()),
        ]
    }

    fn parse_response(&self, body: &str, model: &str) -> Result<CompletionResult, DispatchError> {
        let raw: JsonValue = serde_json::from_str(body)
            .map_err(|_| DispatchError::MalformedResponse(ProviderId::Anthropic))?;

        let content = raw
            .pointer("/content/0/text")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());

        let usage = raw.get("usage").and_then(|u| {
            Some(TokenUsage {
                prompt_tokens: u.get("input_tokens")?.as_u64()? as u32,
                completion_tokens: u.get("output_tokens")?.as_u64()? as u32,
            })
        });

        Ok(CompletionResult {
            content,
            provider: ProviderId::Anthropic,
            model: model.to_string(),
            usage,
            raw,
        })
    }
}
