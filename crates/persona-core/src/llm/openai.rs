//! OpenAI chat-completions adapter

use serde_json::{json, Value as JsonValue};

use super::{message_array, ProviderAdapter, ProviderId};
use crate::error::DispatchError;
use crate::types::{CompletionRequest, CompletionResult, TokenUsage};

const CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

pub struct OpenAiAdapter;

impl ProviderAdapter for OpenAiAdapter {
    fn provider(&self) -> ProviderId {
        ProviderId::OpenAi
    }

    fn build_payload(&self, request: &CompletionRequest, model: &str) -> JsonValue {
        json!({
            "model": model,
            "messages": message_array(request),
            "max_tokens": request.options.max_tokens,
            "temperature": request.options.temperature,
            "stream": request.options.stream,
        })
    }

    fn endpoint(&self, _request: &CompletionRequest, _model: &str, _api_key: &str) -> String {
        CHAT_COMPLETIONS_URL.to_string()
    }

    fn headers(&self, api_key: &str) -> Vec<(&'static str, String)> {
        vec![
            ("Authorization", format!("Bearer {}", api_key)),
            ("Content-Type", "application/json".to_string()),
        ]
    }

    fn parse_response(&self, body: &str, model: &str) -> Result<CompletionResult, DispatchError> {
        let raw: JsonValue = serde_json::from_str(body)
            .map_err(|_| DispatchError::MalformedResponse(ProviderId::OpenAi))?;

        let content = raw
            .pointer("/choices/0/message/content")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());

        let usage = raw.get("usage").and_then(|u| {
            Some(TokenUsage {
                prompt_tokens: u.get("prompt_tokens")?.as_u64()? as u32,
                completion_tokens: u.get("completion_tokens")?.as_u64()? as u32,
            })
        });

        Ok(CompletionResult {
            content,
            provider: ProviderId::OpenAi,
            model: model.to_string(),
            usage,
            raw,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_shape() {
        let req = CompletionRequest::new("writer", "hi").with_system_prompt("be brief");
        let payload = OpenAiAdapter.build_payload(&req, "gpt-4o-mini");
        assert_eq!(payload["model"], "gpt-4o-mini");
        assert_eq!(payload["messages"][0]["role"], "system");
        assert_eq!(payload["messages"][1]["content"], "hi");
        assert_eq!(payload["stream"], false);
    }

    #[test]
    fn test_parse_response_extracts_content_and_usage() {
        let body = r#"{
            "choices": [{"message": {"content": "hello"}}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3}
        }"#;
        let result = OpenAiAdapter.parse_response(body, "gpt-4o-mini").unwrap();
        assert_eq!(result.content.as_deref(), Some("hello"));
        let usage = result.usage.unwrap();
        assert_eq!(usage.prompt_tokens, 12);
        assert_eq!(usage.completion_tokens, 3);
    }

    #[test]
    fn test_null_content_is_valid() {
        let body = r#"{"choices": [{"message": {"content": null}}]}"#;
        let result = OpenAiAdapter.parse_response(body, "gpt-4o-mini").unwrap();
        assert!(result.content.is_none());
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let err = OpenAiAdapter.parse_response("<html>oops</html>", "m").unwrap_err();
        assert!(matches!(err, DispatchError::MalformedResponse(ProviderId::OpenAi)));
    }
}
