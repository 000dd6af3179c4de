//! Cohere generate adapter

use serde_json::{json, Value as JsonValue};

use super::{flatten_prompt, ProviderAdapter, ProviderId};
use crate::error::DispatchError;
use crate::types::{CompletionRequest, CompletionResult};

const GENERATE_URL: &str = "https://api.cohere.ai/v1/generate";

pub struct CohereAdapter;

impl ProviderAdapter for CohereAdapter {
    fn provider(&self) -> ProviderId {
        ProviderId::Cohere
    }

    fn build_payload(&self, request: &CompletionRequest, model: &str) -> JsonValue {
        json!({
            "model": model,
            "prompt": flatten_prompt(request),
            "max_tokens": request.options.max_tokens,
            "temperature": request.options.temperature,
            "stream": request.options.stream,
        })
    }

    fn endpoint(&self, _request: &CompletionRequest, _model: &str, _api_key: &str) -> String {
        GENERATE_URL.to_string()
    }

    fn headers(&self, api_key: &str) -> Vec<(&'static str, String)> {
        vec![
            ("Authorization", format!("Bearer {}", api_key)),
            ("Content-Type", "application/json".to_string()),
        ]
    }

    fn parse_response(&self, body: &str, model: &str) -> Result<CompletionResult, DispatchError> {
        let raw: JsonValue = serde_json::from_str(body)
            .map_err(|_| DispatchError::MalformedResponse(ProviderId::Cohere))?;

        let content = raw
            .pointer("/generations/0/text")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());

        Ok(CompletionResult {
            content,
            provider: ProviderId::Cohere,
            model: model.to_string(),
            usage: None,
            raw,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_is_single_prompt() {
        let req = CompletionRequest::new("x", "question").with_system_prompt("context");
        let payload = CohereAdapter.build_payload(&req, "command");
        assert_eq!(payload["prompt"], "context\nuser: question");
        assert_eq!(payload["model"], "command");
    }

    #[test]
    fn test_parse_generations() {
        let body = r#"{"generations": [{"text": "cohere says"}]}"#;
        let result = CohereAdapter.parse_response(body, "command").unwrap();
        assert_eq!(result.content.as_deref(), Some("cohere says"));
    }

    #[test]
    fn test_missing_generations_is_valid_empty() {
        let result = CohereAdapter.parse_response("{}", "command").unwrap();
        assert!(result.content.is_none());
    }
}
