//! HuggingFace Inference API adapter
//!
//! The response is either an array whose first element carries
//! `generated_text`, or a bare object with `generated_text` at the top
//! level — both shapes are normalized here.

use serde_json::{json, Value as JsonValue};

use super::{flatten_prompt, ProviderAdapter, ProviderId};
use crate::error::DispatchError;
use crate::types::{CompletionRequest, CompletionResult};

pub struct HuggingFaceAdapter;

impl ProviderAdapter for HuggingFaceAdapter {
    fn provider(&self) -> ProviderId {
        ProviderId::HuggingFace
    }

    fn build_payload(&self, request: &CompletionRequest, _model: &str) -> JsonValue {
        json!({
            "inputs": flatten_prompt(request),
            "parameters": {
                "max_new_tokens": request.options.max_tokens,
                "temperature": request.options.temperature,
                "return_full_text": false
            },
            "stream": request.options.stream,
        })
    }

    fn endpoint(&self, _request: &CompletionRequest, model: &str, _api_key: &str) -> String {
        format!("https://api-inference.huggingface.co/models/{}", model)
    }

    fn headers(&self, api_key: &str) -> Vec<(&'static str, String)> {
        vec![
            ("Authorization", format!("Bearer {}", api_key)),
            ("Content-Type", "application/json".to_string()),
        ]
    }

    fn parse_response(&self, body: &str, model: &str) -> Result<CompletionResult, DispatchError> {
        let raw: JsonValue = serde_json::from_str(body)
            .map_err(|_| DispatchError::MalformedResponse(ProviderId::HuggingFace))?;

        let content = raw
            .pointer("/0/generated_text")
            .or_else(|| raw.get("generated_text"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());

        Ok(CompletionResult {
            content,
            provider: ProviderId::HuggingFace,
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
    fn test_endpoint_embeds_model_id() {
        let req = CompletionRequest::new("x", "hi");
        let url = HuggingFaceAdapter.endpoint(&req, "mistralai/Mistral-7B-Instruct-v0.2", "k");
        assert_eq!(
            url,
            "https://api-inference.huggingface.co/models/mistralai/Mistral-7B-Instruct-v0.2"
        );
    }

    #[test]
    fn test_parse_array_shape() {
        let body = r#"[{"generated_text": "output"}]"#;
        let result = HuggingFaceAdapter.parse_response(body, "m").unwrap();
        assert_eq!(result.content.as_deref(), Some("output"));
    }

    #[test]
    fn test_parse_object_shape() {
        let body = r#"{"generated_text": "direct"}"#;
        let result = HuggingFaceAdapter.parse_response(body, "m").unwrap();
        assert_eq!(result.content.as_deref(), Some("direct"));
    }

    #[test]
    fn test_empty_array_is_valid() {
        let result = HuggingFaceAdapter.parse_response("[]", "m").unwrap();
        assert!(result.content.is_none());
    }
}
