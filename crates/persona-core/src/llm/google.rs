//! Google Gemini generateContent adapter
//!
//! Single-turn wire format: the whole conversation is flattened to one
//! prompt string, and the API key travels as a query parameter.

use serde_json::{json, Value as JsonValue};

use super::{flatten_prompt, ProviderAdapter, ProviderId};
use crate::error::DispatchError;
use crate::types::{CompletionRequest, CompletionResult, TokenUsage};

pub struct GoogleAdapter;

impl ProviderAdapter for GoogleAdapter {
    fn provider(&self) -> ProviderId {
        ProviderId::Google
    }

    fn build_payload(&self, request: &CompletionRequest, _model: &str) -> JsonValue {
        json!({
            "contents": [{
                "parts": [{"text": flatten_prompt(request)}]
            }],
            "generationConfig": {
                "temperature": request.options.temperature,
                "maxOutputTokens": request.options.max_tokens,
            }
        })
    }

    fn endpoint(&self, request: &CompletionRequest, model: &str, api_key: &str) -> String {
        let verb = if request.options.stream {
            "streamGenerateContent?alt=sse&key="
        } else {
            "generateContent?key="
        };
        format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:{}{}",
            model, verb, api_key
        )
    }

    fn headers(&self, _api_key: &str) -> Vec<(&'static str, String)> {
        vec![("Content-Type", "application/json".to_string())]
    }

    fn parse_response(&self, body: &str, model: &str) -> Result<CompletionResult, DispatchError> {
        let raw: JsonValue = serde_json::from_str(body)
            .map_err(|_| DispatchError::MalformedResponse(ProviderId::Google))?;

        let content = raw
            .pointer("/candidates/0/content/parts/0/text")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());

        let usage = raw.get("usageMetadata").and_then(|u| {
            Some(TokenUsage {
                prompt_tokens: u.get("promptTokenCount")?.as_u64()? as u32,
                completion_tokens: u.get("candidatesTokenCount")?.as_u64()? as u32,
            })
        });

        Ok(CompletionResult {
            content,
            provider: ProviderId::Google,
            model: model.to_string(),
            usage,
            raw,
        })
    }
}
