// Google Gemini generateContent back-end
use reqwest::RequestBuilder;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::http::{require_text, HttpProviderClient, WireFormat};
use super::{ProviderConfig, ProviderKind};
use crate::errors::{RagError, Result};

/// Finish reasons that mean the safety system suppressed the answer
const BLOCKED_FINISH_REASONS: &[&str] = &["SAFETY", "BLOCKLIST", "PROHIBITED_CONTENT", "SPII"];

pub type GeminiClient = HttpProviderClient<GeminiWire>;

pub struct GeminiWire;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: Content<'a>,
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl WireFormat for GeminiWire {
    const KIND: ProviderKind = ProviderKind::Gemini;

    fn endpoint(config: &ProviderConfig) -> String {
        format!("{}/models/{}:generateContent", config.base_url(), config.model)
    }

    fn authorize(request: RequestBuilder, api_key: &str) -> RequestBuilder {
        request.header("x-goog-api-key", api_key)
    }

    fn request_body(config: &ProviderConfig, system_prompt: &str, user_prompt: &str, temperature: f32) -> Result<Value> {
        let request = GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: [Part { text: system_prompt }],
            },
            contents: [Content {
                role: Some("user"),
                parts: [Part { text: user_prompt }],
            }],
            generation_config: GenerationConfig {
                temperature,
                max_output_tokens: config.max_tokens,
            },
        };
        Ok(serde_json::to_value(request)?)
    }

    fn parse_response(payload: &Value) -> Result<String> {
        let response = GenerateResponse::deserialize(payload).map_err(|e| RagError::InvalidResponse {
            provider: Self::KIND,
            message: format!("unexpected response shape: {}", e),
        })?;

        if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(RagError::ContentBlocked {
                provider: Self::KIND,
                message: format!("prompt blocked: {}", reason),
            });
        }

        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| RagError::InvalidResponse {
                provider: Self::KIND,
                message: "response contained no candidates".to_string(),
            })?;

        if let Some(reason) = candidate.finish_reason.as_deref() {
            if BLOCKED_FINISH_REASONS.contains(&reason) {
                return Err(RagError::ContentBlocked {
                    provider: Self::KIND,
                    message: format!("response blocked: {}", reason),
                });
            }
        }

        let text: String = candidate
            .content
            .map(|c| c.parts)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|part| part.text)
            .collect::<Vec<_>>()
            .join("");
        require_text(Self::KIND, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_request_body() {
        let config = ProviderConfig::new(ProviderKind::Gemini);
        let body = GeminiWire::request_body(&config, "sys", "question", 0.3).unwrap();

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "sys");
        assert!(body["systemInstruction"].get("role").is_none());
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 1024);
        assert_eq!(
            GeminiWire::endpoint(&config),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash-exp:generateContent"
        );
    }

    #[test]
    fn test_parse_answer() {
        let payload = json!({
            "candidates": [{
                "content": {"parts": [{"text": "The candidate knows Go [1]."}], "role": "model"},
                "finishReason": "STOP"
            }]
        });
        assert_eq!(
            GeminiWire::parse_response(&payload).unwrap(),
            "The candidate knows Go [1]."
        );
    }

    #[test]
    fn test_prompt_feedback_block() {
        let payload = json!({"promptFeedback": {"blockReason": "SAFETY"}});
        let err = GeminiWire::parse_response(&payload).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ContentBlocked);
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn test_finish_reason_block() {
        for reason in BLOCKED_FINISH_REASONS {
            let payload = json!({"candidates": [{"finishReason": reason}]});
            assert_eq!(
                GeminiWire::parse_response(&payload).unwrap_err().kind(),
                ErrorKind::ContentBlocked
            );
        }
    }

    #[test]
    fn test_empty_candidates_invalid() {
        assert_eq!(
            GeminiWire::parse_response(&json!({"candidates": []})).unwrap_err().kind(),
            ErrorKind::InvalidResponse
        );
        let payload = json!({"candidates": [{"content": {"parts": [{"text": "  "}]}, "finishReason": "STOP"}]});
        assert_eq!(
            GeminiWire::parse_response(&payload).unwrap_err().kind(),
            ErrorKind::InvalidResponse
        );
    }
}
