// OpenAI chat completions back-end
use reqwest::RequestBuilder;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::http::{require_text, HttpProviderClient, WireFormat};
use super::{ProviderConfig, ProviderKind};
use crate::errors::{RagError, Result};

pub type OpenAiClient = HttpProviderClient<OpenAiWire>;

pub struct OpenAiWire;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
    refusal: Option<String>,
}

impl WireFormat for OpenAiWire {
    const KIND: ProviderKind = ProviderKind::OpenAi;

    fn endpoint(config: &ProviderConfig) -> String {
        format!("{}/chat/completions", config.base_url())
    }

    fn authorize(request: RequestBuilder, api_key: &str) -> RequestBuilder {
        request.bearer_auth(api_key)
    }

    fn request_body(config: &ProviderConfig, system_prompt: &str, user_prompt: &str, temperature: f32) -> Result<Value> {
        let request = ChatRequest {
            model: &config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            temperature,
            max_tokens: config.max_tokens,
        };
        Ok(serde_json::to_value(request)?)
    }

    fn parse_response(payload: &Value) -> Result<String> {
        let invalid = |message: String| RagError::InvalidResponse {
            provider: Self::KIND,
            message,
        };

        let response = ChatResponse::deserialize(payload)
            .map_err(|e| invalid(format!("unexpected response shape: {}", e)))?;
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| invalid("response contained no choices".to_string()))?;

        if choice.finish_reason.as_deref() == Some("content_filter") {
            return Err(RagError::ContentBlocked {
                provider: Self::KIND,
                message: "completion stopped by the content filter".to_string(),
            });
        }

        let message = choice
            .message
            .ok_or_else(|| invalid("choice carried no message".to_string()))?;
        if let Some(refusal) = message.refusal.filter(|r| !r.trim().is_empty()) {
            return Err(RagError::ContentBlocked {
                provider: Self::KIND,
                message: format!("model refused: {}", refusal),
            });
        }

        require_text(Self::KIND, message.content.unwrap_or_default())
    }
}
