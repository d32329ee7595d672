// Anthropic messages API back-end
use reqwest::RequestBuilder;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::http::{require_text, HttpProviderClient, WireFormat};
use super::{ProviderConfig, ProviderKind};
use crate::errors::{RagError, Result};

pub const ANTHROPIC_VERSION: &str = "2023-06-01";

pub type AnthropicClient = HttpProviderClient<AnthropicWire>;

pub struct AnthropicWire;

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: [UserMessage<'a>; 1],
}

#[derive(Serialize)]
struct UserMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl WireFormat for AnthropicWire {
    const KIND: ProviderKind = ProviderKind::Anthropic;

    fn endpoint(config: &ProviderConfig) -> String {
        format!("{}/messages", config.base_url())
    }

    fn authorize(request: RequestBuilder, api_key: &str) -> RequestBuilder {
        request
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
    }

    fn request_body(config: &ProviderConfig, system_prompt: &str, user_prompt: &str, temperature: f32) -> Result<Value> {
        let request = MessagesRequest {
            model: &config.model,
            max_tokens: config.max_tokens,
            temperature,
            system: system_prompt,
            messages: [UserMessage {
                role: "user",
                content: user_prompt,
            }],
        };
        Ok(serde_json::to_value(request)?)
    }

    fn parse_response(payload: &Value) -> Result<String> {
        let response = MessagesResponse::deserialize(payload).map_err(|e| RagError::InvalidResponse {
            provider: Self::KIND,
            message: format!("unexpected response shape: {}", e),
        })?;

        if response.stop_reason.as_deref() == Some("refusal") {
            return Err(RagError::ContentBlocked {
                provider: Self::KIND,
                message: "model declined to answer (stop_reason: refusal)".to_string(),
            });
        }

        let text: String = response
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");
        require_text(Self::KIND, text)
    }
}
