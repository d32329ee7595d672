//! Shared HTTP client for the JSON provider APIs
//!
//! Each back-end supplies a [`WireFormat`]: endpoint, auth headers, request
//! body and response validation. Transport, status classification and retry
//! live here once.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use tracing::debug;

use super::{ProviderClient, ProviderConfig, ProviderKind, RetryManager};
use crate::errors::{RagError, Result};

/// Provider-specific request and response handling
pub trait WireFormat: Send + Sync + 'static {
    const KIND: ProviderKind;

    /// Full URL of the generation endpoint
    fn endpoint(config: &ProviderConfig) -> String;

    /// Attach authentication (and any mandatory) headers
    fn authorize(request: RequestBuilder, api_key: &str) -> RequestBuilder;

    /// JSON request body
    fn request_body(config: &ProviderConfig, system_prompt: &str, user_prompt: &str, temperature: f32)
        -> Result<Value>;

    /// Extract and validate the answer text from a 2xx payload
    fn parse_response(payload: &Value) -> Result<String>;
}

/// A provider client speaking JSON over HTTPS
pub struct HttpProviderClient<W: WireFormat> {
    config: ProviderConfig,
    client: Client,
    retry: RetryManager,
    _wire: std::marker::PhantomData<W>,
}

impl<W: WireFormat> HttpProviderClient<W> {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| RagError::NetworkFailure {
                provider: W::KIND,
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            retry: RetryManager::from_config(&config),
            config,
            client,
            _wire: std::marker::PhantomData,
        })
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    async fn send_once(
        &self,
        api_key: &str,
        system_prompt: &str,
        user_prompt: &str,
        temperature: f32,
    ) -> Result<String> {
        let url = W::endpoint(&self.config);
        let body = W::request_body(&self.config, system_prompt, user_prompt, temperature)?;

        let response = W::authorize(self.client.post(&url), api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(W::KIND, e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| transport_error(W::KIND, e))?;

        if !status.is_success() {
            return Err(classify_status(W::KIND, status.as_u16(), &text));
        }

        let payload: Value = serde_json::from_str(&text).map_err(|e| RagError::InvalidResponse {
            provider: W::KIND,
            message: format!("response is not valid JSON: {}", e),
        })?;
        W::parse_response(&payload)
    }
}

#[async_trait]
impl<W: WireFormat> ProviderClient for HttpProviderClient<W> {
    fn kind(&self) -> ProviderKind {
        W::KIND
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    fn has_credential(&self) -> bool {
        self.config.has_credential()
    }

    async fn generate(&self, system_prompt: &str, user_prompt: &str, temperature: f32) -> Result<String> {
        let api_key = self
            .config
            .credential
            .as_deref()
            .ok_or_else(|| missing_credential(W::KIND))?;

        debug!(provider = %W::KIND, model = %self.config.model, "sending generation request");
        self.retry
            .execute_with_retry(|| self.send_once(api_key, system_prompt, user_prompt, temperature))
            .await
    }
}

/// Fail-fast error for a client built without any credential
pub fn missing_credential(provider: ProviderKind) -> RagError {
    RagError::MissingCredential {
        provider,
        message: format!(
            "no API key configured (checked {})",
            provider.credential_env_names().join(", ")
        ),
    }
}

fn transport_error(provider: ProviderKind, error: reqwest::Error) -> RagError {
    let message = if error.is_timeout() {
        format!("request timed out: {}", error)
    } else if error.is_connect() {
        format!("connection failed: {}", error)
    } else {
        error.to_string()
    };
    RagError::NetworkFailure { provider, message }
}

/// Provider error detail pulled from an error body
#[derive(Debug, Default)]
struct ErrorDetail {
    message: Option<String>,
    tags: Vec<String>,
}

impl ErrorDetail {
    /// Understands `{"error": {"message", "code"|"type"|"status", "details"}}`,
    /// the shape all three back-ends share, and Anthropic's top-level `type`
    fn parse(body: &str) -> Self {
        let Ok(value) = serde_json::from_str::<Value>(body) else {
            return Self::default();
        };
        let error = value.get("error").unwrap_or(&value);

        let message = error
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| error.as_str().map(str::to_string));

        let mut tags: Vec<String> = ["code", "type", "status"]
            .iter()
            .filter_map(|key| error.get(*key).and_then(Value::as_str))
            .map(str::to_string)
            .collect();
        if let Some(details) = error.get("details").and_then(Value::as_array) {
            tags.extend(
                details
                    .iter()
                    .filter_map(|d| d.get("reason").and_then(Value::as_str))
                    .map(str::to_string),
            );
        }

        Self { message, tags }
    }

    fn has_tag(&self, candidates: &[&str]) -> bool {
        self.tags
            .iter()
            .any(|tag| candidates.iter().any(|c| tag.eq_ignore_ascii_case(c)))
    }
}

const CREDENTIAL_TAGS: &[&str] = &[
    "invalid_api_key",
    "authentication_error",
    "permission_error",
    "API_KEY_INVALID",
    "UNAUTHENTICATED",
    "PERMISSION_DENIED",
];
const RATE_LIMIT_TAGS: &[&str] = &[
    "rate_limit_exceeded",
    "rate_limit_error",
    "insufficient_quota",
    "overloaded_error",
    "RESOURCE_EXHAUSTED",
];
const CONTENT_POLICY_TAGS: &[&str] = &["content_policy_violation", "content_filter"];

/// Map a non-success HTTP status and body onto the error taxonomy
pub fn classify_status(provider: ProviderKind, status: u16, body: &str) -> RagError {
    let detail = ErrorDetail::parse(body);
    let message = match &detail.message {
        Some(message) => format!("HTTP {}: {}", status, message),
        None if body.trim().is_empty() => format!("HTTP {}", status),
        None => format!("HTTP {}: {}", status, truncate(body.trim(), 300)),
    };

    if matches!(status, 401 | 403) || detail.has_tag(CREDENTIAL_TAGS) {
        RagError::MissingCredential {
            provider,
            message: format!("credential rejected ({})", message),
        }
    } else if matches!(status, 429 | 529) || detail.has_tag(RATE_LIMIT_TAGS) {
        RagError::RateLimited { provider, message }
    } else if detail.has_tag(CONTENT_POLICY_TAGS) {
        RagError::ContentBlocked { provider, message }
    } else if matches!(status, 408 | 409 | 425) || (500..=599).contains(&status) {
        RagError::NetworkFailure { provider, message }
    } else {
        RagError::InvalidResponse { provider, message }
    }
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Non-empty trimmed answer, else `InvalidResponse`
pub(crate) fn require_text(provider: ProviderKind, text: String) -> Result<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(RagError::InvalidResponse {
            provider,
            message: "response contained no text".to_string(),
        });
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    #[test]
    fn test_status_classification() {
        let kind = |status, body| classify_status(ProviderKind::OpenAi, status, body).kind();

        assert_eq!(kind(401, "unauthorized"), ErrorKind::MissingCredential);
        assert_eq!(kind(403, ""), ErrorKind::MissingCredential);
        assert_eq!(kind(429, "slow down"), ErrorKind::RateLimited);
        assert_eq!(kind(529, ""), ErrorKind::RateLimited);
        assert_eq!(kind(500, "internal error"), ErrorKind::NetworkFailure);
        assert_eq!(kind(503, ""), ErrorKind::NetworkFailure);
        assert_eq!(kind(408, ""), ErrorKind::NetworkFailure);
        assert_eq!(kind(409, "conflict"), ErrorKind::NetworkFailure);
        assert_eq!(kind(425, ""), ErrorKind::NetworkFailure);
        assert_eq!(kind(400, "bad request"), ErrorKind::InvalidResponse);
        assert_eq!(kind(404, "model not found"), ErrorKind::InvalidResponse);
    }

    #[test]
    fn test_provider_payload_tags() {
        let gemini_bad_key = r#"{"error": {"code": 400, "message": "API key not valid. Please pass a valid API key.",
            "status": "INVALID_ARGUMENT", "details": [{"reason": "API_KEY_INVALID"}]}}"#;
        let err = classify_status(ProviderKind::Gemini, 400, gemini_bad_key);
        assert_eq!(err.kind(), ErrorKind::MissingCredential);
        assert!(err.to_string().contains("API key not valid"));

        let gemini_quota = r#"{"error": {"code": 400, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED"}}"#;
        assert_eq!(
            classify_status(ProviderKind::Gemini, 400, gemini_quota).kind(),
            ErrorKind::RateLimited
        );

        let anthropic_overloaded = r#"{"type": "error", "error": {"type": "overloaded_error", "message": "Overloaded"}}"#;
        assert_eq!(
            classify_status(ProviderKind::Anthropic, 500, anthropic_overloaded).kind(),
            ErrorKind::RateLimited
        );

        let openai_policy = r#"{"error": {"message": "Your request was rejected", "type": "invalid_request_error",
            "code": "content_policy_violation"}}"#;
        assert_eq!(
            classify_status(ProviderKind::OpenAi, 400, openai_policy).kind(),
            ErrorKind::ContentBlocked
        );
    }

    #[test]
    fn test_message_extracted_from_body() {
        let body = r#"{"error": {"message": "Incorrect API key provided", "code": "invalid_api_key"}}"#;
        let err = classify_status(ProviderKind::OpenAi, 401, body);
        assert!(err.to_string().contains("Incorrect API key provided"));
        assert!(err.to_string().contains("401"));
    }

    #[test]
    fn test_require_text() {
        assert!(require_text(ProviderKind::Gemini, "  \n ".to_string()).is_err());
        assert_eq!(require_text(ProviderKind::Gemini, " yes ".to_string()).unwrap(), "yes");
    }

    #[test]
    fn test_missing_credential_names_variables() {
        let err = missing_credential(ProviderKind::Gemini);
        assert!(err.to_string().contains("GEMINI_API_KEY, GOOGLE_API_KEY"));
    }
}
