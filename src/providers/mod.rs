//! Language-model providers
//!
//! A closed set of back-ends (Gemini, OpenAI, Anthropic) behind the
//! [`ProviderClient`] trait. Clients are resolved once through the
//! [`ProviderRegistry`] and shared for the process lifetime.

pub mod anthropic;
pub mod config;
pub mod gemini;
pub mod http;
pub mod openai;
pub mod registry;
pub mod retry;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::{RagError, Result};

pub use config::ProviderConfig;
pub use registry::ProviderRegistry;
pub use retry::RetryManager;

/// Supported provider back-ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Gemini,
    OpenAi,
    Anthropic,
}

/// Environment variables consulted for each provider, in precedence order
const CREDENTIAL_ENV: &[(ProviderKind, &[&str])] = &[
    (ProviderKind::Gemini, &["GEMINI_API_KEY", "GOOGLE_API_KEY"]),
    (ProviderKind::OpenAi, &["OPENAI_API_KEY"]),
    (ProviderKind::Anthropic, &["ANTHROPIC_API_KEY"]),
];

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [
        ProviderKind::Gemini,
        ProviderKind::OpenAi,
        ProviderKind::Anthropic,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
        }
    }

    /// Recognized credential variables, first present non-empty one wins
    pub fn credential_env_names(self) -> &'static [&'static str] {
        CREDENTIAL_ENV
            .iter()
            .find(|(kind, _)| *kind == self)
            .map(|(_, names)| *names)
            .unwrap_or(&[])
    }

    /// Where to obtain an API key
    pub fn key_url(self) -> &'static str {
        match self {
            ProviderKind::Gemini => "https://aistudio.google.com/app/apikey",
            ProviderKind::OpenAi => "https://platform.openai.com/api-keys",
            ProviderKind::Anthropic => "https://console.anthropic.com/settings/keys",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini-2.0-flash-exp",
            ProviderKind::OpenAi => "gpt-4o-mini",
            ProviderKind::Anthropic => "claude-3-5-haiku-20241022",
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            ProviderKind::Gemini => "https://generativelanguage.googleapis.com/v1beta",
            ProviderKind::OpenAi => "https://api.openai.com/v1",
            ProviderKind::Anthropic => "https://api.anthropic.com/v1",
        }
    }

    /// Comma-separated canonical names, for error messages
    pub fn supported_names() -> String {
        Self::ALL
            .iter()
            .map(|k| k.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" | "google" => Ok(ProviderKind::Gemini),
            "openai" | "open-ai" | "gpt" => Ok(ProviderKind::OpenAi),
            "anthropic" | "claude" => Ok(ProviderKind::Anthropic),
            _ => Err(RagError::UnknownProvider {
                name: s.to_string(),
                supported: Self::supported_names(),
            }),
        }
    }
}

/// Display information about a resolved client
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderInfo {
    pub provider: ProviderKind,
    pub model: String,
    pub has_credential: bool,
}

/// A text-generation back-end
#[async_trait]
pub trait ProviderClient: Send + Sync {
    fn kind(&self) -> ProviderKind;

    fn model(&self) -> &str;

    fn has_credential(&self) -> bool;

    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            provider: self.kind(),
            model: self.model().to_string(),
            has_credential: self.has_credential(),
        }
    }

    /// Produce an answer for the prompt pair.
    ///
    /// Transient failures are retried internally; the error returned is the
    /// last attempt's original error.
    async fn generate(&self, system_prompt: &str, user_prompt: &str, temperature: f32)
        -> Result<String>;
}
