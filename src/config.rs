//! Configuration management for profilerag
//!
//! TOML configuration with built-in defaults and validation.
//! Location: ~/.profilerag/config.toml

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::embedding::neural::DEFAULT_MODEL_ID;
use crate::errors::{RagError, Result};
use crate::providers::ProviderKind;

/// Complete configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub retrieval: RetrievalConfig,
    pub providers: ProvidersConfig,
    pub embedding: EmbeddingConfig,
    pub logging: LoggingConfig,
}

/// Retrieval and prompt settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
    pub history_turns: usize,
    pub temperature: f32,
}

/// Provider selection, retry policy and per-back-end settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub default: String,
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub request_timeout_secs: u64,
    pub max_tokens: u32,
    pub gemini: BackendSettings,
    pub openai: BackendSettings,
    pub anthropic: BackendSettings,
}

/// Overrides for one back-end
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Embedding back-end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    Hashing,
    Neural,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub backend: EmbeddingBackend,
    pub dimension: usize,
    pub model_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            history_turns: 3,
            temperature: 0.3,
        }
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            default: ProviderKind::Gemini.to_string(),
            max_retries: 3,
            base_delay_ms: 2000,
            max_delay_ms: 10_000,
            request_timeout_secs: 60,
            max_tokens: 1024,
            gemini: BackendSettings::default(),
            openai: BackendSettings::default(),
            anthropic: BackendSettings::default(),
        }
    }
}

impl ProvidersConfig {
    pub fn backend(&self, kind: ProviderKind) -> &BackendSettings {
        match kind {
            ProviderKind::Gemini => &self.gemini,
            ProviderKind::OpenAi => &self.openai,
            ProviderKind::Anthropic => &self.anthropic,
        }
    }

    pub fn backend_mut(&mut self, kind: ProviderKind) -> &mut BackendSettings {
        match kind {
            ProviderKind::Gemini => &mut self.gemini,
            ProviderKind::OpenAi => &mut self.openai,
            ProviderKind::Anthropic => &mut self.anthropic,
        }
    }
}

// api_key stays out of debug output
impl std::fmt::Debug for BackendSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendSettings")
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::Hashing,
            dimension: 384,
            model_id: DEFAULT_MODEL_ID.to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(config_path) => Self::load_from_file(config_path),
            None => Self::load_default(),
        }
    }

    /// Load configuration from specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            RagError::ConfigError(format!("failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml(&contents)?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Parse and validate TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)
            .map_err(|e| RagError::ConfigError(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the standard location, or built-in defaults when absent
    pub fn load_default() -> Result<Self> {
        if let Some(config_path) = Self::default_path() {
            if config_path.exists() {
                return Self::load_from_file(&config_path);
            }
        }
        Ok(Config::default())
    }

    /// `~/.profilerag/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".profilerag").join("config.toml"))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.retrieval.top_k == 0 {
            return Err(RagError::ConfigError(
                "retrieval.top_k must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.retrieval.temperature) {
            return Err(RagError::ConfigError(
                "retrieval.temperature must be between 0.0 and 2.0".to_string(),
            ));
        }

        self.default_provider()?;

        if self.providers.max_retries == 0 {
            return Err(RagError::ConfigError(
                "providers.max_retries must be at least 1".to_string(),
            ));
        }

        if self.providers.base_delay_ms > self.providers.max_delay_ms {
            return Err(RagError::ConfigError(
                "providers.base_delay_ms must not exceed providers.max_delay_ms".to_string(),
            ));
        }

        if self.providers.request_timeout_secs == 0 || self.providers.max_tokens == 0 {
            return Err(RagError::ConfigError(
                "providers.request_timeout_secs and providers.max_tokens must be greater than 0"
                    .to_string(),
            ));
        }

        if self.embedding.dimension == 0 {
            return Err(RagError::ConfigError(
                "embedding.dimension must be greater than 0".to_string(),
            ));
        }

        match self.logging.level.to_ascii_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" | "off" => {}
            other => {
                return Err(RagError::ConfigError(format!(
                    "invalid logging.level: {}",
                    other
                )))
            }
        }

        Ok(())
    }

    /// The configured default provider
    pub fn default_provider(&self) -> Result<ProviderKind> {
        self.providers.default.parse().map_err(|_| {
            RagError::ConfigError(format!(
                "providers.default '{}' is not one of: {}",
                self.providers.default,
                ProviderKind::supported_names()
            ))
        })
    }

    /// Copy with every api_key replaced, for display
    pub fn redacted(&self) -> Config {
        let mut config = self.clone();
        for kind in ProviderKind::ALL {
            let backend = config.providers.backend_mut(kind);
            if backend.api_key.is_some() {
                backend.api_key = Some("<redacted>".to_string());
            }
        }
        config
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| RagError::ConfigError(format!("failed to serialize config: {}", e)))
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = self.to_toml()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }
}
