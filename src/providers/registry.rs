//! Provider registry
//!
//! Resolves a provider name to a shared client. Credential precedence:
//! 1. explicit credential (`set_credential`, or `api_key` in the config file)
//! 2. environment variables from the per-provider table, first non-empty wins
//! 3. none: the client is still built and its first `generate` fails fast
//!
//! One client per provider is cached for the registry's lifetime. The cache is
//! filled under the lock, so concurrent first use constructs exactly once.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::anthropic::AnthropicClient;
use super::gemini::GeminiClient;
use super::openai::OpenAiClient;
use super::{ProviderClient, ProviderConfig, ProviderInfo, ProviderKind};
use crate::config::ProvidersConfig;
use crate::errors::Result;

/// Environment lookup, injectable for tests
pub type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Where a resolved credential came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    Explicit,
    Environment(&'static str),
    Missing,
}

impl std::fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialSource::Explicit => f.write_str("explicit"),
            CredentialSource::Environment(name) => write!(f, "env:{}", name),
            CredentialSource::Missing => f.write_str("missing"),
        }
    }
}

pub struct ProviderRegistry {
    settings: ProvidersConfig,
    env: EnvLookup,
    credentials: Mutex<HashMap<ProviderKind, String>>,
    clients: Mutex<HashMap<ProviderKind, Arc<dyn ProviderClient>>>,
}

impl ProviderRegistry {
    /// Registry reading credentials from the process environment
    pub fn new(settings: ProvidersConfig) -> Self {
        Self::with_env(settings, Arc::new(|name: &str| std::env::var(name).ok()))
    }

    pub fn with_env(settings: ProvidersConfig, env: EnvLookup) -> Self {
        Self {
            settings,
            env,
            credentials: Mutex::new(HashMap::new()),
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve a provider by (case-insensitive, alias-aware) name
    pub async fn resolve(&self, name: &str) -> Result<Arc<dyn ProviderClient>> {
        let kind: ProviderKind = name.parse()?;
        self.client(kind).await
    }

    /// Cached client for `kind`, constructing it on first use
    pub async fn client(&self, kind: ProviderKind) -> Result<Arc<dyn ProviderClient>> {
        let mut clients = self.clients.lock().await;
        if let Some(client) = clients.get(&kind) {
            return Ok(client.clone());
        }

        let config = self.provider_config(kind).await;
        let client = Self::build(config)?;
        clients.insert(kind, client.clone());
        Ok(client)
    }

    /// Register a ready-made client, replacing any cached one
    pub async fn insert(&self, client: Arc<dyn ProviderClient>) {
        let kind = client.kind();
        self.clients.lock().await.insert(kind, client);
        debug!(provider = %kind, "provider client registered");
    }

    /// Set an explicit credential; the next resolve builds a fresh client
    pub async fn set_credential(&self, kind: ProviderKind, credential: impl Into<String>) {
        self.credentials.lock().await.insert(kind, credential.into());
        self.clients.lock().await.remove(&kind);
        info!(provider = %kind, "explicit credential set");
    }

    /// Info for every supported provider
    pub async fn providers(&self) -> Result<Vec<ProviderInfo>> {
        let mut infos = Vec::with_capacity(ProviderKind::ALL.len());
        for kind in ProviderKind::ALL {
            infos.push(self.client(kind).await?.info());
        }
        Ok(infos)
    }

    /// Credential for `kind` by precedence, with its source
    pub async fn credential(&self, kind: ProviderKind) -> (Option<String>, CredentialSource) {
        let explicit = self.credentials.lock().await.get(&kind).cloned().or_else(|| {
            self.settings
                .backend(kind)
                .api_key
                .clone()
                .filter(|k| !k.trim().is_empty())
        });
        if let Some(key) = explicit {
            return (Some(key), CredentialSource::Explicit);
        }

        for &name in kind.credential_env_names() {
            if let Some(value) = (self.env)(name) {
                let value = value.trim().to_string();
                if !value.is_empty() {
                    return (Some(value), CredentialSource::Environment(name));
                }
            }
        }
        (None, CredentialSource::Missing)
    }

    async fn provider_config(&self, kind: ProviderKind) -> ProviderConfig {
        let mut config = ProviderConfig::from_settings(kind, &self.settings);
        let (credential, source) = self.credential(kind).await;
        config.credential = credential;
        info!(provider = %kind, model = %config.model, credential = %source, "provider client constructed");
        config
    }

    fn build(config: ProviderConfig) -> Result<Arc<dyn ProviderClient>> {
        Ok(match config.kind {
            ProviderKind::Gemini => Arc::new(GeminiClient::new(config)?),
            ProviderKind::OpenAi => Arc::new(OpenAiClient::new(config)?),
            ProviderKind::Anthropic => Arc::new(AnthropicClient::new(config)?),
        })
    }
}
