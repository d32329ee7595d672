//! Shared fixtures for integration tests: an in-process provider client and
//! a sample profile. No test here touches the network.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use profilerag::embedding::HashingEmbedder;
use profilerag::{
    AnswerEngine, Config, DocumentInput, ProfileInput, ProviderClient, ProviderKind,
    ProviderRegistry, RagError, Result, SourceKind,
};

/// Provider client that replays queued replies and records every prompt
pub struct ScriptedClient {
    kind: ProviderKind,
    replies: Mutex<VecDeque<Result<String>>>,
    fallback: String,
    delay: Option<Duration>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedClient {
    pub fn new(kind: ProviderKind, fallback: &str) -> Self {
        Self {
            kind,
            replies: Mutex::new(VecDeque::new()),
            fallback: fallback.to_string(),
            delay: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn with_reply(self, reply: Result<String>) -> Self {
        self.replies.lock().unwrap().push_back(reply);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl ProviderClient for ScriptedClient {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    fn has_credential(&self) -> bool {
        true
    }

    async fn generate(&self, _system: &str, user: &str, _temperature: f32) -> Result<String> {
        self.prompts.lock().unwrap().push(user.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let queued = self.replies.lock().unwrap().pop_front();
        queued.unwrap_or_else(|| Ok(self.fallback.clone()))
    }
}

/// Registry that sees no environment variables
pub fn isolated_registry(config: &Config) -> Arc<ProviderRegistry> {
    Arc::new(ProviderRegistry::with_env(
        config.providers.clone(),
        Arc::new(|_: &str| None::<String>),
    ))
}

/// Engine over the hashing embedder with an isolated registry
pub fn engine(config: &Config) -> (AnswerEngine, Arc<ProviderRegistry>) {
    let registry = isolated_registry(config);
    let engine = AnswerEngine::with_parts(
        config,
        Arc::new(HashingEmbedder::default()),
        registry.clone(),
    )
    .unwrap();
    (engine, registry)
}

pub async fn install(registry: &ProviderRegistry, client: ScriptedClient) -> Arc<ScriptedClient> {
    let client = Arc::new(client);
    registry.insert(client.clone()).await;
    client
}

pub fn sample_profile(profile_id: &str) -> ProfileInput {
    ProfileInput::new(
        profile_id,
        vec![
            DocumentInput::new(
                "Python scripting, pandas data analysis and automation",
                SourceKind::Skill,
                "Python",
            )
            .with_confidence(0.9),
            DocumentInput::new(
                "Go microservices with gRPC and Kubernetes deployments",
                SourceKind::Skill,
                "Go",
            )
            .with_confidence(0.85),
            DocumentInput::new(
                "JavaScript frontends built with React and TypeScript",
                SourceKind::Skill,
                "JavaScript",
            ),
            DocumentInput::new(
                "Senior backend engineer at Acme, 2019 to 2024. Led the payments team.",
                SourceKind::CvChunk,
                "CV",
            ),
            DocumentInput::new(
                "A rate limiter service written in Go, used in production",
                SourceKind::Repository,
                "ratelimit",
            )
            .with_extra("repo_name", "acme/ratelimit"),
        ],
    )
    .with_summary("Backend engineer with eight years of experience")
}

pub fn blocked(kind: ProviderKind) -> RagError {
    RagError::ContentBlocked {
        provider: kind,
        message: "SAFETY".to_string(),
    }
}
