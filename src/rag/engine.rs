//! Answer engine
//!
//! Public entry point: index profiles, ask questions against them, inspect
//! and reset sessions. Every error leaving `ask` carries the profile id and
//! question around the untouched underlying error.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{info, info_span, Instrument};

use super::ingest::build_documents;
use super::orchestrator::RagOrchestrator;
use crate::config::Config;
use crate::embedding::{build_embedder, Embedder};
use crate::errors::{RagError, Result};
use crate::index::{IndexStats, MetadataFilter, VectorIndex};
use crate::providers::{ProviderInfo, ProviderKind, ProviderRegistry};
use crate::session::{IndexedProfile, ProfileSession, SessionStats};
use crate::types::{ProfileInput, QueryResult};

pub struct AnswerEngine {
    embedder: Arc<dyn Embedder>,
    registry: Arc<ProviderRegistry>,
    orchestrator: RagOrchestrator,
    default_provider: ProviderKind,
    history_turns: usize,
    sessions: RwLock<HashMap<String, Arc<ProfileSession>>>,
}

impl AnswerEngine {
    /// Engine with the configured embedder and an environment-backed registry
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;
        let embedder = build_embedder(&config.embedding)?;
        let registry = Arc::new(ProviderRegistry::new(config.providers.clone()));
        Self::with_parts(config, embedder, registry)
    }

    /// Engine from explicit parts
    pub fn with_parts(
        config: &Config,
        embedder: Arc<dyn Embedder>,
        registry: Arc<ProviderRegistry>,
    ) -> Result<Self> {
        Ok(Self {
            embedder,
            orchestrator: RagOrchestrator::new(registry.clone(), config.retrieval.clone()),
            registry,
            default_provider: config.default_provider()?,
            history_turns: config.retrieval.history_turns,
            sessions: RwLock::new(HashMap::new()),
        })
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    pub fn default_provider(&self) -> ProviderKind {
        self.default_provider
    }

    /// Build a fresh index for the profile and swap it in.
    ///
    /// The previous index stays in service until the new one is complete; a
    /// failed build leaves it in place.
    pub async fn index(&self, profile: ProfileInput) -> Result<IndexStats> {
        let documents = build_documents(&profile)?;
        let embedder = self.embedder.clone();

        let index = tokio::task::spawn_blocking(move || -> Result<VectorIndex> {
            let mut index = VectorIndex::new(embedder);
            index.add(documents)?;
            Ok(index)
        })
        .await
        .map_err(|e| RagError::EmbeddingFailure(format!("indexing task failed: {}", e)))??;

        let stats = index.stats();
        let session = self.session_or_create(&profile.profile_id).await;
        session
            .install(IndexedProfile {
                index: Arc::new(index),
                summary: profile.summary,
            })
            .await;

        info!(
            profile_id = %profile.profile_id,
            session = %session.id(),
            documents = stats.documents,
            "profile indexed"
        );
        Ok(stats)
    }

    /// Answer a question about an indexed profile.
    ///
    /// `provider` defaults to the configured provider. With `show_evidence`
    /// false the result carries no evidence; retrieval is unchanged.
    pub async fn ask(
        &self,
        profile_id: &str,
        question: &str,
        provider: Option<&str>,
        show_evidence: bool,
    ) -> Result<QueryResult> {
        self.ask_filtered(profile_id, question, provider, show_evidence, None)
            .await
    }

    /// `ask` with retrieval restricted to documents matching `filter`
    pub async fn ask_filtered(
        &self,
        profile_id: &str,
        question: &str,
        provider: Option<&str>,
        show_evidence: bool,
        filter: Option<&MetadataFilter>,
    ) -> Result<QueryResult> {
        self.ask_inner(profile_id, question, provider, show_evidence, filter)
            .await
            .map_err(|e| e.with_query(profile_id, question))
    }

    /// `ask` bounded by a deadline.
    ///
    /// On expiry the in-flight request and any backoff sleep are dropped and
    /// the conversation is left exactly as it was.
    pub async fn ask_with_deadline(
        &self,
        profile_id: &str,
        question: &str,
        provider: Option<&str>,
        show_evidence: bool,
        filter: Option<&MetadataFilter>,
        deadline: Duration,
    ) -> Result<QueryResult> {
        let ask = self.ask_filtered(profile_id, question, provider, show_evidence, filter);
        match tokio::time::timeout(deadline, ask).await {
            Ok(result) => result,
            Err(_) => Err(RagError::Timeout {
                duration_ms: deadline.as_millis() as u64,
            }
            .with_query(profile_id, question)),
        }
    }

    async fn ask_inner(
        &self,
        profile_id: &str,
        question: &str,
        provider: Option<&str>,
        show_evidence: bool,
        filter: Option<&MetadataFilter>,
    ) -> Result<QueryResult> {
        let provider = match provider {
            Some(name) => name.parse::<ProviderKind>()?,
            None => self.default_provider,
        };
        let session = self.session(profile_id).await?;

        let span = info_span!("ask", session = %session.id(), profile_id, provider = %provider);
        async {
            // Held for the whole pipeline: one ask per session at a time
            let mut conversation = session.lock_conversation().await;
            let snapshot = session
                .snapshot()
                .await
                .ok_or_else(|| not_indexed(profile_id))?;

            let result = self
                .orchestrator
                .ask(
                    snapshot.index.clone(),
                    &mut conversation,
                    snapshot.summary.as_deref(),
                    question,
                    provider,
                    filter,
                )
                .await?;

            Ok::<_, RagError>(if show_evidence {
                result
            } else {
                result.without_evidence()
            })
        }
        .instrument(span)
        .await
    }

    /// Forget a profile's index and conversation. Returns whether it existed.
    pub async fn drop_profile(&self, profile_id: &str) -> bool {
        let removed = self.sessions.write().await.remove(profile_id).is_some();
        if removed {
            info!(profile_id, "profile dropped");
        }
        removed
    }

    pub async fn reset_conversation(&self, profile_id: &str) -> Result<()> {
        self.session(profile_id).await?.reset_conversation().await;
        Ok(())
    }

    pub async fn stats(&self, profile_id: &str) -> Result<SessionStats> {
        Ok(self.session(profile_id).await?.stats().await)
    }

    /// Ids of every profile with a session, sorted
    pub async fn profiles(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub async fn providers(&self) -> Result<Vec<ProviderInfo>> {
        self.registry.providers().await
    }

    async fn session(&self, profile_id: &str) -> Result<Arc<ProfileSession>> {
        self.sessions
            .read()
            .await
            .get(profile_id)
            .cloned()
            .ok_or_else(|| not_indexed(profile_id))
    }

    async fn session_or_create(&self, profile_id: &str) -> Arc<ProfileSession> {
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(profile_id.to_string())
            .or_insert_with(|| Arc::new(ProfileSession::new(profile_id, self.history_turns)))
            .clone()
    }
}

fn not_indexed(profile_id: &str) -> RagError {
    RagError::IndexEmpty(format!("profile '{}' has not been indexed", profile_id))
}
