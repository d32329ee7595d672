//! RAG orchestrator
//!
//! One `ask` runs: embed question -> search -> assemble prompt -> generate
//! -> parse citations -> record the turn. The turn is recorded only after
//! every fallible step has succeeded, so a failed or cancelled ask leaves the
//! conversation as it was.

use std::sync::Arc;
use tracing::{debug, info};

use super::citations::evidence_indices;
use super::prompt::{PromptBuilder, SYSTEM_PROMPT};
use crate::config::RetrievalConfig;
use crate::errors::{RagError, Result};
use crate::index::{MetadataFilter, VectorIndex};
use crate::providers::{ProviderKind, ProviderRegistry};
use crate::session::{ConversationState, ConversationTurn};
use crate::types::{Document, DocumentMetadata, QueryResult};

pub struct RagOrchestrator {
    registry: Arc<ProviderRegistry>,
    prompts: PromptBuilder,
    retrieval: RetrievalConfig,
}

impl RagOrchestrator {
    pub fn new(registry: Arc<ProviderRegistry>, retrieval: RetrievalConfig) -> Self {
        Self {
            registry,
            prompts: PromptBuilder::new(),
            retrieval,
        }
    }

    pub fn retrieval(&self) -> &RetrievalConfig {
        &self.retrieval
    }

    /// Answer `question` from `index`, extending `conversation` on success.
    ///
    /// Asking a provider other than the one that produced the history starts
    /// a fresh conversation. A `filter` restricts retrieval to matching
    /// documents.
    pub async fn ask(
        &self,
        index: Arc<VectorIndex>,
        conversation: &mut ConversationState,
        summary: Option<&str>,
        question: &str,
        provider: ProviderKind,
        filter: Option<&MetadataFilter>,
    ) -> Result<QueryResult> {
        if index.is_empty() {
            return Err(RagError::IndexEmpty(
                "the profile index holds zero documents".to_string(),
            ));
        }

        let query = Self::embed_question(&index, question).await?;
        let predicate = filter.map(|f| move |m: &DocumentMetadata| f.matches(m));
        let hits = index.search(
            &query,
            self.retrieval.top_k,
            predicate.as_ref().map(|p| p as &dyn Fn(&DocumentMetadata) -> bool),
        )?;
        let retrieved: Vec<Document> = hits.iter().map(|h| h.document.clone()).collect();
        let similarity_scores: Vec<f32> = hits.iter().map(|h| h.score).collect();
        debug!(retrieved = retrieved.len(), "evidence retrieved");

        let user_prompt = {
            let evidence: Vec<&Document> = retrieved.iter().collect();
            let history = conversation.history_for(provider);
            self.prompts.build(question, &evidence, summary, &history)
        };

        let client = self.registry.client(provider).await?;
        let answer = client
            .generate(SYSTEM_PROMPT, &user_prompt, self.retrieval.temperature)
            .await?;

        let evidence: Vec<Document> = evidence_indices(&answer, retrieved.len())
            .into_iter()
            .map(|i| retrieved[i].clone())
            .collect();
        info!(
            provider = %provider,
            retrieved = retrieved.len(),
            cited = evidence.len(),
            "question answered"
        );

        conversation.record(ConversationTurn::new(
            question.trim(),
            answer.clone(),
            evidence.clone(),
            provider,
        ));

        Ok(QueryResult {
            answer,
            evidence: Some(evidence),
            similarity_scores,
            provider,
            model: client.model().to_string(),
        })
    }

    /// Embed on the blocking pool; embedders are CPU bound
    async fn embed_question(index: &Arc<VectorIndex>, question: &str) -> Result<Vec<f32>> {
        let embedder = index.embedder().clone();
        let text = question.to_string();
        tokio::task::spawn_blocking(move || embedder.embed(&text))
            .await
            .map_err(|e| RagError::EmbeddingFailure(format!("embedding task failed: {}", e)))?
    }
}
