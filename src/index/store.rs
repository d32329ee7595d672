// In-memory vector index for one profile
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use crate::embedding::{cosine_similarity, Embedder};
use crate::errors::{RagError, Result};
use crate::types::{Document, DocumentMetadata, SourceKind};

/// A retrieved document with its cosine similarity to the query
#[derive(Debug, Clone, Copy)]
pub struct SearchHit<'a> {
    pub document: &'a Document,
    pub score: f32,
}

/// Index statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexStats {
    pub documents: usize,
    pub dimension: Option<usize>,
    pub by_source: BTreeMap<SourceKind, usize>,
    pub embedder: String,
}

/// Append-only store of embedded documents.
///
/// Every stored embedding has the same width. A batch passed to `add` is
/// either appended in full or not at all.
pub struct VectorIndex {
    embedder: Arc<dyn Embedder>,
    documents: Vec<Document>,
    dimension: Option<usize>,
}

impl VectorIndex {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            documents: Vec::new(),
            dimension: None,
        }
    }

    /// Embed and append a batch of documents.
    ///
    /// Documents arriving with an empty `embedding` are embedded from their
    /// text; pre-computed embeddings are kept but must match the index width.
    pub fn add(&mut self, mut documents: Vec<Document>) -> Result<usize> {
        if documents.is_empty() {
            return Err(RagError::EmptyBatch);
        }

        let pending: Vec<usize> = documents
            .iter()
            .enumerate()
            .filter(|(_, d)| d.embedding.is_empty())
            .map(|(i, _)| i)
            .collect();
        if !pending.is_empty() {
            let texts: Vec<&str> = pending.iter().map(|&i| documents[i].text.as_str()).collect();
            let embeddings = self.embedder.embed_batch(&texts)?;
            for (i, embedding) in pending.into_iter().zip(embeddings) {
                documents[i].embedding = embedding;
            }
        }

        // Validate the whole batch before touching the store
        let expected = self
            .dimension
            .unwrap_or_else(|| documents[0].embedding.len());
        if let Some(bad) = documents.iter().find(|d| d.embedding.len() != expected) {
            return Err(RagError::DimensionMismatch {
                expected,
                found: bad.embedding.len(),
            });
        }
        if let Some(bad) = documents
            .iter()
            .find(|d| d.embedding.iter().any(|v| !v.is_finite()))
        {
            return Err(RagError::EmbeddingFailure(format!(
                "document '{}' has a non-finite embedding value",
                bad.id
            )));
        }

        let added = documents.len();
        self.dimension = Some(expected);
        self.documents.extend(documents);
        debug!(added, total = self.documents.len(), "documents appended to index");
        Ok(added)
    }

    /// Up to `k` documents by descending cosine similarity.
    ///
    /// The filter runs before ranking, so the result holds the best `k`
    /// *matching* documents. Equal scores keep insertion order.
    pub fn search(
        &self,
        query: &[f32],
        k: usize,
        filter: Option<&dyn Fn(&DocumentMetadata) -> bool>,
    ) -> Result<Vec<SearchHit<'_>>> {
        if self.documents.is_empty() {
            return Err(RagError::IndexEmpty(
                "search on an index holding zero documents".to_string(),
            ));
        }
        if let Some(expected) = self.dimension {
            if query.len() != expected {
                return Err(RagError::DimensionMismatch {
                    expected,
                    found: query.len(),
                });
            }
        }
        if query.iter().any(|v| !v.is_finite()) {
            return Err(RagError::EmbeddingFailure(
                "query embedding has a non-finite value".to_string(),
            ));
        }

        let mut hits: Vec<SearchHit<'_>> = self
            .documents
            .iter()
            .filter(|d| filter.map_or(true, |f| f(&d.metadata)))
            .map(|document| SearchHit {
                document,
                score: cosine_similarity(query, &document.embedding),
            })
            .collect();

        // Stable sort: ties stay in insertion order
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(k);
        Ok(hits)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    pub fn stats(&self) -> IndexStats {
        let mut by_source = BTreeMap::new();
        for document in &self.documents {
            *by_source.entry(document.source_kind()).or_insert(0) += 1;
        }
        IndexStats {
            documents: self.documents.len(),
            dimension: self.dimension,
            by_source,
            embedder: self.embedder.name().to_string(),
        }
    }
}
