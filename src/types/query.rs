use serde::{Deserialize, Serialize};

use crate::providers::ProviderKind;
use crate::types::Document;

/// Outcome of one `ask` call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    pub answer: String,
    /// Documents backing the answer; `None` when the caller hid evidence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<Vec<Document>>,
    /// Cosine similarity of every retrieved document, in retrieval order
    pub similarity_scores: Vec<f32>,
    pub provider: ProviderKind,
    pub model: String,
}

impl QueryResult {
    /// Drop the evidence list while keeping everything else
    pub fn without_evidence(mut self) -> Self {
        self.evidence = None;
        self
    }

    pub fn evidence_len(&self) -> usize {
        self.evidence.as_ref().map_or(0, Vec::len)
    }
}
