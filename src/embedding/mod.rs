//! Text embedding
//!
//! Embedders turn text into fixed-length vectors comparable under cosine
//! similarity. Implementations are pure and `Send + Sync` so one instance is
//! shared behind `Arc` by every profile session.

pub mod hashing;
pub mod neural;

use std::sync::Arc;

use crate::config::{EmbeddingBackend, EmbeddingConfig};
use crate::errors::{RagError, Result};

pub use hashing::HashingEmbedder;
pub use neural::NeuralEmbedder;

/// Text → vector conversion with a fixed dimensionality
pub trait Embedder: Send + Sync {
    /// Embed a single text. Fails with `EmbeddingFailure` on blank input.
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several texts; all-or-nothing
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|text| self.embed(text)).collect()
    }

    /// Width of every vector this embedder produces
    fn dimension(&self) -> usize;

    /// Short identifier for logs and stats
    fn name(&self) -> &str;
}

/// Build the embedder selected in configuration
pub fn build_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    match config.backend {
        EmbeddingBackend::Hashing => Ok(Arc::new(HashingEmbedder::new(config.dimension)?)),
        EmbeddingBackend::Neural => Ok(Arc::new(NeuralEmbedder::new(&config.model_id)?)),
    }
}

/// Reject input that is empty after trimming
pub(crate) fn validate_text(text: &str) -> Result<&str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(RagError::EmbeddingFailure(
            "input text is empty after trimming".to_string(),
        ));
    }
    Ok(trimmed)
}

/// Scale a vector to unit length in place; zero vectors are left untouched
pub(crate) fn l2_normalize(vector: &mut [f32]) {
    let norm_sq: f32 = vector.iter().map(|v| v * v).sum();
    if norm_sq > 0.0 {
        let inv = 1.0 / norm_sq.sqrt();
        for v in vector.iter_mut() {
            *v *= inv;
        }
    }
}

/// Cosine similarity of two raw vectors.
///
/// Norms are computed here rather than assumed, so vectors of different
/// scales still compare correctly. A zero-norm side yields 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let similarity = dot / (norm_a.sqrt() * norm_b.sqrt());
    // Overflowing norms give NaN
    if similarity.is_nan() {
        return 0.0;
    }
    similarity.clamp(-1.0, 1.0)
}
