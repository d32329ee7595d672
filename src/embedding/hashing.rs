//! Feature-hashing embedder
//!
//! Bag-of-words vectors: lowercase word tokens, stop-words dropped, each token
//! hashed with FNV-1a into one of `dimension` buckets with sublinear term
//! frequency weighting, then L2 normalized. Texts sharing vocabulary get a
//! positive cosine similarity; no model download is needed.

use std::collections::BTreeMap;

use super::{l2_normalize, validate_text, Embedder};
use crate::errors::{RagError, Result};

/// Default width, matching the MiniLM sentence model
pub const DEFAULT_DIMENSION: usize = 384;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

const STOP_WORDS: &[&str] = &[
    "a", "about", "an", "and", "any", "are", "as", "at", "be", "been", "but", "by", "can",
    "candidate", "could", "did", "do", "does", "for", "from", "has", "have", "he", "her", "his",
    "how", "i", "if", "in", "into", "is", "it", "its", "of", "on", "or", "our", "she", "so",
    "that", "the", "their", "them", "they", "this", "to", "was", "we", "were", "what", "when",
    "where", "which", "who", "why", "will", "with", "would", "you", "your",
];

/// Deterministic bag-of-words embedder
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(RagError::ConfigError(
                "embedding dimension must be greater than 0".to_string(),
            ));
        }
        Ok(Self { dimension })
    }

    fn bucket(&self, token: &str) -> usize {
        (fnv1a(token.as_bytes()) % self.dimension as u64) as usize
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self {
            dimension: DEFAULT_DIMENSION,
        }
    }
}

impl Embedder for HashingEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let trimmed = validate_text(text)?;
        let lowered = trimmed.to_lowercase();

        let tokens = tokenize(&lowered);
        let content: Vec<&str> = tokens
            .iter()
            .copied()
            .filter(|t| !STOP_WORDS.contains(t))
            .collect();

        // Fall back to stop-words, then to the whole text, so no input maps to zero
        let features: Vec<&str> = if !content.is_empty() {
            content
        } else if !tokens.is_empty() {
            tokens
        } else {
            vec![lowered.as_str()]
        };

        // BTreeMap keeps the summation order stable across runs
        let mut counts: BTreeMap<&str, u32> = BTreeMap::new();
        for token in features {
            *counts.entry(token).or_insert(0) += 1;
        }

        let mut vector = vec![0.0f32; self.dimension];
        for (token, tf) in counts {
            vector[self.bucket(token)] += 1.0 + (tf as f32).ln();
        }

        l2_normalize(&mut vector);
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "hashing"
    }
}

/// Split on anything that is not alphanumeric, keeping `+` and `#` so
/// "c++" and "c#" survive as tokens
fn tokenize(text: &str) -> Vec<&str> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '+' || c == '#'))
        .filter(|t| !t.is_empty())
        .collect()
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}
