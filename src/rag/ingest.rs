// Profile ingestion: collaborator inputs -> index-ready documents
use serde_json::Value;
use std::collections::HashMap;

use crate::errors::{RagError, Result};
use crate::types::{Document, DocumentInput, DocumentMetadata, ProfileInput, SourceKind};

/// Words per CV chunk
pub const CV_CHUNK_WORDS: usize = 400;

/// Turn a profile's inputs into documents with deterministic ids.
///
/// Blank inputs are skipped. Long CV text is split into fixed-size word
/// chunks. Ids are `<source-kind>-<ordinal>`, counted per kind in input order.
pub fn build_documents(profile: &ProfileInput) -> Result<Vec<Document>> {
    let mut ordinals: HashMap<SourceKind, usize> = HashMap::new();
    let mut documents = Vec::new();

    for input in profile.documents.iter().filter(|d| !d.is_blank()) {
        for (text, metadata) in expand(input) {
            let ordinal = ordinals.entry(input.source_kind).or_insert(0);
            documents.push(Document {
                id: format!("{}-{}", input.source_kind, ordinal),
                text,
                embedding: Vec::new(),
                metadata,
            });
            *ordinal += 1;
        }
    }

    if documents.is_empty() {
        return Err(RagError::NoIndexableData {
            profile_id: profile.profile_id.clone(),
        });
    }
    Ok(documents)
}

fn expand(input: &DocumentInput) -> Vec<(String, DocumentMetadata)> {
    if input.source_kind != SourceKind::CvChunk {
        return vec![(input.text.trim().to_string(), input.metadata())];
    }

    let mut chunks = chunk_words(&input.text, CV_CHUNK_WORDS);
    if chunks.len() == 1 {
        return vec![(chunks.remove(0), input.metadata())];
    }

    chunks
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| {
            let mut metadata = input.metadata();
            metadata.label = format!("{} (part {})", input.label, i + 1);
            metadata.extra.insert("chunk_id".to_string(), Value::from(i));
            (chunk, metadata)
        })
        .collect()
}

/// Split on whitespace into chunks of at most `size` words
pub fn chunk_words(text: &str, size: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    words
        .chunks(size.max(1))
        .map(|chunk| chunk.join(" "))
        .collect()
}
