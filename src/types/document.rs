//! Document types exchanged with the profile-building layer
//!
//! Collaborators hand over `DocumentInput` tuples; the index stores
//! immutable `Document`s carrying their embedding.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::errors::{RagError, Result};

/// Where a profile fragment came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    Skill,
    CvChunk,
    Repository,
    Statement,
    ReferenceLetter,
}

impl SourceKind {
    pub const ALL: [SourceKind; 5] = [
        SourceKind::Skill,
        SourceKind::CvChunk,
        SourceKind::Repository,
        SourceKind::Statement,
        SourceKind::ReferenceLetter,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Skill => "skill",
            SourceKind::CvChunk => "cv-chunk",
            SourceKind::Repository => "repository",
            SourceKind::Statement => "statement",
            SourceKind::ReferenceLetter => "reference-letter",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "skill" => Ok(SourceKind::Skill),
            "cv-chunk" | "cv" | "cv-text" => Ok(SourceKind::CvChunk),
            "repository" | "repo" | "github-repo" => Ok(SourceKind::Repository),
            "statement" | "personal-statement" => Ok(SourceKind::Statement),
            "reference-letter" | "reference" => Ok(SourceKind::ReferenceLetter),
            other => Err(RagError::ConfigError(format!("unknown source kind '{}'", other))),
        }
    }
}

/// Metadata attached to every indexed document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub source_kind: SourceKind,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    /// Collaborator-supplied fields (category, repo_name, chunk_id, ...)
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl DocumentMetadata {
    /// Look up a metadata field by key as a JSON value
    pub fn get(&self, key: &str) -> Option<Value> {
        match key {
            "source_kind" | "sourceKind" | "type" => {
                Some(Value::String(self.source_kind.as_str().to_string()))
            }
            "label" => Some(Value::String(self.label.clone())),
            "confidence" => self
                .confidence
                .and_then(|c| serde_json::Number::from_f64(f64::from(c)))
                .map(Value::Number),
            other => self.extra.get(other).cloned(),
        }
    }
}

/// An indexed profile fragment. Immutable once indexed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub text: String,
    #[serde(skip)]
    pub embedding: Vec<f32>,
    pub metadata: DocumentMetadata,
}

impl Document {
    pub fn source_kind(&self) -> SourceKind {
        self.metadata.source_kind
    }

    pub fn label(&self) -> &str {
        &self.metadata.label
    }
}

/// Fragment supplied by the profile-building layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentInput {
    pub text: String,
    pub source_kind: SourceKind,
    pub label: String,
    #[serde(default)]
    pub confidence: Option<f32>,
    #[serde(default)]
    pub extra: Map<String, Value>,
}

impl DocumentInput {
    pub fn new(text: impl Into<String>, source_kind: SourceKind, label: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source_kind,
            label: label.into(),
            confidence: None,
            extra: Map::new(),
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// True when the text is blank after trimming
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub(crate) fn metadata(&self) -> DocumentMetadata {
        DocumentMetadata {
            source_kind: self.source_kind,
            label: self.label.clone(),
            confidence: self.confidence.map(|c| c.clamp(0.0, 1.0)),
            extra: self.extra.clone(),
        }
    }
}

/// Everything the collaborator layer hands over for one profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileInput {
    pub profile_id: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub documents: Vec<DocumentInput>,
}

impl ProfileInput {
    pub fn new(profile_id: impl Into<String>, documents: Vec<DocumentInput>) -> Self {
        Self {
            profile_id: profile_id.into(),
            summary: None,
            documents,
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Load a profile exported as JSON by the profile-building layer
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let profile: ProfileInput = serde_json::from_str(&contents)?;
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_source_kind_parsing() {
        assert_eq!("skill".parse::<SourceKind>().unwrap(), SourceKind::Skill);
        assert_eq!("cv_chunk".parse::<SourceKind>().unwrap(), SourceKind::CvChunk);
        assert_eq!("Reference-Letter".parse::<SourceKind>().unwrap(), SourceKind::ReferenceLetter);
        assert!("podcast".parse::<SourceKind>().is_err());
    }

    #[test]
    fn test_metadata_get() {
        let input = DocumentInput::new("Rust", SourceKind::Skill, "Rust")
            .with_confidence(0.9)
            .with_extra("category", "programming_languages");
        let metadata = input.metadata();

        assert_eq!(metadata.get("source_kind"), Some(json!("skill")));
        assert_eq!(metadata.get("label"), Some(json!("Rust")));
        assert_eq!(metadata.get("category"), Some(json!("programming_languages")));
        assert!(metadata.get("missing").is_none());
        let confidence = metadata.get("confidence").and_then(|v| v.as_f64()).unwrap();
        assert!((confidence - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_confidence_clamped() {
        let input = DocumentInput::new("x", SourceKind::Skill, "x").with_confidence(1.7);
        assert_eq!(input.metadata().confidence, Some(1.0));
    }

    #[test]
    fn test_profile_input_from_json() {
        let raw = json!({
            "profile_id": "cand-42",
            "summary": "Backend engineer",
            "documents": [
                {"text": "Go concurrency patterns", "source_kind": "skill", "label": "Go", "confidence": 0.92},
                {"text": "Led a 5-person team", "source_kind": "statement", "label": "Statement"}
            ]
        });
        let profile: ProfileInput = serde_json::from_value(raw).unwrap();

        assert_eq!(profile.profile_id, "cand-42");
        assert_eq!(profile.documents.len(), 2);
        assert_eq!(profile.documents[0].confidence, Some(0.92));
        assert!(profile.documents[1].confidence.is_none());
    }
}
