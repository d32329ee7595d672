//! Error types for profilerag
//!
//! Every failure carries a taxonomy kind, a human-actionable hint and the
//! original underlying message. Provider errors are never re-wrapped by the
//! retry loop; the orchestrator only adds query context around them.

use crate::providers::ProviderKind;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Error taxonomy shared by every component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MissingCredential,
    RateLimited,
    ContentBlocked,
    NetworkFailure,
    InvalidResponse,
    NoIndexableData,
    IndexEmpty,
    EmbeddingFailure,
    EmptyBatch,
    DimensionMismatch,
    UnknownProvider,
    Timeout,
    Config,
    Io,
    Serialization,
}

impl ErrorKind {
    /// Transient failures that a provider client may retry
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::RateLimited | ErrorKind::NetworkFailure)
    }

    /// Caller-side precondition violations (never provider errors)
    pub fn is_precondition(self) -> bool {
        matches!(
            self,
            ErrorKind::NoIndexableData | ErrorKind::IndexEmpty | ErrorKind::EmptyBatch
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::MissingCredential => "missing_credential",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::ContentBlocked => "content_blocked",
            ErrorKind::NetworkFailure => "network_failure",
            ErrorKind::InvalidResponse => "invalid_response",
            ErrorKind::NoIndexableData => "no_indexable_data",
            ErrorKind::IndexEmpty => "index_empty",
            ErrorKind::EmbeddingFailure => "embedding_failure",
            ErrorKind::EmptyBatch => "empty_batch",
            ErrorKind::DimensionMismatch => "dimension_mismatch",
            ErrorKind::UnknownProvider => "unknown_provider",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Config => "config",
            ErrorKind::Io => "io",
            ErrorKind::Serialization => "serialization",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main error type for the answer engine
#[derive(Error, Debug)]
pub enum RagError {
    /// No usable credential for the provider, or the provider rejected it
    #[error("{provider}: {message}")]
    MissingCredential {
        provider: ProviderKind,
        message: String,
    },

    /// Provider reported quota or rate exhaustion
    #[error("{provider} rate limited: {message}")]
    RateLimited {
        provider: ProviderKind,
        message: String,
    },

    /// Provider safety filter rejected the prompt or the response
    #[error("{provider} blocked the request: {message}")]
    ContentBlocked {
        provider: ProviderKind,
        message: String,
    },

    /// Transport-level failure (timeout, connection reset, 5xx)
    #[error("{provider} network failure: {message}")]
    NetworkFailure {
        provider: ProviderKind,
        message: String,
    },

    /// Payload passed transport but failed validation
    #[error("invalid {provider} response: {message}")]
    InvalidResponse {
        provider: ProviderKind,
        message: String,
    },

    /// Collaborator supplied zero non-empty documents
    #[error("profile '{profile_id}' has no indexable data (skills, CV text, repositories, statements or reference letters)")]
    NoIndexableData { profile_id: String },

    /// Search or ask against an index holding zero documents
    #[error("index is empty: {0}")]
    IndexEmpty(String),

    /// Malformed input to the embedder
    #[error("embedding failed: {0}")]
    EmbeddingFailure(String),

    /// `VectorIndex::add` called with an empty list
    #[error("cannot add an empty document batch")]
    EmptyBatch,

    /// Embedding width differs from the index width
    #[error("embedding dimension mismatch: index has {expected}, got {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// Provider name not in the supported set
    #[error("unknown provider '{name}' (supported: {supported})")]
    UnknownProvider { name: String, supported: String },

    /// Caller deadline elapsed
    #[error("operation timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Configuration errors
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Query context added by the orchestrator around an underlying error
    #[error("question '{question}' on profile '{profile_id}' failed: {source}")]
    Query {
        profile_id: String,
        question: String,
        #[source]
        source: Box<RagError>,
    },
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, RagError>;

impl RagError {
    /// Taxonomy kind; context wrappers report the kind of what they wrap
    pub fn kind(&self) -> ErrorKind {
        match self {
            RagError::MissingCredential { .. } => ErrorKind::MissingCredential,
            RagError::RateLimited { .. } => ErrorKind::RateLimited,
            RagError::ContentBlocked { .. } => ErrorKind::ContentBlocked,
            RagError::NetworkFailure { .. } => ErrorKind::NetworkFailure,
            RagError::InvalidResponse { .. } => ErrorKind::InvalidResponse,
            RagError::NoIndexableData { .. } => ErrorKind::NoIndexableData,
            RagError::IndexEmpty(_) => ErrorKind::IndexEmpty,
            RagError::EmbeddingFailure(_) => ErrorKind::EmbeddingFailure,
            RagError::EmptyBatch => ErrorKind::EmptyBatch,
            RagError::DimensionMismatch { .. } => ErrorKind::DimensionMismatch,
            RagError::UnknownProvider { .. } => ErrorKind::UnknownProvider,
            RagError::Timeout { .. } => ErrorKind::Timeout,
            RagError::ConfigError(_) => ErrorKind::Config,
            RagError::IoError(_) => ErrorKind::Io,
            RagError::SerializationError(_) => ErrorKind::Serialization,
            RagError::Query { source, .. } => source.kind(),
        }
    }

    /// Innermost error, with any query context peeled off
    pub fn root(&self) -> &RagError {
        match self {
            RagError::Query { source, .. } => source.root(),
            other => other,
        }
    }

    /// Original underlying message without context prefixes
    pub fn root_message(&self) -> String {
        self.root().to_string()
    }

    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }

    /// Human-actionable guidance for the caller
    pub fn hint(&self) -> String {
        match self.root() {
            RagError::MissingCredential { provider, .. } => format!(
                "Set one of {} or pass an explicit {} key. Get a key at {}",
                provider.credential_env_names().join(", "),
                provider,
                provider.key_url()
            ),
            RagError::RateLimited { .. } => {
                "The provider is rate limiting requests; try again later or switch provider".to_string()
            }
            RagError::ContentBlocked { .. } => {
                "The provider's safety filter rejected this exchange; rephrase the question".to_string()
            }
            RagError::NetworkFailure { .. } => {
                "Check network connectivity and the provider status page, then retry".to_string()
            }
            RagError::InvalidResponse { .. } => {
                "The provider returned an unusable answer; retry or choose another model".to_string()
            }
            RagError::NoIndexableData { .. } => {
                "Supply at least one skill, CV text, repository, statement or reference letter".to_string()
            }
            RagError::IndexEmpty(_) => {
                "Index the profile's documents before asking questions".to_string()
            }
            RagError::EmbeddingFailure(_) => "Provide non-empty text".to_string(),
            RagError::EmptyBatch => "Pass at least one document".to_string(),
            RagError::DimensionMismatch { .. } => {
                "Use the same embedder for indexing and querying".to_string()
            }
            RagError::UnknownProvider { supported, .. } => {
                format!("Choose one of: {}", supported)
            }
            RagError::Timeout { .. } => {
                "Increase the deadline or retry when the provider is less busy".to_string()
            }
            RagError::ConfigError(_) => "Fix the configuration file and retry".to_string(),
            RagError::IoError(_) => "Check the file path and permissions".to_string(),
            RagError::SerializationError(_) => "Check the JSON input format".to_string(),
            RagError::Query { .. } => unreachable!("root() never returns a Query wrapper"),
        }
    }

    /// Kind, message and hint rendered for terminal output
    pub fn report(&self) -> String {
        format!("[{}] {}\nhint: {}", self.kind(), self, self.hint())
    }

    /// Wrap with query context, keeping kind and root intact
    pub fn with_query(self, profile_id: &str, question: &str) -> Self {
        RagError::Query {
            profile_id: profile_id.to_string(),
            question: question.to_string(),
            source: Box::new(self),
        }
    }
}
