//! Type definitions module
//!
//! Documents flowing in from the profile-building layer and query results
//! flowing out to the UI/CLI layer.

pub mod document;
pub mod query;

// Re-export commonly used types
pub use document::{Document, DocumentInput, DocumentMetadata, ProfileInput, SourceKind};
pub use query::QueryResult;
