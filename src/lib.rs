//! profilerag - evidence-cited answers about candidate profiles
//!
//! Indexes the fragments of one candidate profile (skills, CV chunks,
//! repositories, statements, reference letters) and answers employer
//! questions from the most similar fragments through a hosted language
//! model, citing the evidence it used.
//!
//! # Architecture
//!
//! - **Embedding + index**: text to unit vectors, cosine top-k search
//! - **Providers**: Gemini, OpenAI and Anthropic clients behind one trait,
//!   with credential resolution and retry
//! - **Sessions**: per-profile index snapshot and bounded conversation
//! - **RAG**: prompt assembly, citation parsing and the answer engine

// Core types
pub mod errors;
pub mod types;

// Retrieval
pub mod embedding;
pub mod index;

// Generation back-ends
pub mod providers;

// Per-profile state and the answering pipeline
pub mod session;
pub mod rag;

// Ambient: configuration, logging, command line
pub mod config;
pub mod logging;
pub mod cli;

// Re-export commonly used types
pub use config::Config;
pub use errors::{ErrorKind, RagError, Result};
pub use providers::{ProviderClient, ProviderKind, ProviderRegistry};
pub use rag::AnswerEngine;
pub use types::{Document, DocumentInput, ProfileInput, QueryResult, SourceKind};
