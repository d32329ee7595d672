// Retrieval-augmented answering
//
// Turns a candidate profile into an index, then answers employer questions
// from retrieved evidence through a language-model provider.
//
// Components:
// - Ingest: collaborator inputs to documents (chunking, deterministic ids)
// - Prompt: system prompt and user prompt assembly
// - Citations: evidence markers parsed from answers
// - Orchestrator: the per-question pipeline
// - Engine: sessions, indexing and deadlines

pub mod citations;
pub mod engine;
pub mod ingest;
pub mod orchestrator;
pub mod prompt;

// Re-export key types
pub use engine::AnswerEngine;
pub use orchestrator::RagOrchestrator;
pub use prompt::{PromptBuilder, SYSTEM_PROMPT};
