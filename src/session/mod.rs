// Per-profile sessions
//
// A session owns one profile's current index snapshot and its conversation
// state. Asks against the same session are serialized; different sessions
// run independently.
//
// Components:
// - Conversation: bounded question/answer history
// - Profile session: index snapshot swap and the ask lock

pub mod conversation;
pub mod profile;

// Re-export key types
pub use conversation::{ConversationState, ConversationTurn, DEFAULT_HISTORY_TURNS};
pub use profile::{IndexedProfile, ProfileSession, SessionStats};
