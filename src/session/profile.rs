// Profile session: index snapshot + conversation behind async locks
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard, RwLock};
use uuid::Uuid;

use super::ConversationState;
use crate::index::{IndexStats, VectorIndex};
use crate::providers::ProviderKind;

/// An immutable, fully built index together with the profile summary
pub struct IndexedProfile {
    pub index: Arc<VectorIndex>,
    pub summary: Option<String>,
}

/// Snapshot of a session for display
#[derive(Debug, Clone, Serialize)]
pub struct SessionStats {
    pub profile_id: String,
    pub session_id: Uuid,
    pub index: Option<IndexStats>,
    pub conversation_turns: usize,
    pub active_provider: Option<ProviderKind>,
}

pub struct ProfileSession {
    id: Uuid,
    profile_id: String,
    snapshot: RwLock<Option<Arc<IndexedProfile>>>,
    conversation: Mutex<ConversationState>,
}

impl ProfileSession {
    pub fn new(profile_id: impl Into<String>, history_turns: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            profile_id: profile_id.into(),
            snapshot: RwLock::new(None),
            conversation: Mutex::new(ConversationState::with_capacity(history_turns)),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn profile_id(&self) -> &str {
        &self.profile_id
    }

    /// Replace the index snapshot; readers holding the old one keep it
    pub async fn install(&self, profile: IndexedProfile) {
        *self.snapshot.write().await = Some(Arc::new(profile));
    }

    /// Current snapshot, if the profile has been indexed
    pub async fn snapshot(&self) -> Option<Arc<IndexedProfile>> {
        self.snapshot.read().await.clone()
    }

    /// Exclusive access to the conversation for the length of one ask
    pub async fn lock_conversation(&self) -> MutexGuard<'_, ConversationState> {
        self.conversation.lock().await
    }

    pub async fn reset_conversation(&self) {
        self.conversation.lock().await.reset();
    }

    pub async fn stats(&self) -> SessionStats {
        let index = self.snapshot().await.map(|s| s.index.stats());
        let conversation = self.conversation.lock().await;
        SessionStats {
            profile_id: self.profile_id.clone(),
            session_id: self.id,
            index,
            conversation_turns: conversation.len(),
            active_provider: conversation.active_provider(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashingEmbedder;
    use crate::session::ConversationTurn;

    #[tokio::test]
    async fn test_install_swaps_snapshot() {
        let session = ProfileSession::new("cand-1", 3);
        assert!(session.snapshot().await.is_none());

        let embedder = Arc::new(HashingEmbedder::default());
        session
            .install(IndexedProfile {
                index: Arc::new(VectorIndex::new(embedder.clone())),
                summary: None,
            })
            .await;
        let old = session.snapshot().await.unwrap();

        session
            .install(IndexedProfile {
                index: Arc::new(VectorIndex::new(embedder)),
                summary: Some("new".to_string()),
            })
            .await;
        let new = session.snapshot().await.unwrap();

        assert!(old.summary.is_none());
        assert_eq!(new.summary.as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_stats_and_reset() {
        let session = ProfileSession::new("cand-2", 3);
        session.lock_conversation().await.record(ConversationTurn::new(
            "q",
            "a",
            Vec::new(),
            ProviderKind::OpenAi,
        ));

        let stats = session.stats().await;
        assert_eq!(stats.profile_id, "cand-2");
        assert_eq!(stats.conversation_turns, 1);
        assert_eq!(stats.active_provider, Some(ProviderKind::OpenAi));
        assert!(stats.index.is_none());

        session.reset_conversation().await;
        assert_eq!(session.stats().await.conversation_turns, 0);
    }
}
