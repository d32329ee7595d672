//! Bounded conversation history for one profile session
//!
//! Keeps the last N question/answer turns with FIFO eviction. History is tied
//! to the provider that produced it: recording a turn from a different
//! provider resets the window first.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;

use crate::providers::ProviderKind;
use crate::types::Document;

/// Default number of turns kept
pub const DEFAULT_HISTORY_TURNS: usize = 3;

/// One completed question/answer exchange
#[derive(Debug, Clone, Serialize)]
pub struct ConversationTurn {
    pub question: String,
    pub answer: String,
    pub evidence: Vec<Document>,
    pub provider: ProviderKind,
    pub asked_at: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn new(
        question: impl Into<String>,
        answer: impl Into<String>,
        evidence: Vec<Document>,
        provider: ProviderKind,
    ) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            evidence,
            provider,
            asked_at: Utc::now(),
        }
    }
}

/// Conversation window with FIFO eviction
#[derive(Debug, Clone)]
pub struct ConversationState {
    turns: VecDeque<ConversationTurn>,
    max_turns: usize,
    provider: Option<ProviderKind>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_TURNS)
    }

    pub fn with_capacity(max_turns: usize) -> Self {
        Self {
            turns: VecDeque::with_capacity(max_turns),
            max_turns,
            provider: None,
        }
    }

    /// Append a completed turn, evicting the oldest when full.
    ///
    /// A turn from a provider other than the active one clears the history
    /// before it is stored.
    pub fn record(&mut self, turn: ConversationTurn) {
        if self.switches_provider(turn.provider) {
            self.turns.clear();
        }
        self.provider = Some(turn.provider);

        if self.max_turns == 0 {
            return;
        }
        while self.turns.len() >= self.max_turns {
            self.turns.pop_front();
        }
        self.turns.push_back(turn);
    }

    /// True when asking `provider` would reset the history
    pub fn switches_provider(&self, provider: ProviderKind) -> bool {
        self.provider.map_or(false, |active| active != provider)
    }

    /// History a prompt for `provider` may use: empty on a provider switch
    pub fn history_for(&self, provider: ProviderKind) -> Vec<&ConversationTurn> {
        if self.switches_provider(provider) {
            Vec::new()
        } else {
            self.turns.iter().collect()
        }
    }

    pub fn turns(&self) -> &VecDeque<ConversationTurn> {
        &self.turns
    }

    pub fn active_provider(&self) -> Option<ProviderKind> {
        self.provider
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max_turns
    }

    /// Forget every turn and the active provider
    pub fn reset(&mut self) {
        self.turns.clear();
        self.provider = None;
    }
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(i: usize, provider: ProviderKind) -> ConversationTurn {
        ConversationTurn::new(format!("q{}", i), format!("a{}", i), Vec::new(), provider)
    }

    #[test]
    fn test_window_evicts_oldest() {
        let mut state = ConversationState::with_capacity(3);
        for i in 0..4 {
            state.record(turn(i, ProviderKind::Gemini));
        }

        assert_eq!(state.len(), 3);
        assert!(state.turns().iter().all(|t| t.question != "q0"));
        assert_eq!(state.turns().front().unwrap().question, "q1");
        assert_eq!(state.turns().back().unwrap().question, "q3");
    }

    #[test]
    fn test_provider_switch_resets() {
        let mut state = ConversationState::new();
        state.record(turn(0, ProviderKind::Gemini));
        state.record(turn(1, ProviderKind::Gemini));

        assert!(state.switches_provider(ProviderKind::OpenAi));
        assert!(state.history_for(ProviderKind::OpenAi).is_empty());
        assert_eq!(state.history_for(ProviderKind::Gemini).len(), 2);

        state.record(turn(2, ProviderKind::OpenAi));
        assert_eq!(state.len(), 1);
        assert_eq!(state.active_provider(), Some(ProviderKind::OpenAi));
    }

    #[test]
    fn test_first_turn_is_not_a_switch() {
        let state = ConversationState::new();
        assert!(!state.switches_provider(ProviderKind::Anthropic));
    }

    #[test]
    fn test_reset() {
        let mut state = ConversationState::new();
        state.record(turn(0, ProviderKind::Gemini));
        state.reset();
        assert!(state.is_empty());
        assert!(state.active_provider().is_none());
    }

    #[test]
    fn test_zero_capacity_keeps_nothing() {
        let mut state = ConversationState::with_capacity(0);
        state.record(turn(0, ProviderKind::Gemini));
        assert!(state.is_empty());
    }
}
