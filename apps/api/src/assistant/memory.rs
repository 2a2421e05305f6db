//! Conversation Memory — bounded FIFO log of recent turns for one session.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Maximum number of turns retained per session.
pub const MEMORY_CAPACITY: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub is_user: bool,
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            is_user: true,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            is_user: false,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConversationMemory {
    turns: VecDeque<ConversationTurn>,
    capacity: usize,
}

impl Default for ConversationMemory {
    fn default() -> Self {
        Self::with_capacity(MEMORY_CAPACITY)
    }
}

impl ConversationMemory {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            turns: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Appends a turn, evicting the oldest ones once over capacity.
    pub fn append(&mut self, turn: ConversationTurn) {
        self.turns.push_back(turn);
        while self.turns.len() > self.capacity {
            self.turns.pop_front();
        }
    }

    /// The last `n` turns, oldest first.
    pub fn recent(&self, n: usize) -> Vec<ConversationTurn> {
        let skip = self.turns.len().saturating_sub(n);
        self.turns.iter().skip(skip).cloned().collect()
    }

    #[cfg(test)]
    pub fn last(&self) -> Option<&ConversationTurn> {
        self.turns.back()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
