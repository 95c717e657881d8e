//! Bounded conversation state.
//!
//! Turns are append-only; nothing is ever dropped from storage. The window
//! limit is applied when the history is formatted into a prompt (see
//! [`crate::assemble`]), keeping the stored record complete for the session.

use crate::models::ConversationTurn;

/// Ordered question/answer history for one engine instance.
#[derive(Debug, Default)]
pub struct History {
    turns: Vec<ConversationTurn>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed exchange.
    pub fn push(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.turns.push(ConversationTurn {
            question: question.into(),
            answer: answer.into(),
        });
    }

    /// Forget every turn.
    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    /// The most recent `n` turns, oldest first.
    pub fn recent(&self, n: usize) -> &[ConversationTurn] {
        let start = self.turns.len().saturating_sub(n);
        &self.turns[start..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recent_returns_last_n_in_order() {
        let mut history = History::new();
        for i in 0..7 {
            history.push(format!("q{}", i), format!("a{}", i));
        }
        let recent = history.recent(5);
        assert_eq!(recent.len(), 5);
        assert_eq!(recent[0].question, "q2");
        assert_eq!(recent[4].question, "q6");
    }

    #[test]
    fn recent_handles_short_history() {
        let mut history = History::new();
        history.push("q0", "a0");
        assert_eq!(history.recent(5).len(), 1);
        assert_eq!(History::new().recent(5).len(), 0);
    }

    #[test]
    fn clear_empties() {
        let mut history = History::new();
        history.push("q", "a");
        history.clear();
        assert!(history.is_empty());
    }
}
