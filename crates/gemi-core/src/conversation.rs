//! In-memory conversation transcript.

use gemi_types::Turn;

/// Ordered user/model turn pairs for multi-turn context.
///
/// Turns are only ever appended as a user turn followed by a model turn, so the
/// transcript always alternates and starts with the user. It is never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one completed exchange
    pub fn push_exchange(&mut self, user: impl Into<String>, model: impl Into<String>) {
        self.turns.push(Turn::user(user));
        self.turns.push(Turn::model(model));
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    #[must_use]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Number of user/model exchanges
    #[must_use]
    pub fn exchanges(&self) -> usize {
        self.turns.len() / 2
    }
}
