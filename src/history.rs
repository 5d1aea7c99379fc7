//! Chat history: the ordered (question, answer) log a session owns.

use serde::{Deserialize, Serialize};

/// One completed exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub question: String,
    pub answer: String,
}

impl ChatTurn {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// Insertion-ordered log of chat turns.
///
/// Grows only through [`ChatHistory::push`] and shrinks only through
/// [`ChatHistory::clear`]. Windowing is a read operation and never
/// mutates the log.
#[derive(Debug, Clone, Default)]
pub struct ChatHistory {
    turns: Vec<ChatTurn>,
}

impl ChatHistory {
    /// A fresh, empty log. Each session owns its own; there is no
    /// shared default.
    pub fn new() -> Self {
        Self { turns: Vec::new() }
    }

    /// Wrap turns carried over from an earlier session.
    pub fn from_turns(turns: Vec<ChatTurn>) -> Self {
        Self { turns }
    }

    pub fn push(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.turns.push(ChatTurn::new(question, answer));
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn to_vec(&self) -> Vec<ChatTurn> {
        self.turns.clone()
    }

    /// The most recent `n` turns in chronological order.
    ///
    /// `n = 0` yields an empty slice; `n` past the current length
    /// yields everything recorded so far.
    pub fn window(&self, n: usize) -> &[ChatTurn] {
        let start = self.turns.len().saturating_sub(n);
        &self.turns[start..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(n: usize) -> ChatHistory {
        let mut history = ChatHistory::new();
        for i in 0..n {
            history.push(format!("q{i}"), format!("a{i}"));
        }
        history
    }

    #[test]
    fn push_keeps_insertion_order() {
        let history = filled(3);
        let questions: Vec<&str> = history.turns().iter().map(|t| t.question.as_str()).collect();
        assert_eq!(questions, vec!["q0", "q1", "q2"]);
    }

    #[test]
    fn window_zero_is_empty() {
        let history = filled(4);
        assert!(history.window(0).is_empty());
    }

    #[test]
    fn window_takes_suffix_in_order() {
        let history = filled(5);
        let window = history.window(2);
        assert_eq!(window.len(), 2);
        assert_eq!(window[0].question, "q3");
        assert_eq!(window[1].question, "q4");
    }

    #[test]
    fn window_equal_to_log_returns_everything() {
        let history = filled(3);
        let window = history.window(3);
        assert_eq!(window.len(), 3);
        assert_eq!(window[0].question, "q0");
        assert_eq!(window[2].question, "q2");
    }

    #[test]
    fn window_larger_than_log_returns_everything() {
        let history = filled(2);
        assert_eq!(history.window(10).len(), 2);
    }

    #[test]
    fn clear_empties_and_is_idempotent() {
        let mut history = filled(3);
        history.clear();
        assert!(history.is_empty());
        history.clear();
        assert!(history.is_empty());
    }
}
