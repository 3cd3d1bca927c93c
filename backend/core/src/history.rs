//! Size-bounded conversation history for one session.

use serde::{Deserialize, Serialize};

use crate::types::{Role, Turn};

/// Number of turns kept as model context.
pub const MAX_HISTORY_TURNS: usize = 10;

/// Ordered user/assistant turns, newest last, never longer than
/// [`MAX_HISTORY_TURNS`]. System turns are never stored here; the system
/// prompt is injected when a request is composed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    turns: Vec<Turn>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from arbitrary turns, dropping system turns and keeping the newest ten.
    pub fn from_turns(turns: impl IntoIterator<Item = Turn>) -> Self {
        let mut history = Self {
            turns: turns.into_iter().filter(|t| t.role() != Role::System).collect(),
        };
        history.truncate();
        history
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.push(Turn::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.push(Turn::assistant(content));
    }

    fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
        self.truncate();
    }

    fn truncate(&mut self) {
        if self.turns.len() > MAX_HISTORY_TURNS {
            let excess = self.turns.len() - MAX_HISTORY_TURNS;
            self.turns.drain(..excess);
        }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_newest_ten_turns() {
        let mut history = History::new();
        for i in 0..25 {
            history.push_user(format!("u{i}"));
            assert!(history.len() <= MAX_HISTORY_TURNS);
        }
        assert_eq!(history.len(), MAX_HISTORY_TURNS);
        assert_eq!(history.turns()[0].content(), "u15");
        assert_eq!(history.last().unwrap().content(), "u24");
    }

    #[test]
    fn preserves_insertion_order() {
        let mut history = History::new();
        history.push_user("a");
        history.push_assistant("b");
        history.push_user("c");
        let contents: Vec<_> = history.turns().iter().map(Turn::content).collect();
        assert_eq!(contents, ["a", "b", "c"]);
        assert_eq!(history.turns()[1].role(), Role::Assistant);
    }

    #[test]
    fn eleven_exchanges_keep_last_five_pairs() {
        let mut history = History::new();
        for i in 0..11 {
            history.push_user(format!("q{i}"));
            history.push_assistant(format!("a{i}"));
        }
        assert_eq!(history.len(), 10);
        assert_eq!(history.turns()[0], Turn::user("q6"));
        assert_eq!(history.turns()[9], Turn::assistant("a10"));
    }

    #[test]
    fn from_turns_drops_system_and_truncates() {
        let mut turns = vec![Turn::system("be nice")];
        turns.extend((0..12).map(|i| Turn::user(i.to_string())));
        let history = History::from_turns(turns);
        assert_eq!(history.len(), 10);
        assert!(history.turns().iter().all(|t| t.role() != Role::System));
        assert_eq!(history.turns()[0].content(), "2");
    }

    #[test]
    fn serializes_as_plain_array() {
        let mut history = History::new();
        history.push_user("Hello");
        let json = serde_json::to_string(&history).unwrap();
        assert_eq!(json, r#"[{"role":"user","content":"Hello"}]"#);
    }
}
