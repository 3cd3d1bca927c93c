//! One chat exchange in flight.
//!
//! History is threaded explicitly: it goes in through [`PendingTurn::prepare`]
//! and comes back out of [`PendingTurn::complete`].

use chatrelay_core::{ChatError, History, Turn};

/// Final message list: system prompt first, then the history.
pub fn compose(system_prompt: &str, history: &History) -> Vec<Turn> {
    std::iter::once(Turn::system(system_prompt))
        .chain(history.turns().iter().cloned())
        .collect()
}

#[derive(Debug, Clone)]
pub struct PendingTurn {
    history: History,
    messages: Vec<Turn>,
}

impl PendingTurn {
    /// Reject missing or empty messages. Whitespace is content.
    pub fn validate(message: &str) -> Result<&str, ChatError> {
        if message.is_empty() {
            Err(ChatError::EmptyMessage)
        } else {
            Ok(message)
        }
    }

    /// Append the user turn (truncating to the newest ten) and compose the request.
    pub fn prepare(
        mut history: History,
        message: &str,
        system_prompt: &str,
    ) -> Result<Self, ChatError> {
        let message = Self::validate(message)?;
        history.push_user(message);
        let messages = compose(system_prompt, &history);
        Ok(Self { history, messages })
    }

    /// History including the new user turn.
    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn messages(&self) -> &[Turn] {
        &self.messages
    }

    /// History to persist after the completion finished normally.
    pub fn complete(self, full_response: impl Into<String>) -> History {
        let mut history = self.history;
        history.push_assistant(full_response);
        history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatrelay_core::{Role, MAX_HISTORY_TURNS};

    #[test]
    fn rejects_only_empty_messages() {
        assert!(matches!(
            PendingTurn::prepare(History::new(), "", "sys"),
            Err(ChatError::EmptyMessage)
        ));
        assert_eq!(PendingTurn::validate(" ").unwrap(), " ");

        let pending = PendingTurn::prepare(History::new(), " \n", "sys").unwrap();
        assert_eq!(pending.messages()[1], Turn::user(" \n"));
    }

    #[test]
    fn composes_system_prompt_then_history() {
        let mut history = History::new();
        history.push_user("earlier");
        history.push_assistant("reply");

        let pending = PendingTurn::prepare(history, "Hello", "sys").unwrap();
        let messages = pending.messages();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0], Turn::system("sys"));
        assert_eq!(messages[3], Turn::user("Hello"));
        assert!(pending.history().turns().iter().all(|t| t.role() != Role::System));
    }

    #[test]
    fn truncates_before_composing() {
        let mut history = History::new();
        for i in 0..MAX_HISTORY_TURNS {
            history.push_user(format!("m{i}"));
        }
        let pending = PendingTurn::prepare(history, "newest", "sys").unwrap();
        assert_eq!(pending.history().len(), MAX_HISTORY_TURNS);
        assert_eq!(pending.messages().len(), MAX_HISTORY_TURNS + 1);
        assert_eq!(pending.messages()[1].content(), "m1");
    }

    #[test]
    fn complete_appends_assistant_turn() {
        let pending = PendingTurn::prepare(History::new(), "Hello", "sys").unwrap();
        let history = pending.complete("Hi there!");
        assert_eq!(
            history.turns(),
            &[Turn::user("Hello"), Turn::assistant("Hi there!")]
        );
    }
}
