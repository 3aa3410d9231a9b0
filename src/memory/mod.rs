//! Memory module - short-lived conversational context
//!
//! Memory is a plain FIFO window over recent messages. Nothing is persisted
//! and nothing is ranked: the oldest message is always the first to go.

use std::collections::VecDeque;

use crate::agent::Message;

/// Default number of messages kept per agent.
pub const DEFAULT_WINDOW: usize = 20;

/// Bounded FIFO buffer of recent messages.
#[derive(Debug, Clone)]
pub struct ShortTermMemory {
    max_messages: usize,
    buf: VecDeque<Message>,
}

impl ShortTermMemory {
    pub fn new(max_messages: usize) -> Self {
        Self {
            max_messages,
            buf: VecDeque::with_capacity(max_messages.min(256)),
        }
    }

    /// Append a message, evicting the oldest entries beyond the window.
    pub fn add(&mut self, msg: Message) {
        self.buf.push_back(msg);
        while self.buf.len() > self.max_messages {
            self.buf.pop_front();
        }
    }

    /// Snapshot of the current window, oldest first.
    pub fn context(&self) -> Vec<Message> {
        self.buf.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max_messages
    }
}

impl Default for ShortTermMemory {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_most_recent_in_order() {
        let mut mem = ShortTermMemory::new(3);
        for i in 0..7 {
            mem.add(Message::user(format!("m{}", i)));
        }

        let ctx = mem.context();
        let contents: Vec<&str> = ctx.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["m4", "m5", "m6"]);
    }

    #[test]
    fn test_under_capacity_keeps_everything() {
        let mut mem = ShortTermMemory::default();
        mem.add(Message::user("q"));
        mem.add(Message::assistant("a"));

        assert_eq!(mem.len(), 2);
        assert_eq!(mem.context(), vec![Message::user("q"), Message::assistant("a")]);
    }

    #[test]
    fn test_context_is_a_copy() {
        let mut mem = ShortTermMemory::new(5);
        mem.add(Message::user("original"));

        let mut snapshot = mem.context();
        snapshot.push(Message::user("injected"));
        snapshot[0].content = "changed".to_string();

        assert_eq!(mem.context(), vec![Message::user("original")]);
    }

    #[test]
    fn test_zero_window_stays_empty() {
        let mut mem = ShortTermMemory::new(0);
        mem.add(Message::user("gone"));
        assert!(mem.is_empty());
    }
}
