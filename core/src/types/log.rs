use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::LOG_CAPACITY;

/// The three per-character log channels the chat listens to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LogChannel {
    Chat,
    Combat,
    Private,
}

impl LogChannel {
    pub const ALL: [LogChannel; 3] = [LogChannel::Chat, LogChannel::Combat, LogChannel::Private];
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogMessage {
    /// Monotonic per-log sequence number, used by readers as a cursor.
    pub id: u64,
    pub time: DateTime<Utc>,
    pub text: String,
    /// When set, `text` is a translation id rather than literal text.
    #[serde(default)]
    pub translated: bool,
}

/// Bounded message log. Old messages are dropped once capacity is reached;
/// message ids keep increasing so cursors stay valid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Log {
    #[serde(default)]
    messages: VecDeque<LogMessage>,
    #[serde(default = "first_id")]
    next_id: u64,
    #[serde(default = "default_capacity")]
    capacity: usize,
}

fn first_id() -> u64 {
    1
}

fn default_capacity() -> usize {
    LOG_CAPACITY
}

impl Default for Log {
    fn default() -> Self {
        Self::new(LOG_CAPACITY)
    }
}

impl Log {
    pub fn new(capacity: usize) -> Self {
        Self {
            messages: VecDeque::new(),
            next_id: first_id(),
            capacity: capacity.max(1),
        }
    }

    /// Appends literal text.
    pub fn add(&mut self, text: impl Into<String>) -> u64 {
        self.push(text.into(), false)
    }

    /// Appends a translation id to be resolved by the reader.
    pub fn add_translated(&mut self, text_id: impl Into<String>) -> u64 {
        self.push(text_id.into(), true)
    }

    fn push(&mut self, text: String, translated: bool) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        if self.messages.len() >= self.capacity {
            self.messages.pop_front();
        }
        self.messages.push_back(LogMessage {
            id,
            time: Utc::now(),
            text,
            translated,
        });
        id
    }

    /// Messages with an id greater than `cursor`, oldest first.
    pub fn since(&self, cursor: u64) -> impl Iterator<Item = &LogMessage> {
        self.messages.iter().filter(move |m| m.id > cursor)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogMessage> {
        self.messages.iter()
    }

    pub fn last(&self) -> Option<&LogMessage> {
        self.messages.back()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn since_returns_only_newer_messages() {
        let mut log = Log::default();
        let first = log.add("hello");
        log.add("world");
        let texts: Vec<_> = log.since(first).map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["world"]);
    }

    #[test]
    fn capacity_drops_oldest_but_keeps_ids_increasing() {
        let mut log = Log::new(2);
        log.add("a");
        log.add("b");
        let c = log.add("c");
        assert_eq!(log.len(), 2);
        assert_eq!(log.iter().next().map(|m| m.text.as_str()), Some("b"));
        assert_eq!(c, 3);
    }

    #[test]
    fn translated_flag_is_kept() {
        let mut log = Log::default();
        log.add_translated("tar_too_far");
        let last = log.last().unwrap();
        assert!(last.translated);
        assert_eq!(last.text, "tar_too_far");
    }
}
