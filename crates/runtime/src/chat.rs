//! Chat and combat log sinks.
//!
//! The session posts every human-readable log line and every table message
//! to a [`ChatSink`]. What happens next (a UI pane, a file, the event bus)
//! is up to the sink.

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use tabletop_core::EntityId;

use crate::events::{Event, EventBus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatKind {
    /// Engine log line.
    Log,
    Say,
    Whisper { to: EntityId },
    Dice,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEntry {
    pub speaker: Option<String>,
    pub text: String,
    pub kind: ChatKind,
}

impl ChatEntry {
    pub fn log(text: impl Into<String>) -> Self {
        Self {
            speaker: None,
            text: text.into(),
            kind: ChatKind::Log,
        }
    }

    pub fn said_by(speaker: impl Into<String>, text: impl Into<String>, kind: ChatKind) -> Self {
        Self {
            speaker: Some(speaker.into()),
            text: text.into(),
            kind,
        }
    }
}

pub trait ChatSink: Send {
    fn post(&mut self, entry: ChatEntry);
}

/// In-memory log. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct ChatLog {
    entries: Arc<Mutex<Vec<ChatEntry>>>,
}

impl ChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<ChatEntry> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.entries().into_iter().map(|entry| entry.text).collect()
    }
}

impl ChatSink for ChatLog {
    fn post(&mut self, entry: ChatEntry) {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).push(entry);
    }
}

/// Forwards entries to the `Chat` topic of an [`EventBus`].
pub struct BusChatSink {
    bus: EventBus,
}

impl BusChatSink {
    pub fn new(bus: EventBus) -> Self {
        Self { bus }
    }
}

impl ChatSink for BusChatSink {
    fn post(&mut self, entry: ChatEntry) {
        self.bus.publish(Event::Chat(entry));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Topic;

    #[test]
    fn log_clones_share_entries() {
        let log = ChatLog::new();
        let mut writer = log.clone();
        writer.post(ChatEntry::log("Wolf moves 15 ft"));
        writer.post(ChatEntry::said_by("Brannoc", "Hold the line", ChatKind::Say));
        assert_eq!(log.texts(), ["Wolf moves 15 ft", "Hold the line"]);
    }

    #[tokio::test]
    async fn bus_sink_publishes_on_chat_topic() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe(Topic::Chat);
        BusChatSink::new(bus.clone()).post(ChatEntry::log("Round 2"));
        match rx.recv().await.unwrap() {
            Event::Chat(entry) => assert_eq!(entry.text, "Round 2"),
            other => panic!("unexpected event {other:?}"),
        }
    }
}
