//! Operator-facing event log.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventLevel {
    Info,
    Success,
    Warn,
    Error,
}

impl EventLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            EventLevel::Info => "info",
            EventLevel::Success => "success",
            EventLevel::Warn => "warning",
            EventLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub level: EventLevel,
    pub message: String,
    pub timestamp: i64,
}

impl Event {
    pub fn at(level: EventLevel, message: impl Into<String>, timestamp: i64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            level,
            message: message.into(),
            timestamp,
        }
    }
}

/// Bounded log, newest first.
#[derive(Debug, Clone, PartialEq)]
pub struct EventBus {
    events: VecDeque<Event>,
    capacity: usize,
}

impl EventBus {
    pub const DEFAULT_CAPACITY: usize = 50;

    pub fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Restore from a newest-first list.
    pub fn from_events(events: Vec<Event>, capacity: usize) -> Self {
        let mut bus = Self::new(capacity);
        bus.events = events.into_iter().take(bus.capacity).collect();
        bus
    }

    pub fn push(&mut self, event: Event) {
        self.events.push_front(event);
        self.events.truncate(self.capacity);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    pub fn latest(&self) -> Option<&Event> {
        self.events.front()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn to_vec(&self) -> Vec<Event> {
        self.events.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_newest_first_and_caps() {
        let mut bus = EventBus::new(3);
        for i in 0..5 {
            bus.push(Event::at(EventLevel::Info, format!("event {i}"), i));
        }
        let messages: Vec<&str> = bus.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["event 4", "event 3", "event 2"]);
    }

    #[test]
    fn event_ids_are_unique() {
        let a = Event::at(EventLevel::Warn, "a", 10);
        let b = Event::at(EventLevel::Warn, "a", 10);
        assert_ne!(a.id, b.id);
    }
}
