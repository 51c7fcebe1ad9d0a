//! Event tracing for debugging tilecore.
//!
//! Provides a ring buffer of recent events and state transitions so the
//! harness (or a human on the other end of the channel) can reconstruct
//! what happened without scrolling logs.

use std::collections::VecDeque;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::state::StateTransition;
use crate::types::WindowId;

/// Maximum number of events to keep in the trace buffer
const DEFAULT_MAX_ENTRIES: usize = 1000;

/// One entry in the trace buffer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub sequence: u64,
    pub timestamp_ms: u64,
    pub event_type: String,
    pub window: Option<WindowId>,
    pub details: String,
}

/// Event tracer with ring buffer storage
pub struct EventTracer {
    entries: VecDeque<EventLogEntry>,
    max_entries: usize,
    sequence: u64,
    start_time: Instant,
}

impl EventTracer {
    /// Create a new event tracer with default capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_ENTRIES)
    }

    /// Create a new event tracer with specified capacity
    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_entries),
            max_entries,
            sequence: 0,
            start_time: Instant::now(),
        }
    }

    /// Get the current timestamp in milliseconds since tracer start
    fn timestamp(&self) -> u64 {
        self.start_time.elapsed().as_millis() as u64
    }

    /// Trace a raw compositor event
    pub fn trace_event(&mut self, event_type: &str, window: Option<WindowId>, details: &str) {
        self.add_entry(event_type.to_string(), window, details.to_string());
    }

    /// Trace a state transition
    pub fn trace_transition(&mut self, transition: &StateTransition) {
        let (event_type, window, details) = match transition {
            StateTransition::WindowManaged { window, group, floating } => (
                "window_managed".to_string(),
                Some(*window),
                format!("group={} floating={}", group, floating),
            ),
            StateTransition::WindowUnmanaged { window, reason } => (
                "window_unmanaged".to_string(),
                Some(*window),
                format!("reason={:?}", reason),
            ),
            StateTransition::FocusChanged { from, to } => {
                ("focus_changed".to_string(), *to, format!("from={:?}", from))
            }
            StateTransition::WindowMoved { window, from_group, to_group } => (
                "window_moved".to_string(),
                Some(*window),
                format!("from={} to={}", from_group, to_group),
            ),
            StateTransition::GroupDisplayed { group } => {
                ("group_displayed".to_string(), None, format!("group={}", group))
            }
            StateTransition::LayoutChanged { group, layout } => (
                "layout_changed".to_string(),
                None,
                format!("group={} layout={}", group, layout),
            ),
            StateTransition::ChordEntered { name } => {
                ("chord_entered".to_string(), None, format!("name={}", name))
            }
            StateTransition::ChordExited => ("chord_exited".to_string(), None, String::new()),
            StateTransition::ConfigReloaded => {
                ("config_reloaded".to_string(), None, String::new())
            }
        };
        self.add_entry(event_type, window, details);
    }

    /// Add an entry to the trace buffer
    fn add_entry(&mut self, event_type: String, window: Option<WindowId>, details: String) {
        // Remove oldest entry if at capacity
        if self.entries.len() >= self.max_entries {
            self.entries.pop_front();
        }

        self.sequence += 1;
        self.entries.push_back(EventLogEntry {
            sequence: self.sequence,
            timestamp_ms: self.timestamp(),
            event_type,
            window,
            details,
        });
    }

    /// Get the last N entries
    pub fn get_last(&self, n: usize) -> Vec<EventLogEntry> {
        let start = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(start).cloned().collect()
    }

    /// Get all entries
    pub fn get_all(&self) -> Vec<EventLogEntry> {
        self.entries.iter().cloned().collect()
    }

    /// Clear the trace buffer
    pub fn clear(&mut self) {
        self.entries.clear();
        self.sequence = 0;
    }

    /// Get the number of entries in the buffer
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for EventTracer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_event() {
        let mut tracer = EventTracer::new();
        tracer.trace_event("window_mapped", Some(12345), "class=kitty");

        let entries = tracer.get_all();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].event_type, "window_mapped");
        assert_eq!(entries[0].window, Some(12345));
    }

    #[test]
    fn test_ring_buffer_overflow() {
        let mut tracer = EventTracer::with_capacity(3);

        tracer.trace_event("event1", None, "");
        tracer.trace_event("event2", None, "");
        tracer.trace_event("event3", None, "");
        tracer.trace_event("event4", None, "");

        let entries = tracer.get_all();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].event_type, "event2");
        assert_eq!(entries[2].event_type, "event4");
    }

    #[test]
    fn test_get_last() {
        let mut tracer = EventTracer::new();

        for i in 0..10 {
            tracer.trace_event(&format!("event{}", i), None, "");
        }

        let last_3 = tracer.get_last(3);
        assert_eq!(last_3.len(), 3);
        assert_eq!(last_3[0].event_type, "event7");
        assert_eq!(last_3[2].event_type, "event9");
    }

    #[test]
    fn test_sequence_numbers() {
        let mut tracer = EventTracer::new();

        tracer.trace_event("a", None, "");
        tracer.trace_event("b", None, "");
        tracer.trace_event("c", None, "");

        let entries = tracer.get_all();
        assert_eq!(entries[0].sequence, 1);
        assert_eq!(entries[1].sequence, 2);
        assert_eq!(entries[2].sequence, 3);
    }

    #[test]
    fn test_trace_transition_formats_details() {
        let mut tracer = EventTracer::new();
        tracer.trace_transition(&StateTransition::WindowMoved {
            window: 7,
            from_group: "1".to_string(),
            to_group: "5".to_string(),
        });
        let entries = tracer.get_all();
        assert_eq!(entries[0].event_type, "window_moved");
        assert_eq!(entries[0].details, "from=1 to=5");
    }
}
