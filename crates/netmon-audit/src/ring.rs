//! Bounded in-memory audit buffer.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use netmon_core::AuditEvent;

/// Default number of events kept in memory.
pub const DEFAULT_MAX_EVENTS: usize = 100;

/// FIFO ring of the most recent audit events.
///
/// Append and eviction happen under one lock, so the buffer never holds
/// more than `capacity` events even with concurrent writers.
#[derive(Debug)]
pub struct AuditRing {
    capacity: usize,
    events: Mutex<VecDeque<AuditEvent>>,
}

impl AuditRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            events: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append an event, evicting the oldest ones past capacity.
    pub fn push(&self, event: AuditEvent) {
        if self.capacity == 0 {
            return;
        }
        let mut events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        while events.len() >= self.capacity {
            events.pop_front();
        }
        events.push_back(event);
    }

    /// All buffered events, newest first.
    pub fn newest_first(&self) -> Vec<AuditEvent> {
        let events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        events.iter().rev().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for AuditRing {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_EVENTS)
    }
}
