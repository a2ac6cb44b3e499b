//! Counter-debounced event memory.
//!
//! Each FAILED report moves the event counter one step toward
//! [`FAIL_THRESHOLD`], each PASSED report one step toward [`PASS_THRESHOLD`].
//! An event is confirmed while its counter sits at the fail threshold.

use bitflags::bitflags;
use zone_common::zone::diag::{DiagEventId, EventStatus};

use super::sink::DiagnosticSink;

pub const FAIL_THRESHOLD: i8 = 3;
pub const PASS_THRESHOLD: i8 = -3;

bitflags! {
    /// Per-event status byte.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EventStatusBits: u8 {
        /// Last test result was a failure (cleared once healed).
        const TEST_FAILED = 0x01;
        /// Failed at least once since the last clear.
        const PENDING     = 0x04;
        /// Counter reached the fail threshold since the last clear.
        const CONFIRMED   = 0x08;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct EventRecord {
    counter: i8,
    status: EventStatusBits,
    occurrences: u32,
}

/// Fixed-size store, one record per [`DiagEventId`].
#[derive(Debug, Clone)]
pub struct EventMemory {
    events: [EventRecord; DiagEventId::COUNT],
}

impl Default for EventMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl EventMemory {
    pub const fn new() -> Self {
        Self {
            events: [EventRecord {
                counter: 0,
                status: EventStatusBits::empty(),
                occurrences: 0,
            }; DiagEventId::COUNT],
        }
    }

    pub fn status(&self, event: DiagEventId) -> EventStatusBits {
        self.events[event.index()].status
    }

    pub fn occurrences(&self, event: DiagEventId) -> u32 {
        self.events[event.index()].occurrences
    }

    pub fn is_confirmed(&self, event: DiagEventId) -> bool {
        self.status(event).contains(EventStatusBits::CONFIRMED)
    }

    /// Number of events currently holding a confirmed DTC.
    pub fn confirmed_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| e.status.contains(EventStatusBits::CONFIRMED))
            .count()
    }

    pub fn clear_all(&mut self) {
        *self = Self::new();
    }
}

impl DiagnosticSink for EventMemory {
    fn report(&mut self, event: DiagEventId, status: EventStatus) {
        let ev = &mut self.events[event.index()];
        match status {
            EventStatus::Failed => {
                if ev.counter < FAIL_THRESHOLD {
                    ev.counter += 1;
                }
                ev.status |= EventStatusBits::TEST_FAILED | EventStatusBits::PENDING;
                if ev.counter >= FAIL_THRESHOLD {
                    ev.status |= EventStatusBits::CONFIRMED;
                    ev.occurrences = ev.occurrences.saturating_add(1);
                }
            }
            EventStatus::Passed => {
                if ev.counter > PASS_THRESHOLD {
                    ev.counter -= 1;
                }
                if ev.counter <= 0 {
                    ev.status.remove(EventStatusBits::TEST_FAILED);
                }
            }
        }
    }
}
