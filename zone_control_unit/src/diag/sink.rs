//! Diagnostic sink trait and the stock implementations.

use heapless::Deque;
use zone_common::zone::diag::{DiagEventId, EventStatus};

/// Receiver of diagnostic event reports.
pub trait DiagnosticSink {
    fn report(&mut self, event: DiagEventId, status: EventStatus);
}

/// Discards every report.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    #[inline]
    fn report(&mut self, _event: DiagEventId, _status: EventStatus) {}
}

/// One forwarded report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiagRecord {
    pub event: DiagEventId,
    pub status: EventStatus,
}

/// Bounded FIFO of reports. When full, the oldest record is dropped.
#[derive(Debug, Default)]
pub struct DiagnosticRecorder<const N: usize> {
    records: Deque<DiagRecord, N>,
    dropped: u32,
}

impl<const N: usize> DiagnosticRecorder<N> {
    pub const fn new() -> Self {
        Self {
            records: Deque::new(),
            dropped: 0,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &DiagRecord> {
        self.records.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records lost to overflow since creation.
    #[inline]
    pub const fn dropped(&self) -> u32 {
        self.dropped
    }

    pub fn contains(&self, event: DiagEventId, status: EventStatus) -> bool {
        self.records
            .iter()
            .any(|r| r.event == event && r.status == status)
    }

    /// Number of records for `event` with `status`.
    pub fn count(&self, event: DiagEventId, status: EventStatus) -> usize {
        self.records
            .iter()
            .filter(|r| r.event == event && r.status == status)
            .count()
    }

    pub fn pop(&mut self) -> Option<DiagRecord> {
        self.records.pop_front()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

impl<const N: usize> DiagnosticSink for DiagnosticRecorder<N> {
    fn report(&mut self, event: DiagEventId, status: EventStatus) {
        let record = DiagRecord { event, status };
        if let Err(record) = self.records.push_back(record) {
            self.records.pop_front();
            self.dropped = self.dropped.saturating_add(1);
            // Cannot fail: one slot was just freed.
            let _ = self.records.push_back(record);
        }
    }
}

/// Remembers the last status per event and forwards only changes.
///
/// Every event starts as `Passed`, so the first forwarded report of an event
/// is always a failure.
#[derive(Debug, Clone)]
pub struct TransitionFilter {
    last: [EventStatus; DiagEventId::COUNT],
}

impl Default for TransitionFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl TransitionFilter {
    pub const fn new() -> Self {
        Self {
            last: [EventStatus::Passed; DiagEventId::COUNT],
        }
    }

    /// Record `status` for `event`. Returns `true` if it differs from the last one.
    #[inline]
    pub fn observe(&mut self, event: DiagEventId, status: EventStatus) -> bool {
        let slot = &mut self.last[event.index()];
        let changed = *slot != status;
        *slot = status;
        changed
    }

    /// Last observed status of `event`.
    #[inline]
    pub fn status(&self, event: DiagEventId) -> EventStatus {
        self.last[event.index()]
    }
}
