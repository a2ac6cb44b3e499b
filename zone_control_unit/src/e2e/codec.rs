//! Per-slot protect / check with consecutive-failure tracking.
//!
//! Frame layout:
//!
//! | byte | content |
//! |------|---------|
//! | 0    | CRC-8 over bytes 1.. |
//! | 1    | bits 0..3 alive counter, bits 4..7 left to the payload |
//! | 2..  | payload |
//!
//! The codec never substitutes data. Callers read
//! [`MessageIntegrityCodec::limit_reached`] and apply their own safe default.

use thiserror::Error;

use super::crc::crc8;

pub const CRC_BYTE: usize = 0;
pub const ALIVE_BYTE: usize = 1;
pub const ALIVE_MASK: u8 = 0x0F;
/// CRC byte + alive byte.
pub const MIN_FRAME_LEN: usize = 2;

/// Reason a frame was rejected or could not be stamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum E2eError {
    #[error("CRC mismatch: computed {computed:#04x}, received {received:#04x}")]
    CrcMismatch { computed: u8, received: u8 },

    #[error("alive counter mismatch: expected {expected}, received {received}")]
    SequenceMismatch { expected: u8, received: u8 },

    #[error("unknown message slot {0}")]
    InvalidSlot(u8),

    #[error("frame too short: {0} bytes")]
    BufferTooShort(usize),
}

/// State of one message slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlotState {
    data_id: u8,
    tx_counter: u8,
    last_rx_counter: u8,
    consecutive_failures: u8,
}

impl SlotState {
    /// Transmit starts at counter 0; receive expects 0 first.
    pub const fn new(data_id: u8) -> Self {
        Self {
            data_id,
            tx_counter: 0,
            last_rx_counter: ALIVE_MASK,
            consecutive_failures: 0,
        }
    }

    #[inline]
    pub const fn data_id(&self) -> u8 {
        self.data_id
    }

    #[inline]
    pub const fn tx_counter(&self) -> u8 {
        self.tx_counter
    }

    #[inline]
    pub const fn last_rx_counter(&self) -> u8 {
        self.last_rx_counter
    }

    #[inline]
    pub const fn consecutive_failures(&self) -> u8 {
        self.consecutive_failures
    }

    fn record_failure(&mut self) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
    }
}

/// CRC + alive-counter codec for a fixed set of message slots.
///
/// A slot can be used for transmit, receive, or both; the two directions keep
/// separate counters.
#[derive(Debug, Clone)]
pub struct MessageIntegrityCodec<const SLOTS: usize> {
    slots: [SlotState; SLOTS],
}

impl<const SLOTS: usize> MessageIntegrityCodec<SLOTS> {
    /// One slot per data ID, all counters at zero.
    pub fn new(data_ids: [u8; SLOTS]) -> Self {
        Self {
            slots: data_ids.map(SlotState::new),
        }
    }

    /// Stamp the alive counter and CRC into `frame`, then advance the counter.
    pub fn protect(&mut self, slot: u8, frame: &mut [u8]) -> Result<(), E2eError> {
        if frame.len() < MIN_FRAME_LEN {
            return Err(E2eError::BufferTooShort(frame.len()));
        }
        let state = self.slot_mut(slot)?;

        frame[ALIVE_BYTE] = (frame[ALIVE_BYTE] & !ALIVE_MASK) | state.tx_counter;
        frame[CRC_BYTE] = crc8(state.data_id, &frame[ALIVE_BYTE..]);
        state.tx_counter = (state.tx_counter + 1) & ALIVE_MASK;
        Ok(())
    }

    /// Verify a received frame.
    ///
    /// A sequence mismatch resynchronizes to the received counter so a single
    /// lost frame costs exactly one failure.
    pub fn check(&mut self, slot: u8, frame: &[u8]) -> Result<(), E2eError> {
        let state = self.slot_mut(slot)?;
        if frame.len() < MIN_FRAME_LEN {
            state.record_failure();
            return Err(E2eError::BufferTooShort(frame.len()));
        }

        let computed = crc8(state.data_id, &frame[ALIVE_BYTE..]);
        let received_crc = frame[CRC_BYTE];
        if computed != received_crc {
            state.record_failure();
            return Err(E2eError::CrcMismatch {
                computed,
                received: received_crc,
            });
        }

        let received = frame[ALIVE_BYTE] & ALIVE_MASK;
        let expected = (state.last_rx_counter + 1) & ALIVE_MASK;
        if received != expected {
            state.record_failure();
            state.last_rx_counter = received;
            return Err(E2eError::SequenceMismatch { expected, received });
        }

        state.last_rx_counter = received;
        state.consecutive_failures = 0;
        Ok(())
    }

    /// Consecutive receive failures on `slot`.
    pub fn consecutive_failures(&self, slot: u8) -> Option<u8> {
        self.slot(slot).map(SlotState::consecutive_failures)
    }

    /// `true` when `slot` has failed at least `limit` times in a row, or does not exist.
    pub fn limit_reached(&self, slot: u8, limit: u8) -> bool {
        self.consecutive_failures(slot).is_none_or(|f| f >= limit)
    }

    /// Set the receive side as if `counter` had just been accepted.
    pub fn synchronize(&mut self, slot: u8, counter: u8) -> Result<(), E2eError> {
        let state = self.slot_mut(slot)?;
        state.last_rx_counter = counter & ALIVE_MASK;
        Ok(())
    }

    pub fn slot(&self, slot: u8) -> Option<&SlotState> {
        self.slots.get(slot as usize)
    }

    fn slot_mut(&mut self, slot: u8) -> Result<&mut SlotState, E2eError> {
        self.slots
            .get_mut(slot as usize)
            .ok_or(E2eError::InvalidSlot(slot))
    }
}
