//! End-to-end message protection.
//!
//! Every 8-byte bus frame carries a CRC-8 in byte 0 and a 4-bit alive counter
//! in the low nibble of byte 1. The CRC is seeded with a per-message data ID,
//! so a frame routed to the wrong slot also fails.

pub mod codec;
pub mod crc;
