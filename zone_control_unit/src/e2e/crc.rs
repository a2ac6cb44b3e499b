//! CRC-8, polynomial 0x1D, MSB first, no reflection, no final XOR.
//!
//! With init 0xFF and final XOR 0xFF this is CRC-8/SAE-J1850; the codec uses
//! the message data ID as the init value instead.

pub const CRC8_POLY: u8 = 0x1D;

static CRC8_TABLE: [u8; 256] = build_table();

const fn build_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u8;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ CRC8_POLY
            } else {
                crc << 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// CRC over `data` starting from `init`.
#[inline]
pub fn crc8(init: u8, data: &[u8]) -> u8 {
    data.iter()
        .fold(init, |crc, &byte| CRC8_TABLE[(crc ^ byte) as usize])
}
