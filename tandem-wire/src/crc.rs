//! CRC-16 engine for frame integrity checks.
//!
//! CCITT variant: polynomial 0x1021, initial value 0, no reflection
//! (CRC-16/XMODEM). The value crosses the wire and is recomputed by a peer
//! built independently, so the parameters are protocol constants — a
//! table-driven replacement is fine only if it is bit-identical.

/// CRC polynomial (x^16 + x^12 + x^5 + 1)
pub const CRC_POLY: u16 = 0x1021;

/// Compute the CRC-16 over a byte slice.
///
/// Senders compute this over every frame byte before the CRC field and write
/// the result into the field; receivers recompute over the same range and
/// compare.
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ CRC_POLY;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}
