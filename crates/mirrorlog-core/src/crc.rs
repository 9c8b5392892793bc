//! IEEE 802.3 CRC-32 (poly 0xEDB88320, init/final XOR 0xFFFFFFFF), computed
//! byte-at-a-time so host tooling and firmware agree bit-for-bit. Ported
//! directly from `crc32_u8bit` in the original firmware rather than pulled
//! from a crate: the exact bit-serial shape is the cross-platform contract,
//! not an interchangeable implementation detail.

const POLY: u32 = 0xEDB8_8320;

/// Computes the CRC-32 of `data`.
///
/// `crc32(&[]) == 0x0000_0000` and `crc32(b"123456789") == 0xCBF4_3926`
/// (the standard Ethernet/zlib check vector).
pub fn crc32(data: &[u8]) -> u32 {
    let mut crc: u32 = 0xFFFF_FFFF;
    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ POLY;
            } else {
                crc >>= 1;
            }
        }
    }
    crc ^ 0xFFFF_FFFF
}
