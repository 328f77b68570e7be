//! Fixed-width big-endian integer encoding.
//!
//! `decode` reads at most `width` leading bytes; shorter input yields the
//! value of the bytes that are present.

use serde::{Deserialize, Serialize};

/// Supported integer widths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ByteWidth {
    Two,
    Four,
    Eight,
}

impl ByteWidth {
    pub fn bytes(self) -> usize {
        match self {
            ByteWidth::Two => 2,
            ByteWidth::Four => 4,
            ByteWidth::Eight => 8,
        }
    }
}

/// Low `width` bytes of `value`, most significant first.
pub fn encode(value: u64, width: ByteWidth) -> Vec<u8> {
    let n = width.bytes();
    value.to_be_bytes()[8 - n..].to_vec()
}

/// Big-endian value of the first `min(bytes.len(), width)` bytes.
pub fn decode(bytes: &[u8], width: ByteWidth) -> u64 {
    bytes
        .iter()
        .take(width.bytes())
        .fold(0u64, |acc, &b| (acc << 8) | u64::from(b))
}

pub fn u16_to_bytes(value: u16) -> [u8; 2] {
    value.to_be_bytes()
}

pub fn bytes_to_u16(bytes: &[u8]) -> u16 {
    decode(bytes, ByteWidth::Two) as u16
}

pub fn u32_to_bytes(value: u32) -> [u8; 4] {
    value.to_be_bytes()
}

pub fn bytes_to_u32(bytes: &[u8]) -> u32 {
    decode(bytes, ByteWidth::Four) as u32
}

pub fn u64_to_bytes(value: u64) -> [u8; 8] {
    value.to_be_bytes()
}

pub fn bytes_to_u64(bytes: &[u8]) -> u64 {
    decode(bytes, ByteWidth::Eight)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_is_big_endian() {
        assert_eq!(encode(0x1234, ByteWidth::Two), vec![0x12, 0x34]);
        assert_eq!(encode(0x0102_0304, ByteWidth::Four), vec![1, 2, 3, 4]);
        assert_eq!(
            encode(0x0102_0304_0506_0708, ByteWidth::Eight),
            vec![1, 2, 3, 4, 5, 6, 7, 8]
        );
    }

    #[test]
    fn test_encode_truncates_high_bytes() {
        assert_eq!(encode(0xAABB_CCDD, ByteWidth::Two), vec![0xCC, 0xDD]);
    }

    #[test]
    fn test_decode_recovers_encoded_value() {
        assert_eq!(decode(&encode(0x1234, ByteWidth::Two), ByteWidth::Two), 0x1234);
    }

    #[test]
    fn test_decode_short_and_long_input() {
        // fewer bytes than the width: only the available bytes count
        assert_eq!(decode(&[0x12], ByteWidth::Four), 0x12);
        // more bytes than the width: the tail is ignored
        assert_eq!(decode(&[0x12, 0x34, 0x56], ByteWidth::Two), 0x1234);
        assert_eq!(decode(&[], ByteWidth::Eight), 0);
    }

    #[test]
    fn test_typed_helpers() {
        assert_eq!(bytes_to_u16(&u16_to_bytes(0xBEEF)), 0xBEEF);
        assert_eq!(bytes_to_u32(&u32_to_bytes(0xDEAD_BEEF)), 0xDEAD_BEEF);
        assert_eq!(bytes_to_u64(&u64_to_bytes(u64::MAX - 1)), u64::MAX - 1);
        assert_eq!(u16_to_bytes(0x1234).to_vec(), encode(0x1234, ByteWidth::Two));
    }
}
