//! Unsigned LEB128 varint codec for persisted counter values.
//!
//! Each byte carries 7 value bits, least significant group first. The high
//! bit is set on every byte except the last. A `u64` needs at most 10 bytes.

use thiserror::Error;

/// Maximum encoded length of a `u64`.
pub const MAX_VARINT_LEN_64: usize = 10;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarintError {
    #[error("varint truncated after {0} bytes")]
    Truncated(usize),

    #[error("varint exceeds 64 bits")]
    Overflow,

    #[error("{0} trailing bytes after varint")]
    TrailingBytes(usize),
}

/// Writes `value` into `buf` and returns the number of bytes used.
pub fn put_uvarint(buf: &mut [u8; MAX_VARINT_LEN_64], mut value: u64) -> usize {
    let mut i = 0;
    while value >= 0x80 {
        buf[i] = (value as u8) | 0x80;
        value >>= 7;
        i += 1;
    }
    buf[i] = value as u8;
    i + 1
}

/// Encodes `value` into a freshly allocated, minimal-length buffer.
pub fn encode_uvarint(value: u64) -> Vec<u8> {
    let mut buf = [0u8; MAX_VARINT_LEN_64];
    let len = put_uvarint(&mut buf, value);
    buf[..len].to_vec()
}

/// Decodes a varint from the front of `bytes`.
/// Returns the value and the number of bytes consumed.
pub fn decode_uvarint(bytes: &[u8]) -> Result<(u64, usize), VarintError> {
    let mut value = 0u64;
    let mut shift = 0u32;
    for (i, &b) in bytes.iter().enumerate() {
        if i == MAX_VARINT_LEN_64 {
            return Err(VarintError::Overflow);
        }
        if b < 0x80 {
            // 10th byte may only contribute the single top bit
            if i == MAX_VARINT_LEN_64 - 1 && b > 1 {
                return Err(VarintError::Overflow);
            }
            return Ok((value | (u64::from(b) << shift), i + 1));
        }
        value |= u64::from(b & 0x7f) << shift;
        shift += 7;
    }
    Err(VarintError::Truncated(bytes.len()))
}

/// Decodes `bytes` as exactly one varint, rejecting anything left over.
pub fn decode_exact(bytes: &[u8]) -> Result<u64, VarintError> {
    let (value, used) = decode_uvarint(bytes)?;
    if used != bytes.len() {
        return Err(VarintError::TrailingBytes(bytes.len() - used));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_byte_layouts() {
        assert_eq!(encode_uvarint(0), vec![0x00]);
        assert_eq!(encode_uvarint(1), vec![0x01]);
        assert_eq!(encode_uvarint(41), vec![0x29]);
        assert_eq!(encode_uvarint(127), vec![0x7f]);
        assert_eq!(encode_uvarint(128), vec![0x80, 0x01]);
        assert_eq!(encode_uvarint(300), vec![0xac, 0x02]);
        assert_eq!(encode_uvarint(16_384), vec![0x80, 0x80, 0x01]);
    }

    #[test]
    fn max_value_uses_ten_bytes() {
        let bytes = encode_uvarint(u64::MAX);
        assert_eq!(bytes.len(), MAX_VARINT_LEN_64);
        assert_eq!(bytes[9], 0x01);
        assert!(bytes[..9].iter().all(|&b| b == 0xff));
        assert_eq!(decode_exact(&bytes), Ok(u64::MAX));
    }

    #[test]
    fn encoding_is_minimal_length() {
        for (value, len) in [
            (0u64, 1usize),
            ((1 << 7) - 1, 1),
            (1 << 7, 2),
            ((1 << 14) - 1, 2),
            (1 << 14, 3),
            ((1 << 63) - 1, 9),
            (1 << 63, 10),
        ] {
            assert_eq!(encode_uvarint(value).len(), len, "value {}", value);
        }
    }

    #[test]
    fn empty_input_is_truncated() {
        assert_eq!(decode_uvarint(&[]), Err(VarintError::Truncated(0)));
    }

    #[test]
    fn dangling_continuation_bit_is_truncated() {
        assert_eq!(decode_uvarint(&[0x80]), Err(VarintError::Truncated(1)));
        assert_eq!(decode_uvarint(&[0xff, 0xff]), Err(VarintError::Truncated(2)));
    }

    #[test]
    fn eleven_bytes_overflow() {
        let bytes = [0x80u8; 11];
        assert_eq!(decode_uvarint(&bytes), Err(VarintError::Overflow));
    }

    #[test]
    fn tenth_byte_above_one_overflows() {
        let mut bytes = [0xffu8; 10];
        bytes[9] = 0x02;
        assert_eq!(decode_uvarint(&bytes), Err(VarintError::Overflow));
    }

    #[test]
    fn decode_reports_consumed_length() {
        assert_eq!(decode_uvarint(&[0xac, 0x02, 0xff]), Ok((300, 2)));
    }

    #[test]
    fn decode_exact_rejects_trailing_bytes() {
        assert_eq!(
            decode_exact(&[0x01, 0x00]),
            Err(VarintError::TrailingBytes(1))
        );
    }
}
