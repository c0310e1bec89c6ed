//! This module contains the pure, stateless kernels for LEB128 (Little-Endian
//! Base 128) variable-length integer encoding and decoding.
//!
//! The substream engine uses it for the length prefix of every string value, so
//! decoding works directly over a `Read` and distinguishes a clean end of stream
//! (no byte at all) from a value that was cut in half. It is fully panic-free.

use num_traits::{PrimInt, Unsigned};
use std::io::{ErrorKind, Read};

use crate::error::TambakError;

//==================================================================================
// 1. Public API for Single-Value Operations
//==================================================================================

/// Encodes a single unsigned integer into a LEB128 byte sequence, appending to a buffer.
pub fn encode_one<T>(value: T, buffer: &mut Vec<u8>) -> Result<(), TambakError>
where
    T: PrimInt + Unsigned,
{
    let zero = T::zero();
    let seven_bit_mask = T::from(0x7F).ok_or_else(|| {
        TambakError::Leb128DecodeError("Failed to create 7-bit mask for type".to_string())
    })?;

    let mut current_value = value;
    loop {
        let payload = (current_value & seven_bit_mask).to_u8().ok_or_else(|| {
            TambakError::Leb128DecodeError("Failed to convert generic integer to u8".to_string())
        })?;
        current_value = current_value >> 7;

        if current_value == zero {
            buffer.push(payload);
            return Ok(());
        }
        buffer.push(payload | 0x80);
    }
}

/// Decodes a single unsigned integer from a reader.
///
/// Returns `Ok(None)` when the reader is exhausted before the first byte, and an
/// error when it ends between the bytes of one value.
pub fn decode_one<T, R>(reader: &mut R) -> Result<Option<T>, TambakError>
where
    T: PrimInt + Unsigned,
    R: Read + ?Sized,
{
    let mut result = T::zero();
    let mut shift = 0;
    let total_bits = std::mem::size_of::<T>() * 8;
    let mut first = true;

    loop {
        let byte = match read_byte(reader)? {
            Some(byte) => byte,
            None if first => return Ok(None),
            None => {
                return Err(TambakError::Leb128DecodeError(
                    "Unexpected end of stream".to_string(),
                ))
            }
        };
        first = false;

        if shift >= total_bits {
            return Err(TambakError::Leb128DecodeError(
                "Integer overflow during decoding".to_string(),
            ));
        }
        let seven_bit_payload = T::from(byte & 0x7F).ok_or_else(|| {
            TambakError::Leb128DecodeError("Failed to create 7-bit payload from byte".to_string())
        })?;
        result = result | (seven_bit_payload << shift);

        if byte & 0x80 == 0 {
            // The last byte must not carry bits beyond the width of `T`.
            if shift + 7 > total_bits && (byte >> (total_bits - shift)) > 0 {
                return Err(TambakError::Leb128DecodeError(
                    "Integer overflow during decoding".to_string(),
                ));
            }
            return Ok(Some(result));
        }

        shift += 7;
    }
}

fn read_byte<R: Read + ?Sized>(reader: &mut R) -> Result<Option<u8>, TambakError> {
    let mut byte = [0u8; 1];
    loop {
        match reader.read(&mut byte) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(byte[0])),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
}

//==================================================================================
// 2. Public API for Slice Operations
//==================================================================================

/// Encodes an entire slice, replacing the contents of `output_buf`.
pub fn encode<T>(input_slice: &[T], output_buf: &mut Vec<u8>) -> Result<(), TambakError>
where
    T: PrimInt + Unsigned,
{
    output_buf.clear();
    for &val in input_slice {
        encode_one(val, output_buf)?;
    }
    Ok(())
}

/// Decodes exactly `num_values` integers and rejects trailing bytes.
pub fn decode<T>(input_bytes: &[u8], num_values: usize) -> Result<Vec<T>, TambakError>
where
    T: PrimInt + Unsigned,
{
    let mut reader = input_bytes;
    let mut values = Vec::with_capacity(num_values);
    for _ in 0..num_values {
        let value = decode_one::<T, _>(&mut reader)?.ok_or_else(|| {
            TambakError::Leb128DecodeError("Unexpected end of stream".to_string())
        })?;
        values.push(value);
    }

    if !reader.is_empty() {
        return Err(TambakError::Leb128DecodeError(
            "Did not consume entire input buffer. Trailing bytes detected.".to_string(),
        ));
    }
    Ok(values)
}

//==================================================================================
// 3. Unit Tests
//==================================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leb128_roundtrip_u64() {
        let original: Vec<u64> = vec![0, 127, 128, 1000, 624485, u64::MAX];
        let mut encoded_bytes = Vec::new();
        encode(&original, &mut encoded_bytes).unwrap();
        assert_eq!(decode::<u64>(&encoded_bytes, original.len()).unwrap(), original);
    }

    #[test]
    fn test_known_encoding() {
        let mut buf = Vec::new();
        encode_one(624485u64, &mut buf).unwrap();
        assert_eq!(buf, vec![0xE5, 0x8E, 0x26]);
    }

    #[test]
    fn test_decode_one_distinguishes_clean_eof_from_truncation() {
        let mut empty: &[u8] = &[];
        assert!(decode_one::<u64, _>(&mut empty).unwrap().is_none());

        let mut truncated: &[u8] = &[0xE5, 0x8E];
        let err = decode_one::<u64, _>(&mut truncated).unwrap_err();
        assert!(err.to_string().contains("Unexpected end of stream"));
    }

    #[test]
    fn test_decode_overflow_error() {
        // This represents a value larger than u64::MAX
        let encoded_bytes = vec![0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x7F];
        let result = decode::<u64>(&encoded_bytes, 1);
        if let Err(TambakError::Leb128DecodeError(msg)) = result {
            assert!(msg.contains("overflow"));
        } else {
            panic!("Expected Leb128DecodeError for an overflowing value");
        }
    }

    #[test]
    fn test_decode_rejects_trailing_bytes() {
        assert!(decode::<u32>(&[0x01, 0x02], 1).is_err());
    }
}
