//! This module contains the pure, stateless kernels for Zstandard compression
//! and decompression of whole stream buffers.
//!
//! Every frame is prefixed with the uncompressed length (8 bytes, little-endian)
//! so that decoding can pre-allocate and verify the result. An empty input
//! encodes to an empty frame. This module is a panic-free wrapper around the
//! `zstd` crate.

use crate::error::TambakError;

const HEADER_LEN: usize = std::mem::size_of::<u64>();

//==================================================================================
// 1. Public API
//==================================================================================

/// Compresses `input_bytes` at `level`, returning the length-prefixed frame.
pub fn encode(input_bytes: &[u8], level: i32) -> Result<Vec<u8>, TambakError> {
    if input_bytes.is_empty() {
        return Ok(Vec::new());
    }

    let mut output_buf = Vec::with_capacity(HEADER_LEN + input_bytes.len() / 2);
    output_buf.extend_from_slice(&(input_bytes.len() as u64).to_le_bytes());

    let mut encoder = zstd::stream::Encoder::new(&mut output_buf, level)
        .map_err(|e| TambakError::ZstdError(e.to_string()))?;
    std::io::Write::write_all(&mut encoder, input_bytes)
        .map_err(|e| TambakError::ZstdError(e.to_string()))?;
    // `finish` is essential to finalize the Zstd frame.
    encoder
        .finish()
        .map_err(|e| TambakError::ZstdError(e.to_string()))?;

    Ok(output_buf)
}

/// Decompresses a frame produced by [`encode`].
pub fn decode(input_bytes: &[u8]) -> Result<Vec<u8>, TambakError> {
    if input_bytes.is_empty() {
        return Ok(Vec::new());
    }

    let (header, compressed_data) = input_bytes
        .split_first_chunk::<HEADER_LEN>()
        .ok_or_else(|| {
            TambakError::ZstdError("Input stream too short to contain size header.".to_string())
        })?;
    let uncompressed_len = u64::from_le_bytes(*header) as usize;

    let mut decompressed_data = Vec::with_capacity(uncompressed_len);
    zstd::stream::copy_decode(compressed_data, &mut decompressed_data)
        .map_err(|e| TambakError::ZstdError(e.to_string()))?;

    if decompressed_data.len() != uncompressed_len {
        return Err(TambakError::ZstdError(format!(
            "Decompressed size does not match header. Expected {}, got {}.",
            uncompressed_len,
            decompressed_data.len()
        )));
    }

    Ok(decompressed_data)
}

//==================================================================================
// 2. Unit Tests
//==================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zstd_roundtrip_simple_text() {
        let original_bytes =
            b"hello world, this is a test of zstd compression. hello world, this is a test."
                .to_vec();

        let compressed_bytes = encode(&original_bytes, 3).unwrap();
        assert!(compressed_bytes.len() < original_bytes.len());

        let decompressed_bytes = decode(&compressed_bytes).unwrap();
        assert_eq!(original_bytes, decompressed_bytes);
    }

    #[test]
    fn test_zstd_roundtrip_highly_compressible_data() {
        let original_bytes = vec![42u8; 10_000];
        let compressed_bytes = encode(&original_bytes, 5).unwrap();

        // Slightly larger than the raw zstd frame because of the 8-byte header.
        assert!(compressed_bytes.len() < 50);
        assert_eq!(decode(&compressed_bytes).unwrap(), original_bytes);
    }

    #[test]
    fn test_empty_input_is_empty_frame() {
        assert!(encode(&[], 3).unwrap().is_empty());
        assert!(decode(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_zstd_decompress_invalid_data() {
        let invalid_bytes = vec![1, 2, 3, 4, 5]; // This is too short to be valid.
        let result = decode(&invalid_bytes);
        assert!(result.unwrap_err().to_string().contains("Zstd"));
    }
}
