//! This module contains the pure, stateless kernel for byte-shuffling streams
//! of fixed-width values.
//!
//! Shuffling reorganizes a row-oriented byte stream into a "byte-plane" layout:
//! all first bytes, then all second bytes, and so on. Streams of numbers whose
//! high bytes rarely change compress much better afterwards. The element width
//! is a runtime parameter because the width comes from the stream's leaf type.

use crate::error::TambakError;

//==================================================================================
// 1. Core Logic
//==================================================================================

fn shuffle_slice(input_bytes: &[u8], width: usize, output_buf: &mut Vec<u8>) {
    let num_elements = input_bytes.len() / width;
    output_buf.clear();
    output_buf.resize(input_bytes.len(), 0);

    for (j, element) in input_bytes.chunks_exact(width).enumerate() {
        for (i, &byte) in element.iter().enumerate() {
            output_buf[i * num_elements + j] = byte;
        }
    }
}

fn unshuffle_slice(input_bytes: &[u8], width: usize, output_buf: &mut Vec<u8>) {
    let num_elements = input_bytes.len() / width;
    output_buf.clear();
    output_buf.resize(input_bytes.len(), 0);

    for i in 0..width {
        let plane = &input_bytes[i * num_elements..(i + 1) * num_elements];
        for (j, &byte) in plane.iter().enumerate() {
            output_buf[j * width + i] = byte;
        }
    }
}

//==================================================================================
// 2. Public API
//==================================================================================

/// Shuffles `input_bytes`, a whole number of `width`-byte elements.
pub fn encode(input_bytes: &[u8], width: usize, output_buf: &mut Vec<u8>) -> Result<(), TambakError> {
    if width == 0 || input_bytes.len() % width != 0 {
        return Err(TambakError::BufferMismatch(width, input_bytes.len()));
    }
    if width == 1 {
        output_buf.clear();
        output_buf.extend_from_slice(input_bytes);
        return Ok(());
    }
    shuffle_slice(input_bytes, width, output_buf);
    Ok(())
}

/// Reverses [`encode`].
pub fn decode(input_bytes: &[u8], width: usize, output_buf: &mut Vec<u8>) -> Result<(), TambakError> {
    if width == 0 || input_bytes.len() % width != 0 {
        return Err(TambakError::BufferMismatch(width, input_bytes.len()));
    }
    if width == 1 {
        output_buf.clear();
        output_buf.extend_from_slice(input_bytes);
        return Ok(());
    }
    unshuffle_slice(input_bytes, width, output_buf);
    Ok(())
}

//==================================================================================
// 3. Unit Tests
//==================================================================================
