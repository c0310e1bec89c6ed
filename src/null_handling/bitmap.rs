// --- IN: src/null_handling/bitmap.rs ---

//! Pure, stateless kernels that translate Arrow validity bitmaps into null maps
//! and back.
//!
//! A null map stores one byte per row: `1` for null, `0` for a value. An Arrow
//! `NullBuffer` stores one bit per row with the opposite meaning (set = valid).

use arrow::buffer::NullBuffer;

/// Expands the validity of `len` rows into a null map. `None` means every row
/// is valid.
pub fn null_map_from_nulls(nulls: Option<&NullBuffer>, len: usize) -> Vec<u8> {
    match nulls {
        Some(nulls) => nulls.iter().take(len).map(|valid| u8::from(!valid)).collect(),
        None => vec![0; len],
    }
}

/// Packs a null map into a validity bitmap. Returns `None` when no row is null,
/// matching Arrow's convention for arrays without nulls.
pub fn nulls_from_null_map(null_map: &[u8]) -> Option<NullBuffer> {
    if null_map.iter().all(|&b| b == 0) {
        return None;
    }
    let validity: Vec<bool> = null_map.iter().map(|&b| b == 0).collect();
    Some(NullBuffer::from(validity))
}
