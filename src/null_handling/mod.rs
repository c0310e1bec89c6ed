//! This module serves as the public API for the null-handling kernels of the
//! substream engine.
//!
//! Nullable columns keep their validity as a separate `UInt8` null map
//! (1 = null), which is its own physical stream. Arrow keeps validity as a
//! bitmap next to the values. The kernels here translate between the two.

//==================================================================================
// 1. Module Declarations
//==================================================================================

/// Conversions between Arrow `NullBuffer`s and null maps.
pub mod bitmap;

//==================================================================================
// 2. Public API Re-exports
//==================================================================================

pub use bitmap::{null_map_from_nulls, nulls_from_null_map};

//==================================================================================
// 3. Unit Tests (Module-level integration tests)
//==================================================================================
