// In: src/bridge/mod.rs

// ====================================================================================
// ARCHITECTURAL OVERVIEW: The Bridge Layer
// ====================================================================================
//
// The `bridge` connects Arrow arrays to the Arrow-agnostic substream engine. The
// engine only knows `Column`s, `DataType`s and stream getters; everything that
// touches `arrow` lives here.
//
// Data Flow (Serialization):
//
//   1. [Stateless API (serialize_arrow_column)] -> Receives `&dyn Array`
//         |
//         `-> a. Calls `arrow_impl` to convert `&dyn Array` -> `Column`
//         |
//         `-> b. Writes the column granule by granule into a `MemoryStreamStore`
//         |
//         `-> c. Compresses each named stream with its planned codec
//
//   2. Returns `ColumnStreams` (named, compressed streams plus their manifest)
//
//
// Data Flow (Deserialization):
//
//   1. [Stateless API (deserialize_arrow_column)] -> Receives `&ColumnStreams`
//         |
//         `-> a. Decompresses every stream back into a `MemoryStreamStore`
//         |
//         `-> b. Reads the column granule by granule
//         |
//         `-> c. Calls `arrow_impl` to convert `Column` -> `ArrayRef`
//
// ====================================================================================
pub(crate) mod arrow_impl;
pub mod stateless_api;

pub use stateless_api::{arrow_column_type, deserialize_arrow_column, serialize_arrow_column};
