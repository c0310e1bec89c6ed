//! Pure, stateless byte kernels used by the leaf codecs and the stream codecs.
//!
//! Kernels know nothing about columns or paths: they only transform byte
//! buffers (or slices of primitives) and report malformed input as
//! `TambakError`.

pub mod leb128;
pub mod shuffle;
pub mod zstd;
